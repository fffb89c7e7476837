//! Video API content provider
//!
//! Implementation of [`ContentProvider`] for the companion video API:
//! `GET /api/videos` for an unfiltered random pick,
//! `GET /api/videos/theme/{theme}` for a themed one. A 404 maps to
//! `ContentNotFound`; everything else is a generic provider error.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use vjdeck::content::{ContentItem, ContentProvider};
use vjdeck::error::{DeckError, Result};

const USER_AGENT: &str = concat!("vjdeck/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDto {
    youtube_id: String,
    #[serde(default)]
    video_duration: Option<f32>,
}

impl From<VideoDto> for ContentItem {
    fn from(dto: VideoDto) -> Self {
        ContentItem {
            id: dto.youtube_id,
            duration_secs: dto.video_duration,
        }
    }
}

/// Blocking HTTP provider against the video API
pub struct VideoApiProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl VideoApiProvider {
    pub fn new(base_url: &str) -> crate::error::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, theme: Option<&str>) -> String {
        match theme {
            Some(theme) => format!("{}/api/videos/theme/{theme}", self.base_url),
            None => format!("{}/api/videos", self.base_url),
        }
    }
}

impl ContentProvider for VideoApiProvider {
    fn request(&self, theme: Option<&str>) -> Result<ContentItem> {
        let url = self.endpoint(theme);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DeckError::Provider(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DeckError::ContentNotFound {
                theme: theme.map(str::to_string),
            });
        }
        if !response.status().is_success() {
            return Err(DeckError::Provider(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let dto: VideoDto = response
            .json()
            .map_err(|e| DeckError::Provider(format!("invalid response from {url}: {e}")))?;
        Ok(dto.into())
    }
}
