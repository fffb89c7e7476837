//! Vjdeck CLI — headless beat-driven slot rotation
//!
//! Runs the deck against either the real video API or a fully synthetic
//! set of collaborators, logging switches instead of rendering them.

mod api;
mod error;
mod sim;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vjdeck::config::DeckConfig;
use vjdeck::content::ContentProvider;
use vjdeck::deck::{DeckParts, VjDeck};
use vjdeck::rotation::{DeckEvent, SlotId};

use api::VideoApiProvider;
use sim::{CannedProvider, PulseCapture, SimPlayer, SimVisibility};

#[derive(Parser)]
#[command(name = "vjdeck", about = "Beat-driven video slot rotation", version)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the video API; without it a canned catalogue is used
    #[arg(long)]
    api: Option<String>,

    /// Tempo of the synthetic audio source
    #[arg(long, default_value_t = 120)]
    bpm: u32,

    /// How long to run before shutting down (seconds)
    #[arg(long, default_value_t = 30)]
    duration: u64,
}

fn main() -> error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DeckConfig::load(path)?,
        None => DeckConfig::default(),
    };

    let provider: Arc<dyn ContentProvider> = match &cli.api {
        Some(base_url) => {
            info!("using video API at {base_url}");
            Arc::new(VideoApiProvider::new(base_url)?)
        }
        None => {
            info!("using canned content catalogue");
            Arc::new(CannedProvider::new())
        }
    };

    // The simulated player reports state changes through its own
    // channel; a relay forwards them into the deck once it exists.
    let (player_tx, player_rx) = crossbeam_channel::unbounded();
    let player = SimPlayer::new(player_tx);

    let deck = VjDeck::start(
        config,
        DeckParts {
            capture: Box::new(PulseCapture::new(cli.bpm)),
            provider,
            player,
            visibility: Arc::new(SimVisibility),
            on_beat_switch: Some(Box::new(|slot| {
                info!("beat switch landed on slot {slot}");
            })),
        },
    )?;

    let events = deck.events();
    thread::spawn(move || {
        for event in player_rx {
            if events.send(event).is_err() {
                break;
            }
        }
    });

    // Simulate the three player handles finishing construction
    let events = deck.events();
    for slot in SlotId::ALL {
        let _ = events.send(DeckEvent::PlayerReady(slot));
    }

    info!("running for {}s at {} BPM", cli.duration, cli.bpm);
    thread::sleep(Duration::from_secs(cli.duration));
    deck.stop();
    Ok(())
}
