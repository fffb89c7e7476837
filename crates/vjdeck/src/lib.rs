//! Vjdeck — beat-driven video slot rotation engine
//!
//! Three playback slots rotate on a timer and switch instantly on
//! detected audio beats, with content prefetched into the non-displayed
//! slots so a switch never reveals an unloaded player.
//!
//! ## Quick start
//!
//! ```no_run
//! use vjdeck::config::DeckConfig;
//! use vjdeck::deck::{DeckParts, VjDeck};
//! ```
//!
//! The host supplies the external collaborators: a
//! [`CaptureSource`](audio::CaptureSource) for the microphone, a
//! [`ContentProvider`](content::ContentProvider) for playable items, and
//! [`PlayerControl`](rotation::PlayerControl) /
//! [`VisibilitySink`](rotation::VisibilitySink) for the player surface.

pub mod audio;
pub mod config;
pub mod content;
pub mod deck;
pub mod error;
pub mod rotation;

pub use config::DeckConfig;
pub use deck::{DeckParts, VjDeck};
pub use error::{DeckError, Result};
