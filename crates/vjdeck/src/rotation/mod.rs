//! Slot rotation subsystem: three playback slots, one displayed

pub mod scheduler;
pub mod types;

pub use scheduler::{BeatSwitchCallback, RotationScheduler};
pub use types::{
    DeckEvent, PlaybackSlot, PlayerControl, RotationState, SlotId, SlotState, VisibilitySink,
};
