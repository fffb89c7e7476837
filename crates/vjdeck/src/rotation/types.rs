//! Shared rotation types
//!
//! Slot identities, per-slot lifecycle state, the scheduler's rotation
//! state, and the traits the scheduler drives on the outside world.

use std::collections::BTreeSet;
use std::fmt;

use crate::audio::BeatEvent;
use crate::content::ContentItem;
use crate::error::{DeckError, Result};

/// One of the three playback slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotId {
    One,
    Two,
    Three,
}

impl SlotId {
    pub const ALL: [SlotId; 3] = [SlotId::One, SlotId::Two, SlotId::Three];

    /// Next slot in the fixed cyclic order 1 → 2 → 3 → 1
    pub fn next(self) -> SlotId {
        match self {
            SlotId::One => SlotId::Two,
            SlotId::Two => SlotId::Three,
            SlotId::Three => SlotId::One,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SlotId::One => 0,
            SlotId::Two => 1,
            SlotId::Three => 2,
        }
    }
}

impl TryFrom<u8> for SlotId {
    type Error = DeckError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(SlotId::One),
            2 => Ok(SlotId::Two),
            3 => Ok(SlotId::Three),
            other => Err(DeckError::InvalidSlot(other)),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index() + 1)
    }
}

/// Lifecycle state of a playback slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Idle,
    Loading,
    Ready,
    Displayed,
}

/// One playback slot and the content it currently holds
#[derive(Debug, Clone, Default)]
pub struct PlaybackSlot {
    pub state: SlotState,
    /// Item most recently loaded into this slot (borrowed identity;
    /// the provider owns the catalogue)
    pub content: Option<ContentItem>,
    /// Theme the current content was requested under
    pub theme: Option<String>,
}

/// Scheduler-owned rotation state
///
/// `ready` is the single source of truth for switch eligibility: a slot
/// may only become displayed while it is a member.
#[derive(Debug, Clone)]
pub struct RotationState {
    pub displayed: Option<SlotId>,
    pub loading: SlotId,
    pub ready: BTreeSet<SlotId>,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            displayed: None,
            loading: SlotId::Three,
            ready: BTreeSet::new(),
        }
    }
}

/// Events delivered to the scheduler's single-threaded queue
pub enum DeckEvent {
    /// A player handle finished constructing (external `onReady`)
    PlayerReady(SlotId),
    /// Raw player state change; `code == STATE_PLAYING` marks the slot's
    /// content as actively playing (load completion)
    PlayerStateChange { slot: SlotId, code: i32 },
    /// A content request issued for `slot` completed
    ContentResolved {
        slot: SlotId,
        result: Result<ContentItem>,
    },
    /// Immediate switch trigger from the beat detector
    Beat(BeatEvent),
    /// Shut down the scheduler thread
    Shutdown,
}

impl fmt::Debug for DeckEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckEvent::PlayerReady(slot) => write!(f, "PlayerReady({slot})"),
            DeckEvent::PlayerStateChange { slot, code } => {
                write!(f, "PlayerStateChange(slot {slot}, code {code})")
            }
            DeckEvent::ContentResolved { slot, result } => match result {
                Ok(item) => write!(f, "ContentResolved(slot {slot}, {})", item.id),
                Err(e) => write!(f, "ContentResolved(slot {slot}, error: {e})"),
            },
            DeckEvent::Beat(beat) => write!(f, "Beat({beat})"),
            DeckEvent::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Commands the scheduler issues to the external player
pub trait PlayerControl: Send + Sync {
    /// Load content into a slot, seeking to `start_secs`
    fn load(&self, slot: SlotId, content_id: &str, start_secs: f32) -> Result<()>;

    /// Set the playback rate for a slot
    fn set_playback_rate(&self, slot: SlotId, rate: f32) -> Result<()>;
}

/// Opaque visibility toggle; exactly one slot is visible at a time once
/// rotation is running. How visibility renders is not this crate's concern.
pub trait VisibilitySink: Send + Sync {
    fn set_visible(&self, slot: SlotId, visible: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- SlotId ---

    #[test]
    fn cyclic_order_wraps_around() {
        assert_eq!(SlotId::One.next(), SlotId::Two);
        assert_eq!(SlotId::Two.next(), SlotId::Three);
        assert_eq!(SlotId::Three.next(), SlotId::One);
    }

    #[test]
    fn valid_ids_convert() {
        assert_eq!(SlotId::try_from(1).unwrap(), SlotId::One);
        assert_eq!(SlotId::try_from(2).unwrap(), SlotId::Two);
        assert_eq!(SlotId::try_from(3).unwrap(), SlotId::Three);
    }

    #[test]
    fn out_of_range_ids_are_fatal() {
        for bad in [0u8, 4, 255] {
            match SlotId::try_from(bad) {
                Err(DeckError::InvalidSlot(id)) => assert_eq!(id, bad),
                other => panic!("expected InvalidSlot, got {other:?}"),
            }
        }
    }

    #[test]
    fn display_uses_one_based_numbering() {
        assert_eq!(SlotId::One.to_string(), "1");
        assert_eq!(SlotId::Three.to_string(), "3");
    }

    #[test]
    fn ordering_is_ascending_by_id() {
        let mut set = BTreeSet::new();
        set.insert(SlotId::Three);
        set.insert(SlotId::One);
        set.insert(SlotId::Two);
        let in_order: Vec<_> = set.into_iter().collect();
        assert_eq!(in_order, vec![SlotId::One, SlotId::Two, SlotId::Three]);
    }

    // --- SlotState / PlaybackSlot ---

    #[test]
    fn slots_start_idle_and_empty() {
        let slot = PlaybackSlot::default();
        assert_eq!(slot.state, SlotState::Idle);
        assert!(slot.content.is_none());
        assert!(slot.theme.is_none());
    }

    // --- RotationState ---

    #[test]
    fn rotation_state_starts_with_nothing_displayed() {
        let state = RotationState::default();
        assert!(state.displayed.is_none());
        assert!(state.ready.is_empty());
    }

    // --- DeckEvent ---

    #[test]
    fn deck_event_debug_formats() {
        let ev = DeckEvent::PlayerStateChange {
            slot: SlotId::Two,
            code: 1,
        };
        assert_eq!(format!("{ev:?}"), "PlayerStateChange(slot 2, code 1)");

        let ev = DeckEvent::ContentResolved {
            slot: SlotId::One,
            result: Ok(ContentItem {
                id: "abc123".to_string(),
                duration_secs: None,
            }),
        };
        assert_eq!(format!("{ev:?}"), "ContentResolved(slot 1, abc123)");

        assert_eq!(format!("{:?}", DeckEvent::Shutdown), "Shutdown");
    }
}
