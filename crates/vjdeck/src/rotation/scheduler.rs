//! Slot rotation scheduler
//!
//! Owns the three playback slots and the rotation state, processing
//! [`DeckEvent`]s strictly one at a time on its own thread. Content
//! requests run on short-lived worker threads and come back as
//! `ContentResolved` events, so every state mutation happens inside a
//! single handler with nothing interleaving mid-way.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rand::Rng;
use tracing::{debug, error, info, trace, warn};

use crate::config::player::{
    FALLBACK_START_MAX_SECS, FALLBACK_START_MIN_SECS, START_OFFSET_MARGIN_SECS, STATE_PLAYING,
};
use crate::config::DeckConfig;
use crate::content::{pick_theme, ContentItem, ContentProvider};

use super::types::{
    DeckEvent, PlaybackSlot, PlayerControl, RotationState, SlotId, SlotState, VisibilitySink,
};

/// Poll granularity of the scheduler loop when no timer is closer
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Notification fired after a beat-triggered switch lands
pub type BeatSwitchCallback = Box<dyn FnMut(SlotId) + Send>;

/// Rotation state machine over three playback slots
pub struct RotationScheduler {
    config: DeckConfig,
    slots: [PlaybackSlot; 3],
    state: RotationState,
    provider: Arc<dyn ContentProvider>,
    player: Arc<dyn PlayerControl>,
    visibility: Arc<dyn VisibilitySink>,
    /// Loops results from content workers back into the event queue
    event_tx: Sender<DeckEvent>,
    /// Player handles that finished constructing
    constructed: std::collections::BTreeSet<SlotId>,
    /// Warm-up requests for slots 1 and 2 have been issued
    warmup_started: bool,
    /// Slot 1 is displayed and the rotation timer is running
    initialized: bool,
    /// Deferred natural switches (ready signal + grace period)
    pending_switches: Vec<Instant>,
    next_rotation: Option<Instant>,
    /// Content requests not yet handed to a worker
    pending_requests: Vec<(SlotId, Option<String>)>,
    on_beat_switch: Option<BeatSwitchCallback>,
}

impl RotationScheduler {
    pub fn new(
        config: DeckConfig,
        provider: Arc<dyn ContentProvider>,
        player: Arc<dyn PlayerControl>,
        visibility: Arc<dyn VisibilitySink>,
        event_tx: Sender<DeckEvent>,
        on_beat_switch: Option<BeatSwitchCallback>,
    ) -> Self {
        Self {
            config,
            slots: Default::default(),
            state: RotationState::default(),
            provider,
            player,
            visibility,
            event_tx,
            constructed: Default::default(),
            warmup_started: false,
            initialized: false,
            pending_switches: Vec::new(),
            next_rotation: None,
            pending_requests: Vec::new(),
            on_beat_switch,
        }
    }

    /// Run the scheduler loop (blocking, call from a dedicated thread)
    pub fn run(&mut self, event_rx: &Receiver<DeckEvent>) {
        loop {
            self.dispatch_requests();
            let now = Instant::now();
            self.fire_due(now);

            let timeout = self
                .next_deadline()
                .map(|at| at.saturating_duration_since(now))
                .unwrap_or(POLL_INTERVAL)
                .min(POLL_INTERVAL);

            match event_rx.recv_timeout(timeout) {
                Ok(event) => {
                    if self.handle_event(event, Instant::now()) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("rotation scheduler stopped");
    }

    /// Handle a single event. Returns true when the loop should exit.
    fn handle_event(&mut self, event: DeckEvent, now: Instant) -> bool {
        trace!(?event, "scheduler event");
        match event {
            DeckEvent::PlayerReady(slot) => self.on_player_ready(slot),
            DeckEvent::PlayerStateChange { slot, code } => self.on_state_change(slot, code, now),
            DeckEvent::ContentResolved { slot, result } => self.on_content_resolved(slot, result),
            DeckEvent::Beat(beat) => {
                if !self.initialized {
                    debug!("beat before warm-up completed, ignoring");
                } else if let Some(chosen) = self.switch_to_next() {
                    info!("beat switch to slot {chosen} ({beat})");
                    if let Some(callback) = self.on_beat_switch.as_mut() {
                        callback(chosen);
                    }
                }
            }
            DeckEvent::Shutdown => return true,
        }
        false
    }

    fn on_player_ready(&mut self, slot: SlotId) {
        self.constructed.insert(slot);
        if self.constructed.len() == SlotId::ALL.len() && !self.warmup_started {
            self.warmup_started = true;
            info!("all player handles ready, warming up slots 1 and 2");
            self.begin_loading(SlotId::One);
            self.begin_loading(SlotId::Two);
        }
    }

    fn on_state_change(&mut self, slot: SlotId, code: i32, now: Instant) {
        if code != STATE_PLAYING {
            trace!("slot {slot} state code {code}, ignoring");
            return;
        }

        self.state.ready.insert(slot);
        if self.state.displayed != Some(slot) {
            self.slots[slot.index()].state = SlotState::Ready;
        }
        debug!(
            "slot {slot} content playing, ready set: {:?}",
            self.state.ready
        );

        if !self.initialized {
            // Nothing is displayed until both warm-up slots have
            // independently reported playing content.
            if self.state.ready.contains(&SlotId::One) && self.state.ready.contains(&SlotId::Two) {
                self.initialize(now);
            }
            return;
        }

        // Let the player's title chrome settle before switching.
        let delay = Duration::from_secs_f32(self.config.switch_delay_secs);
        self.pending_switches.push(now + delay);
    }

    fn initialize(&mut self, now: Instant) {
        self.initialized = true;
        self.state.displayed = Some(SlotId::One);
        self.state.loading = SlotId::Three;
        self.slots[SlotId::One.index()].state = SlotState::Displayed;
        for slot in SlotId::ALL {
            self.visibility.set_visible(slot, slot == SlotId::One);
        }
        self.next_rotation = Some(now + self.rotation_interval());
        info!("warm-up complete: displaying slot 1, prefetching slot 3");
    }

    fn on_content_resolved(&mut self, slot: SlotId, result: crate::error::Result<ContentItem>) {
        let item = match result {
            Ok(item) => item,
            Err(e) => {
                // The slot stays Loading and out of the ready set; the
                // next rotation cycle retries it.
                warn!("content request for slot {slot} failed: {e}");
                return;
            }
        };

        let start = start_offset(&item, &mut rand::rng());
        debug!("loading {} into slot {slot} at {start:.1}s", item.id);
        if let Err(e) = self.player.load(slot, &item.id, start) {
            error!("player load for slot {slot} aborted: {e}");
            return;
        }
        if let Err(e) = self.player.set_playback_rate(slot, self.config.playback_rate) {
            error!("set_playback_rate for slot {slot} aborted: {e}");
        }
        self.slots[slot.index()].content = Some(item);
    }

    /// Periodic content refresh: demote the prefetch slot and request a
    /// fresh item for it. Also the retry path for failed requests.
    fn rotation_tick(&mut self, now: Instant) {
        let slot = self.state.loading;
        debug!("rotation tick: reloading slot {slot}");
        self.begin_loading(slot);
        self.next_rotation = Some(now + self.rotation_interval());
    }

    /// The shared switch algorithm, used by both the deferred natural
    /// path and the immediate beat path.
    ///
    /// Picks the lowest-numbered ready slot other than the displayed
    /// one, shows it, then demotes the vacated slot and the recomputed
    /// prefetch slot to Loading with fresh content requests. Afterwards
    /// no non-displayed slot remains in the ready set, so an immediate
    /// second invocation is a no-op.
    fn switch_to_next(&mut self) -> Option<SlotId> {
        let displayed = self.state.displayed?;
        let chosen = match self.state.ready.iter().copied().find(|s| *s != displayed) {
            Some(slot) => slot,
            None => {
                debug!("no other slot with loaded content, skipping switch");
                return None;
            }
        };

        for slot in SlotId::ALL {
            self.visibility.set_visible(slot, slot == chosen);
        }
        self.state.displayed = Some(chosen);
        self.slots[chosen.index()].state = SlotState::Displayed;

        // The vacated slot has just been on screen; refresh it.
        let vacated = displayed;
        self.begin_loading(vacated);

        // Next prefetch slot in cyclic order, skipping the slot now on
        // display and the one just vacated.
        let mut next = self.state.loading;
        loop {
            next = next.next();
            if next != chosen && next != vacated {
                break;
            }
        }
        self.state.loading = next;
        self.begin_loading(next);

        debug!("displaying slot {chosen}, prefetching slot {next}");
        Some(chosen)
    }

    /// Move a slot into Loading and queue a themed content request.
    /// Dropping it from the ready set first keeps it unselectable while
    /// the new content is in flight.
    fn begin_loading(&mut self, slot: SlotId) {
        self.state.ready.remove(&slot);
        let theme = pick_theme(&self.config.themes, &mut rand::rng());
        let record = &mut self.slots[slot.index()];
        record.state = SlotState::Loading;
        record.theme = theme.clone();
        self.pending_requests.push((slot, theme));
    }

    /// Hand queued content requests to worker threads. Results come
    /// back through the event queue; a late response is applied to
    /// whatever the slot most recently asked for (last request wins).
    fn dispatch_requests(&mut self) {
        for (slot, theme) in std::mem::take(&mut self.pending_requests) {
            let provider = self.provider.clone();
            let event_tx = self.event_tx.clone();
            let spawned = thread::Builder::new()
                .name("content-request".to_string())
                .spawn(move || {
                    let result = provider.request(theme.as_deref());
                    let _ = event_tx.send(DeckEvent::ContentResolved { slot, result });
                });
            if let Err(e) = spawned {
                warn!("could not spawn content request for slot {slot}: {e}");
            }
        }
    }

    fn fire_due(&mut self, now: Instant) {
        if let Some(at) = self.next_rotation {
            if at <= now {
                self.rotation_tick(now);
            }
        }

        let due = self
            .pending_switches
            .iter()
            .filter(|at| **at <= now)
            .count();
        if due > 0 {
            self.pending_switches.retain(|at| *at > now);
            for _ in 0..due {
                if let Some(chosen) = self.switch_to_next() {
                    info!("rotated to slot {chosen}");
                }
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        let switches = self.pending_switches.iter().min().copied();
        match (self.next_rotation, switches) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }

    fn rotation_interval(&self) -> Duration {
        Duration::from_secs_f32(self.config.rotation_interval_secs)
    }

    #[cfg(test)]
    fn take_requests(&mut self) -> Vec<(SlotId, Option<String>)> {
        std::mem::take(&mut self.pending_requests)
    }
}

/// Random seek offset into an item, keeping a margin from both ends
/// when the duration is known.
fn start_offset<R: Rng>(item: &ContentItem, rng: &mut R) -> f32 {
    match item.duration_secs {
        Some(duration) if duration > 2.0 * START_OFFSET_MARGIN_SECS => {
            rng.random_range(START_OFFSET_MARGIN_SECS..duration - START_OFFSET_MARGIN_SECS)
        }
        Some(_) => 0.0,
        None => rng.random_range(FALLBACK_START_MIN_SECS..FALLBACK_START_MAX_SECS),
    }
}
