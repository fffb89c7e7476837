//! Audio capture
//!
//! [`CaptureSource`] abstracts the microphone; [`AudioListener`] runs the
//! capture loop on a dedicated thread, feeding each block through the
//! analyzer and detector and invoking the beat callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::{analysis::FFT_SIZE, BeatConfig};
use crate::error::Result;

use super::analyzer::EnergyAnalyzer;
use super::detector::BeatDetector;
use super::types::{BeatEvent, CaptureStatus, FrameMetrics};

/// A source of raw audio sample blocks
///
/// `next_block` blocks until a full analysis window is available; the
/// source paces the analysis cadence. Implementations release their
/// underlying device in `stop`, which the listener thread is guaranteed
/// to call before exiting.
pub trait CaptureSource: Send {
    /// Request access to the input device. Fails with
    /// [`DeckError::PermissionDenied`] or [`DeckError::DeviceAbsent`];
    /// the two are distinguished for diagnostics only.
    ///
    /// [`DeckError::PermissionDenied`]: crate::error::DeckError::PermissionDenied
    /// [`DeckError::DeviceAbsent`]: crate::error::DeckError::DeviceAbsent
    fn request_access(&mut self) -> Result<()>;

    /// Fill `buf` with the next sample block. Returns `Ok(false)` when
    /// the stream has ended.
    fn next_block(&mut self, buf: &mut [f32; FFT_SIZE]) -> Result<bool>;

    /// Release the underlying audio resource
    fn stop(&mut self);
}

/// Observer invoked once per analysis tick
pub type FrameObserver = Box<dyn FnMut(&FrameMetrics) + Send>;

/// Callback invoked for each accepted beat
pub type BeatCallback = Box<dyn FnMut(BeatEvent) + Send>;

/// Runs capture, analysis, and beat detection on a dedicated thread
pub struct AudioListener {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl AudioListener {
    /// Request device access and start the capture thread.
    ///
    /// Access failures propagate to the caller before any thread is
    /// spawned, so a denied microphone costs nothing.
    pub fn start(
        mut source: Box<dyn CaptureSource>,
        beat_config: BeatConfig,
        on_frame: Option<FrameObserver>,
        on_beat: BeatCallback,
    ) -> Result<Self> {
        source.request_access()?;
        info!("microphone access granted, starting analysis");

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_thread = stop_flag.clone();

        let thread = thread::Builder::new()
            .name("beat-listener".to_string())
            .spawn(move || {
                run_capture_loop(source.as_mut(), beat_config, on_frame, on_beat, &stop_thread);
                // Device release is tied to thread exit, whatever the
                // reason for leaving the loop.
                source.stop();
                debug!("capture stopped, device released");
            })
            .map_err(|e| crate::error::DeckError::Capture(format!("spawn failed: {e}")))?;

        Ok(Self {
            stop_flag,
            thread: Some(thread),
        })
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus {
            listening: self.thread.is_some(),
            has_access: true,
        }
    }

    /// Stop listening. No callbacks fire after this returns; the device
    /// is released before the join completes.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture_loop(
    source: &mut dyn CaptureSource,
    beat_config: BeatConfig,
    mut on_frame: Option<FrameObserver>,
    mut on_beat: BeatCallback,
    stop_flag: &AtomicBool,
) {
    let mut analyzer = EnergyAnalyzer::new();
    let mut detector = BeatDetector::new(beat_config);
    let mut block = [0.0_f32; FFT_SIZE];

    while !stop_flag.load(Ordering::Relaxed) {
        match source.next_block(&mut block) {
            Ok(true) => {
                let metrics = analyzer.process_block(&block);
                if let Some(observer) = on_frame.as_mut() {
                    observer(&metrics);
                }
                if let Some(beat) = detector.process(&metrics) {
                    debug!(%beat, "beat detected");
                    on_beat(beat);
                }
            }
            Ok(false) => {
                info!("capture stream ended");
                break;
            }
            Err(e) => {
                warn!("capture error, stopping analysis: {e}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeckError;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves a fixed number of loud blocks, then ends the stream
    struct ScriptedSource {
        blocks_left: usize,
        amplitude: f32,
        stopped: Arc<AtomicBool>,
        access: Option<DeckError>,
    }

    impl CaptureSource for ScriptedSource {
        fn request_access(&mut self) -> Result<()> {
            match self.access.take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn next_block(&mut self, buf: &mut [f32; FFT_SIZE]) -> Result<bool> {
            if self.blocks_left == 0 {
                return Ok(false);
            }
            self.blocks_left -= 1;
            for (i, sample) in buf.iter_mut().enumerate() {
                *sample = self.amplitude
                    * (2.0 * std::f32::consts::PI * 5.0 * i as f32 / FFT_SIZE as f32).sin();
            }
            Ok(true)
        }

        fn stop(&mut self) {
            self.stopped.store(true, Ordering::Relaxed);
        }
    }

    #[test]
    fn denied_access_propagates_without_spawning() {
        let stopped = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource {
            blocks_left: 10,
            amplitude: 1.0,
            stopped: stopped.clone(),
            access: Some(DeckError::PermissionDenied),
        };
        let result = AudioListener::start(
            Box::new(source),
            BeatConfig::default(),
            None,
            Box::new(|_| {}),
        );
        assert!(matches!(result, Err(DeckError::PermissionDenied)));
    }

    #[test]
    fn frames_reach_the_observer() {
        let stopped = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource {
            blocks_left: 5,
            amplitude: 1.0,
            stopped: stopped.clone(),
            access: None,
        };
        let frames = Arc::new(Mutex::new(Vec::new()));
        let frames_cb = frames.clone();
        let mut listener = AudioListener::start(
            Box::new(source),
            BeatConfig::default(),
            Some(Box::new(move |m: &FrameMetrics| {
                frames_cb.lock().unwrap().push(*m);
            })),
            Box::new(|_| {}),
        )
        .unwrap();

        // The scripted stream ends on its own; poll until the thread
        // has drained all five blocks.
        for _ in 0..100 {
            if frames.lock().unwrap().len() == 5 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        listener.stop();
        assert_eq!(frames.lock().unwrap().len(), 5);
    }

    #[test]
    fn stop_releases_the_device() {
        let stopped = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource {
            blocks_left: usize::MAX,
            amplitude: 0.0,
            stopped: stopped.clone(),
            access: None,
        };
        let mut listener = AudioListener::start(
            Box::new(source),
            BeatConfig::default(),
            None,
            Box::new(|_| {}),
        )
        .unwrap();
        listener.stop();
        assert!(stopped.load(Ordering::Relaxed));
    }

    #[test]
    fn stream_end_also_releases_the_device() {
        let stopped = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource {
            blocks_left: 1,
            amplitude: 0.0,
            stopped: stopped.clone(),
            access: None,
        };
        let mut listener = AudioListener::start(
            Box::new(source),
            BeatConfig::default(),
            None,
            Box::new(|_| {}),
        )
        .unwrap();
        for _ in 0..100 {
            if stopped.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(stopped.load(Ordering::Relaxed));
        listener.stop();
    }
}
