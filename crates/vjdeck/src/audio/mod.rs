//! Audio subsystem: capture, energy analysis, and beat detection

pub mod analyzer;
pub mod capture;
pub mod detector;
pub mod types;

pub use analyzer::EnergyAnalyzer;
pub use capture::{AudioListener, BeatCallback, CaptureSource, FrameObserver};
pub use detector::BeatDetector;
pub use types::{BeatEvent, CaptureStatus, FrameMetrics};
