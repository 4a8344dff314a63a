//! Serializable reports produced by the depth pipeline and the tools.
//!
//! `CameraReport` describes one processed camera (ranges, repairs, written
//! files, per-stage timings); `FrameReport` aggregates a batch.

pub mod report;
pub mod timing;

pub use report::{CameraFailure, CameraReport, FrameReport};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
