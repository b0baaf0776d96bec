//! Frame pacing: frames-in-flight ring and chain sizing

mod frame_ring;
mod frame_sequence;
mod chain;

pub use frame_ring::{FrameRing, MAX_FRAMES_IN_FLIGHT};
pub use frame_sequence::{run_frame, FrameBackend, FrameOutcome};
pub use chain::ChainLimits;
