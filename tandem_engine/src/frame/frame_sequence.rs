/// Frame sequence shared by every renderer backend.
///
/// `run_frame` owns the ordering of one frame against a [`FrameRing`]:
///
/// 1. wait on the current slot's fence
/// 2. acquire an image (out of date: report it, the slot stays unchanged)
/// 3. wait on the fence of the slot that last rendered that image
/// 4. record, reset the slot's fence and submit
/// 5. present, then advance the ring
///
/// Chain rebuilds stay with the caller, driven by the returned [`FrameOutcome`].

use crate::error::Result;
use crate::frame::FrameRing;

/// The GPU-facing steps of one frame
pub trait FrameBackend {
    /// Block until the last submission made from `slot` retired
    fn wait_slot(&mut self, slot: usize) -> Result<()>;

    /// Acquire the next presentable image, signaling `slot`'s image-available
    /// semaphore. Returns the image index and whether the chain is suboptimal.
    fn acquire(&mut self, slot: usize) -> Result<(u32, bool)>;

    /// Record and submit the frame for `image` from `slot`.
    ///
    /// The slot's fence is reset here, right before the submission that will
    /// signal it again. Returns the number of draw calls recorded.
    fn submit(&mut self, slot: usize, image: u32) -> Result<u32>;

    /// Queue `image` for presentation. Returns whether the chain is suboptimal.
    fn present(&mut self, image: u32) -> Result<bool>;
}

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and presented from `slot`
    Presented {
        slot: usize,
        image: u32,
        draw_calls: u32,
        /// The chain no longer matches the surface and must be rebuilt
        stale: bool,
    },
    /// Acquire reported an out-of-date chain: nothing was submitted, the
    /// slot's fence is still signaled and the ring did not advance
    OutOfDate,
}

/// Run one frame through `backend`, advancing `ring` once it was presented.
///
/// Frame-transient errors from acquire or present become outcomes; every other
/// error is returned as is.
pub fn run_frame<B: FrameBackend>(ring: &mut FrameRing, backend: &mut B) -> Result<FrameOutcome> {
    let slot = ring.current();
    backend.wait_slot(slot)?;

    let (image, acquire_suboptimal) = match backend.acquire(slot) {
        Ok(acquired) => acquired,
        Err(e) if e.is_frame_transient() => return Ok(FrameOutcome::OutOfDate),
        Err(e) => return Err(e),
    };

    if let Some(previous) = ring.claim_image(image)? {
        backend.wait_slot(previous)?;
    }

    let draw_calls = backend.submit(slot, image)?;

    let stale = match backend.present(image) {
        Ok(present_suboptimal) => acquire_suboptimal || present_suboptimal,
        Err(e) if e.is_frame_transient() => true,
        Err(e) => return Err(e),
    };

    ring.advance();
    Ok(FrameOutcome::Presented {
        slot,
        image,
        draw_calls,
        stale,
    })
}

#[cfg(test)]
#[path = "frame_sequence_tests.rs"]
mod tests;
