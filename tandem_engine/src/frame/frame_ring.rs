/// FrameRing - the bounded ring of frames in flight.
///
/// A frame slot owns one "image available" semaphore, one fence and one
/// command buffer on the backend side; this type only tracks indices:
///
/// - which slot records the next frame (`current`, advanced after present)
/// - which slot last rendered into each presentable image, so the backend can
///   wait on that slot's fence before rewriting the image's uniform buffer
///
/// Slot count and image count are independent, but the ring refuses to be
/// built with more slots than images.

use crate::error::{Error, Result};

/// Number of frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

#[derive(Debug, Clone)]
pub struct FrameRing {
    slot_count: usize,
    current: usize,
    /// Per presentable image: slot of the last submission that rendered it
    image_owners: Vec<Option<usize>>,
}

impl FrameRing {
    /// Create a ring of `slot_count` slots for a chain of `image_count` images
    pub fn new(slot_count: usize, image_count: usize) -> Result<Self> {
        Self::check(slot_count, image_count)?;
        Ok(Self {
            slot_count,
            current: 0,
            image_owners: vec![None; image_count],
        })
    }

    fn check(slot_count: usize, image_count: usize) -> Result<()> {
        if slot_count == 0 {
            return Err(Error::InitializationFailed(
                "Frame ring needs at least one slot".to_string(),
            ));
        }
        if slot_count > image_count {
            return Err(Error::InitializationFailed(format!(
                "{} frames in flight need at least {} presentable images, chain has {}",
                slot_count, slot_count, image_count
            )));
        }
        Ok(())
    }

    /// Slot recording the next frame
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn image_count(&self) -> usize {
        self.image_owners.len()
    }

    /// Move to the next slot, returning it
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % self.slot_count;
        self.current
    }

    /// Record that the current slot renders into `image_index`.
    ///
    /// Returns the slot that previously rendered that image when it is not the
    /// current one: its fence must be waited on before the image's per-image
    /// resources are rewritten.
    pub fn claim_image(&mut self, image_index: u32) -> Result<Option<usize>> {
        let image_count = self.image_owners.len();
        let owner = self
            .image_owners
            .get_mut(image_index as usize)
            .ok_or_else(|| Error::BackendError(format!(
                "Acquired image {} outside chain of {}", image_index, image_count
            )))?;
        let previous = owner.replace(self.current);
        Ok(previous.filter(|&slot| slot != self.current))
    }

    /// Forget image ownership after the chain was rebuilt with `image_count` images.
    ///
    /// The slot index is kept: slots are independent of the chain.
    pub fn rebuild(&mut self, image_count: usize) -> Result<()> {
        Self::check(self.slot_count, image_count)?;
        self.image_owners = vec![None; image_count];
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
