/// Presentable image chain sizing shared by every backend.

/// Image count bounds reported by a presentation surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLimits {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
}

impl ChainLimits {
    /// One image more than the minimum, so the application never waits on
    /// the presentation engine to release its last image; clamped to the
    /// maximum when the surface has one.
    pub fn image_count(&self) -> u32 {
        let wanted = self.min_image_count + 1;
        if self.max_image_count > 0 {
            wanted.min(self.max_image_count)
        } else {
            wanted
        }
    }
}
