/// Mock Renderer for unit tests (no GPU required)
///
/// Drives the shared frame sequence against simulated fences and a simulated
/// image chain, so frame pacing, chain rebuilds and scene ingestion can be
/// tested on any machine.
///
/// The simulated GPU finishes a submission as soon as someone waits on its
/// fence, which is the earliest point the CPU could observe completion.

use glam::Mat4;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::frame::{run_frame, ChainLimits, FrameBackend, FrameOutcome, FrameRing, MAX_FRAMES_IN_FLIGHT};
use crate::renderer::{Renderer, RendererConfig, RendererStats};
use crate::resource::{CameraConfig, ImageData};
use crate::scene::{ingest_scene, ModelKey, SceneDescription, SceneRegistry, TextureKey};
use crate::engine_warn;

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MockTexture {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockMesh {
    pub vertex_count: u32,
    pub index_count: u32,
    pub texture: TextureKey,
}

/// Per-image objects rebuilt with the chain (ids only)
#[derive(Debug, Default)]
struct PerImage {
    views: Vec<u32>,
    framebuffers: Vec<u32>,
    uniform_buffers: Vec<u32>,
    uniform_sets: Vec<u32>,
    input_attachment_sets: Vec<u32>,
}

// ============================================================================
// Simulated GPU
// ============================================================================

/// Fences, image acquisition and queue of the mock
#[derive(Debug)]
pub struct MockGpu {
    /// Signaled state per frame slot
    fences: Vec<bool>,
    image_count: u32,
    next_image: u32,
    /// Draw calls recorded by the next submission
    draw_calls: u32,
    /// Fail the next N acquires with an out-of-date chain
    pub out_of_date_acquires: u32,
    /// Report the next present as out of date
    pub out_of_date_present: bool,
    /// Slot used by every submitted frame, in order
    pub slot_history: Vec<usize>,
    /// Image index used by every submitted frame, in order
    pub image_history: Vec<u32>,
    /// Highest number of simultaneously unsignaled fences
    pub peak_outstanding: usize,
}

impl MockGpu {
    fn new() -> Self {
        Self {
            fences: vec![true; MAX_FRAMES_IN_FLIGHT],
            image_count: 0,
            next_image: 0,
            draw_calls: 0,
            out_of_date_acquires: 0,
            out_of_date_present: false,
            slot_history: Vec::new(),
            image_history: Vec::new(),
            peak_outstanding: 0,
        }
    }

    pub fn outstanding_fences(&self) -> usize {
        self.fences.iter().filter(|signaled| !**signaled).count()
    }

    /// Device-idle wait: every submission retires
    fn drain(&mut self) {
        self.fences.iter_mut().for_each(|f| *f = true);
    }
}

impl FrameBackend for MockGpu {
    fn wait_slot(&mut self, slot: usize) -> Result<()> {
        self.fences[slot] = true;
        Ok(())
    }

    fn acquire(&mut self, _slot: usize) -> Result<(u32, bool)> {
        if self.out_of_date_acquires > 0 {
            self.out_of_date_acquires -= 1;
            return Err(Error::SwapchainOutOfDate);
        }
        let image = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        Ok((image, false))
    }

    fn submit(&mut self, slot: usize, image: u32) -> Result<u32> {
        if !self.fences[slot] {
            return Err(Error::BackendError(format!("Slot {} reset while in flight", slot)));
        }
        self.fences[slot] = false;
        self.peak_outstanding = self.peak_outstanding.max(self.outstanding_fences());
        self.slot_history.push(slot);
        self.image_history.push(image);
        Ok(self.draw_calls)
    }

    fn present(&mut self, _image: u32) -> Result<bool> {
        if std::mem::take(&mut self.out_of_date_present) {
            return Err(Error::SwapchainOutOfDate);
        }
        Ok(false)
    }
}

// ============================================================================
// Mock renderer
// ============================================================================

pub struct MockRenderer {
    limits: ChainLimits,
    extent: (u32, u32),
    per_image: PerImage,
    next_object_id: u32,
    ring: FrameRing,
    pub gpu: MockGpu,
    resize_pending: bool,
    /// Texture file names whose decoding fails
    pub missing_textures: FxHashSet<String>,
    registry: SceneRegistry<MockMesh, MockTexture>,
    camera: CameraConfig,
    stats: RendererStats,
    destroyed: bool,
}

impl MockRenderer {
    /// Build a mock whose surface reports `limits`
    pub fn new(limits: ChainLimits, config: &RendererConfig) -> Result<Self> {
        let image_count = limits.image_count();
        let ring = FrameRing::new(MAX_FRAMES_IN_FLIGHT, image_count as usize)?;

        let mut registry = SceneRegistry::new(config.max_textures);
        let white = ImageData::solid([255, 255, 255, 255]);
        registry.set_default_texture(MockTexture {
            file_name: String::new(),
            width: white.width(),
            height: white.height(),
        })?;

        let mut renderer = Self {
            limits,
            extent: (1200, 675),
            per_image: PerImage::default(),
            next_object_id: 0,
            ring,
            gpu: MockGpu::new(),
            resize_pending: false,
            missing_textures: FxHashSet::default(),
            registry,
            camera: config.camera,
            stats: RendererStats::default(),
            destroyed: false,
        };
        renderer.build_chain();
        Ok(renderer)
    }

    /// Change what the surface reports, as a monitor change would
    pub fn set_surface_limits(&mut self, limits: ChainLimits) {
        self.limits = limits;
    }

    fn fresh_ids(&mut self, count: u32) -> Vec<u32> {
        let start = self.next_object_id;
        self.next_object_id += count;
        (start..start + count).collect()
    }

    fn build_chain(&mut self) {
        let count = self.limits.image_count();
        self.per_image = PerImage {
            views: self.fresh_ids(count),
            framebuffers: self.fresh_ids(count),
            uniform_buffers: self.fresh_ids(count),
            uniform_sets: self.fresh_ids(count),
            input_attachment_sets: self.fresh_ids(count),
        };
        self.gpu.image_count = count;
        self.gpu.next_image = 0;
        self.stats.image_count = count;
    }

    /// Returns false while the extent has no area; the rebuild stays pending
    fn rebuild_chain(&mut self) -> Result<bool> {
        self.resize_pending = true;
        if self.extent.0 == 0 || self.extent.1 == 0 {
            return Ok(false);
        }
        self.gpu.drain();
        // Tear down in lock-step, then rebuild in lock-step
        self.per_image = PerImage::default();
        self.build_chain();
        self.ring.rebuild(self.gpu.image_count as usize)?;
        self.resize_pending = false;
        self.stats.chain_rebuilds += 1;
        Ok(true)
    }

    /// (images, framebuffers, uniform buffers, uniform sets, input-attachment sets)
    pub fn per_image_counts(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.per_image.views.len(),
            self.per_image.framebuffers.len(),
            self.per_image.uniform_buffers.len(),
            self.per_image.uniform_sets.len(),
            self.per_image.input_attachment_sets.len(),
        )
    }

    /// Framebuffer ids of the current chain
    pub fn framebuffer_ids(&self) -> &[u32] {
        &self.per_image.framebuffers
    }

    pub fn outstanding_fences(&self) -> usize {
        self.gpu.outstanding_fences()
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn current_slot(&self) -> usize {
        self.ring.current()
    }

    pub fn registry(&self) -> &SceneRegistry<MockMesh, MockTexture> {
        &self.registry
    }

    pub fn camera(&self) -> &CameraConfig {
        &self.camera
    }
}

impl Renderer for MockRenderer {
    fn draw(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(Error::InvalidResource("Renderer destroyed".to_string()));
        }
        if self.resize_pending && !self.rebuild_chain()? {
            self.stats.frames_skipped += 1;
            return Ok(());
        }

        self.gpu.draw_calls = self
            .registry
            .models()
            .map(|(_, model)| model.mesh_count() as u32)
            .sum();

        match run_frame(&mut self.ring, &mut self.gpu)? {
            FrameOutcome::OutOfDate => {
                engine_warn!("tandem::mock", "Chain out of date on acquire, rebuilding");
                self.stats.frames_skipped += 1;
                self.rebuild_chain()?;
            }
            FrameOutcome::Presented { draw_calls, stale, .. } => {
                self.stats.frames_drawn += 1;
                self.stats.draw_calls = draw_calls;
                if stale {
                    self.rebuild_chain()?;
                }
            }
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.extent = (width, height);
        self.resize_pending = true;
    }

    fn load_scene(&mut self, scene: &SceneDescription) -> Result<ModelKey> {
        let missing = &self.missing_textures;
        let key = ingest_scene(
            &mut self.registry,
            scene,
            |file_name| {
                if missing.contains(file_name) {
                    return Err(Error::LoadFailed(format!("{}: not found", file_name)));
                }
                Ok(MockTexture {
                    file_name: file_name.to_string(),
                    width: 4,
                    height: 4,
                })
            },
            |mesh, texture| {
                Ok(MockMesh {
                    vertex_count: mesh.positions.len() as u32,
                    index_count: mesh.indices.len() as u32,
                    texture,
                })
            },
        )?;
        self.stats.models = self.registry.model_count() as u32;
        self.stats.textures = self.registry.texture_count() as u32;
        Ok(key)
    }

    fn set_model_matrix(&mut self, model: ModelKey, matrix: Mat4) -> Result<()> {
        self.registry.set_model_matrix(model, matrix)
    }

    fn remove_model(&mut self, model: ModelKey) -> Result<()> {
        self.gpu.drain();
        self.registry.remove_model(model)?;
        self.stats.models = self.registry.model_count() as u32;
        Ok(())
    }

    fn set_camera(&mut self, camera: CameraConfig) {
        self.camera = camera;
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.gpu.drain();
        self.registry.clear();
        self.per_image = PerImage::default();
        self.destroyed = true;
    }
}

#[cfg(test)]
#[path = "mock_renderer_tests.rs"]
mod tests;
