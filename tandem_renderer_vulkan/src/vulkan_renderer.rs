/// VulkanRenderer - Vulkan implementation of the Renderer trait
///
/// Frame sequence (one call to `draw`):
///
/// 1. rebuild the chain if a resize was notified
/// 2. wait on the current slot's fence
/// 3. acquire an image (out of date: rebuild, skip the frame)
/// 4. wait on the fence of the slot that last rendered that image
/// 5. write the image's uniform buffer, reset the fence, record
/// 6. submit (wait image-available, signal render-finished and the fence)
/// 7. present, advance the slot, rebuild if the chain went stale
///
/// Steps 2 to 7 run through the shared `run_frame` sequence; this type
/// supplies the Vulkan side of each step and handles the rebuilds.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use tandem_engine::glam::Mat4;
use tandem_engine::tandem::frame::{run_frame, FrameBackend, FrameOutcome, FrameRing, MAX_FRAMES_IN_FLIGHT};
use tandem_engine::tandem::resource::{load_rgba8, CameraConfig, ImageData, UboViewProjection, Vertex};
use tandem_engine::tandem::scene::{ingest_scene, ModelKey, SceneDescription, SceneRegistry};
use tandem_engine::tandem::{Error, Renderer, RendererConfig, RendererStats, Result};
use tandem_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

#[cfg(feature = "vulkan-validation")]
use crate::debug::{self, DebugMessenger};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor::DescriptorManager;
use crate::vulkan_device::{create_instance, create_logical_device, select_physical_device};
use crate::vulkan_frame::FrameSlots;
use crate::vulkan_frame_targets::FrameTarget;
use crate::vulkan_mesh::Mesh;
use crate::vulkan_pipeline::Pipelines;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_sampler::Sampler;
use crate::vulkan_swapchain::{find_depth_format, Swapchain};
use crate::vulkan_texture::Texture;
use crate::vulkan_transfer::read_buffer;

// ============================================================================
// Chain-sized resources
// ============================================================================

/// Everything whose count equals the presentable image count.
///
/// Field order is drop order: framebuffers and attachments, then uniform
/// buffers, then the image views and the chain itself.
struct ChainResources {
    targets: Vec<FrameTarget>,
    uniform_buffers: Vec<Buffer>,
    swapchain: Swapchain,
}

impl ChainResources {
    fn new(
        ctx: &Arc<GpuContext>,
        swapchain: Swapchain,
        render_pass: &RenderPass,
        depth_format: vk::Format,
        descriptors: &mut DescriptorManager,
    ) -> Result<Self> {
        let extent = swapchain.extent();
        let mut targets = Vec::with_capacity(swapchain.image_count());
        let mut uniform_buffers = Vec::with_capacity(swapchain.image_count());

        for (i, &view) in swapchain.views().iter().enumerate() {
            targets.push(FrameTarget::new(ctx, render_pass, view, extent, depth_format, i)?);
            uniform_buffers.push(Buffer::new(
                Arc::clone(ctx),
                std::mem::size_of::<UboViewProjection>() as u64,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                MemoryLocation::CpuToGpu,
                "view projection",
            )?);
        }
        descriptors.build_per_image(&uniform_buffers, &targets)?;

        Ok(Self {
            targets,
            uniform_buffers,
            swapchain,
        })
    }
}

/// Device objects owned by the renderer, dropped in field order
struct DeviceObjects {
    frames: FrameSlots,
    pipelines: Pipelines,
    chain: Option<ChainResources>,
    descriptors: DescriptorManager,
    sampler: Sampler,
    render_pass: RenderPass,
}

/// Instance-level objects created before the renderer exists.
/// Destroys whatever it still holds if initialization stops early.
#[derive(Default)]
struct InitGuard {
    instance: Option<ash::Instance>,
    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<DebugMessenger>,
    surface: Option<(ash::khr::surface::Instance, vk::SurfaceKHR)>,
    device: Option<ash::Device>,
    allocator: Option<Allocator>,
    transfer_command_pool: Option<vk::CommandPool>,
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        unsafe {
            if let Some(device) = &self.device {
                if let Some(pool) = self.transfer_command_pool.take() {
                    device.destroy_command_pool(pool, None);
                }
                drop(self.allocator.take());
                device.destroy_device(None);
            }
            if let Some((loader, surface)) = self.surface.take() {
                loader.destroy_surface(surface, None);
            }
            #[cfg(feature = "vulkan-validation")]
            if let Some(messenger) = self.debug_messenger.take() {
                messenger.destroy();
            }
            if let Some(instance) = self.instance.take() {
                instance.destroy_instance(None);
            }
        }
    }
}

// ============================================================================
// VulkanRenderer
// ============================================================================

pub struct VulkanRenderer {
    config: RendererConfig,

    /// Keeps the Vulkan library loaded
    _entry: ash::Entry,
    instance: ash::Instance,
    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<DebugMessenger>,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,

    ctx: Arc<GpuContext>,
    depth_format: vk::Format,
    objects: Option<DeviceObjects>,

    ring: FrameRing,
    registry: SceneRegistry<Mesh, Texture>,

    framebuffer_size: (u32, u32),
    resize_pending: bool,
    camera: CameraConfig,
    stats: RendererStats,
    destroyed: bool,
}

impl VulkanRenderer {
    /// Create the renderer for a window whose framebuffer is
    /// `framebuffer_size` pixels.
    ///
    /// Loads the shaders from `config.shader_directory` and registers a 1x1
    /// white default texture at index 0.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        framebuffer_size: (u32, u32),
        config: RendererConfig,
    ) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to load Vulkan library: {:?}", e);
            Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
        })?;

        let display_handle = window.display_handle().map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
        let window_handle = window.window_handle().map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to get window handle: {}", e);
            Error::InitializationFailed(format!("Failed to get window handle: {}", e))
        })?;

        let mut guard = InitGuard::default();

        let (instance, validation) = create_instance(&entry, &config, display_handle.as_raw())?;
        guard.instance = Some(instance.clone());

        #[cfg(feature = "vulkan-validation")]
        if validation {
            guard.debug_messenger = Some(DebugMessenger::new(
                &entry,
                &instance,
                debug::Config {
                    severity: config.debug_severity,
                    panic_on_error: config.panic_on_validation_error,
                    enable_stats: config.enable_validation_stats,
                },
            )?);
        }
        #[cfg(not(feature = "vulkan-validation"))]
        let _ = validation;

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
        let surface = unsafe {
            ash_window::create_surface(&entry, &instance, display_handle.as_raw(), window_handle.as_raw(), None)
        }
        .map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to create surface: {:?}", e);
            Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
        })?;
        guard.surface = Some((surface_loader.clone(), surface));

        let selection = select_physical_device(&instance, &surface_loader, surface)?;
        let (device, graphics_queue, present_queue) = create_logical_device(&instance, &selection)?;
        guard.device = Some(device.clone());

        guard.allocator = Some(
            Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: selection.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("tandem::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?,
        );

        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(selection.graphics_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        guard.transfer_command_pool = Some(
            unsafe { device.create_command_pool(&pool_info, None) }.map_err(|e| {
                engine_error!("tandem::vulkan", "Failed to create transfer command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create transfer command pool: {:?}", e))
            })?,
        );

        let depth_format = find_depth_format(&instance, selection.physical_device)?;

        // From here on the renderer owns everything and its Drop cleans up
        let (Some(allocator), Some(transfer_command_pool)) =
            (guard.allocator.take(), guard.transfer_command_pool.take())
        else {
            return Err(Error::InitializationFailed("Device setup incomplete".to_string()));
        };
        let ctx = Arc::new(GpuContext {
            device,
            physical_device: selection.physical_device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family: selection.graphics_family,
            present_queue,
            present_queue_family: selection.present_family,
            transfer_command_pool: Mutex::new(transfer_command_pool),
            max_sampler_anisotropy: selection.max_sampler_anisotropy,
        });
        guard.device = None;
        guard.surface = None;
        guard.instance = None;

        let mut renderer = Self {
            registry: SceneRegistry::new(config.max_textures),
            camera: config.camera,
            config,
            _entry: entry,
            instance,
            #[cfg(feature = "vulkan-validation")]
            debug_messenger: guard.debug_messenger.take(),
            surface_loader,
            surface,
            ctx,
            depth_format,
            objects: None,
            // Replaced once the chain exists
            ring: FrameRing::new(1, 1)?,
            framebuffer_size,
            resize_pending: false,
            stats: RendererStats::default(),
            destroyed: false,
        };
        renderer.create_device_objects()?;
        renderer.create_default_texture()?;

        engine_info!(
            "tandem::vulkan",
            "Renderer ready: {} presentable images, {} frames in flight",
            renderer.stats.image_count,
            MAX_FRAMES_IN_FLIGHT
        );
        Ok(renderer)
    }

    fn create_device_objects(&mut self) -> Result<()> {
        let device = &self.ctx.device;
        let swapchain = Swapchain::new(
            Arc::clone(&self.ctx),
            &self.instance,
            &self.surface_loader,
            self.surface,
            self.framebuffer_size,
        )?;
        // More slots than images would let two frames share an image
        self.ring = FrameRing::new(MAX_FRAMES_IN_FLIGHT, swapchain.image_count())?;

        let render_pass = RenderPass::new(device, swapchain.format(), self.depth_format)?;
        let mut descriptors = DescriptorManager::new(device, self.config.max_textures)?;
        let pipelines = Pipelines::new(device, &render_pass, &descriptors, &self.config.shader_directory)?;
        let sampler = Sampler::new(device, self.ctx.max_sampler_anisotropy)?;
        let frames = FrameSlots::new(device, self.ctx.graphics_queue_family, MAX_FRAMES_IN_FLIGHT)?;
        let chain = ChainResources::new(&self.ctx, swapchain, &render_pass, self.depth_format, &mut descriptors)?;

        self.stats.image_count = chain.swapchain.image_count() as u32;
        self.objects = Some(DeviceObjects {
            frames,
            pipelines,
            chain: Some(chain),
            descriptors,
            sampler,
            render_pass,
        });
        Ok(())
    }

    fn create_default_texture(&mut self) -> Result<()> {
        let objects = self.objects.as_mut().ok_or_else(destroyed_error)?;
        let texture = Texture::new(
            &self.ctx,
            &mut objects.descriptors,
            &objects.sampler,
            &ImageData::solid([255, 255, 255, 255]),
            "default texture",
        )?;
        self.registry.set_default_texture(texture)?;
        self.stats.textures = self.registry.texture_count() as u32;
        Ok(())
    }

    // ===== CHAIN REBUILD =====

    fn surface_is_zero_sized(&self) -> bool {
        let capabilities = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
        };
        match capabilities {
            Ok(caps) => caps.current_extent.width == 0 || caps.current_extent.height == 0,
            Err(_) => false,
        }
    }

    /// Tear down and rebuild every chain-sized resource in lock-step.
    ///
    /// Pipelines, layouts, the render pass and the sampler pool survive.
    /// Returns false when the surface has no area (minimized window); the
    /// rebuild stays pending.
    fn rebuild_chain(&mut self) -> Result<bool> {
        self.resize_pending = true;
        if self.framebuffer_size.0 == 0 || self.framebuffer_size.1 == 0 || self.surface_is_zero_sized() {
            return Ok(false);
        }

        self.wait_idle()?;
        let objects = self.objects.as_mut().ok_or_else(destroyed_error)?;
        let present_format = objects.chain.as_ref().map(|c| c.swapchain.format());

        // Framebuffers, then views, then the chain
        objects.descriptors.release_per_image();
        objects.chain = None;

        let swapchain = Swapchain::new(
            Arc::clone(&self.ctx),
            &self.instance,
            &self.surface_loader,
            self.surface,
            self.framebuffer_size,
        )?;
        if present_format.is_some_and(|format| format != swapchain.format()) {
            engine_error!(
                "tandem::vulkan",
                "Surface format changed from {:?} to {:?}",
                present_format,
                swapchain.format()
            );
            return Err(Error::InitializationFailed("Surface format changed on rebuild".to_string()));
        }
        self.ring.rebuild(swapchain.image_count())?;

        let chain = ChainResources::new(
            &self.ctx,
            swapchain,
            &objects.render_pass,
            self.depth_format,
            &mut objects.descriptors,
        )?;
        let extent = chain.swapchain.extent();
        self.stats.image_count = chain.swapchain.image_count() as u32;
        objects.chain = Some(chain);

        self.resize_pending = false;
        self.stats.chain_rebuilds += 1;
        engine_debug!(
            "tandem::vulkan",
            "Chain rebuilt: {}x{}, {} images",
            extent.width,
            extent.height,
            self.stats.image_count
        );
        Ok(true)
    }

    // ===== INTROSPECTION =====

    /// Per-image object counts: (images, framebuffers, uniform buffers,
    /// uniform sets, input-attachment sets). All equal while the chain exists.
    pub fn per_image_counts(&self) -> (usize, usize, usize, usize, usize) {
        match &self.objects {
            Some(objects) => {
                let (uniform_sets, input_sets) = objects.descriptors.per_image_counts();
                match &objects.chain {
                    Some(chain) => (
                        chain.swapchain.image_count(),
                        chain.targets.len(),
                        chain.uniform_buffers.len(),
                        uniform_sets,
                        input_sets,
                    ),
                    None => (0, 0, 0, uniform_sets, input_sets),
                }
            }
            None => (0, 0, 0, 0, 0),
        }
    }

    /// Frame slot the next `draw` records into
    pub fn current_slot(&self) -> usize {
        self.ring.current()
    }

    /// Frame slots whose submission has not retired yet
    pub fn outstanding_fences(&self) -> Result<usize> {
        let objects = self.objects.as_ref().ok_or_else(destroyed_error)?;
        objects.frames.unsignaled_count()
    }

    /// Current chain extent in pixels
    pub fn extent(&self) -> Option<(u32, u32)> {
        let chain = self.objects.as_ref()?.chain.as_ref()?;
        let extent = chain.swapchain.extent();
        Some((extent.width, extent.height))
    }

    /// Registry index of the texture used by mesh `mesh` of `model` (0 = default)
    pub fn mesh_texture_index(&self, model: ModelKey, mesh: usize) -> Result<usize> {
        let mesh = self.mesh(model, mesh)?;
        self.registry
            .texture_index(mesh.texture())
            .ok_or_else(|| Error::StaleHandle("texture key no longer valid".to_string()))
    }

    /// Pixel size of the texture used by mesh `mesh` of `model`
    pub fn mesh_texture_size(&self, model: ModelKey, mesh: usize) -> Result<(u32, u32)> {
        let texture = self.registry.texture(self.mesh(model, mesh)?.texture())?;
        Ok((texture.width(), texture.height()))
    }

    /// Copy a mesh's vertex and index buffers back from the GPU
    pub fn read_back_mesh(&self, model: ModelKey, mesh: usize) -> Result<(Vec<Vertex>, Vec<u32>)> {
        let mesh = self.mesh(model, mesh)?;
        let vertex_bytes = read_buffer(&self.ctx, &mesh.vertex_buffer)?;
        let index_bytes = read_buffer(&self.ctx, &mesh.index_buffer)?;
        let vertices: Vec<Vertex> = bytemuck::pod_collect_to_vec(&vertex_bytes);
        let indices: Vec<u32> = bytemuck::pod_collect_to_vec(&index_bytes);
        if vertices.len() != mesh.vertex_count() as usize || indices.len() != mesh.index_count() as usize {
            return Err(engine_err!(
                "tandem::vulkan",
                "Read back {} vertices and {} indices, expected {} and {}",
                vertices.len(),
                indices.len(),
                mesh.vertex_count(),
                mesh.index_count()
            ));
        }
        Ok((vertices, indices))
    }

    fn mesh(&self, model: ModelKey, mesh: usize) -> Result<&Mesh> {
        self.registry
            .model(model)?
            .meshes()
            .get(mesh)
            .ok_or_else(|| Error::InvalidResource(format!("Model has no mesh {}", mesh)))
    }
}

fn destroyed_error() -> Error {
    Error::InvalidResource("Renderer destroyed".to_string())
}

/// Record the two-subpass frame into `command_buffer`.
/// Returns the number of indexed draws.
fn record_frame(
    device: &ash::Device,
    objects: &DeviceObjects,
    chain: &ChainResources,
    registry: &SceneRegistry<Mesh, Texture>,
    command_buffer: vk::CommandBuffer,
    image_index: usize,
    clear_color: [f32; 4],
) -> Result<u32> {
    let extent = chain.swapchain.extent();
    let geometry = &objects.pipelines.geometry;
    let composition = &objects.pipelines.composition;
    let uniform_set = objects.descriptors.uniform_set(image_index);
    let default_texture = registry.default_texture()?;
    let mut draw_calls = 0;

    unsafe {
        device
            .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
            .map_err(|e| engine_err!("tandem::vulkan", "Failed to reset command buffer: {:?}", e))?;
        device
            .begin_command_buffer(command_buffer, &vk::CommandBufferBeginInfo::default())
            .map_err(|e| engine_err!("tandem::vulkan", "Failed to begin command buffer: {:?}", e))?;

        let clear_values = [
            vk::ClearValue { color: vk::ClearColorValue { float32: clear_color } },
            vk::ClearValue { color: vk::ClearColorValue { float32: clear_color } },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(objects.render_pass.render_pass)
            .framebuffer(chain.targets[image_index].framebuffer)
            .render_area(render_area)
            .clear_values(&clear_values);
        device.cmd_begin_render_pass(command_buffer, &begin_info, vk::SubpassContents::INLINE);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        device.cmd_set_viewport(command_buffer, 0, &[viewport]);
        device.cmd_set_scissor(command_buffer, 0, &[render_area]);

        // Subpass 0: geometry
        device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, geometry.pipeline);
        for (_, model) in registry.models() {
            device.cmd_push_constants(
                command_buffer,
                geometry.layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::bytes_of(model.model_matrix()),
            );
            for mesh in model.meshes() {
                let texture = registry
                    .texture(mesh.texture())
                    .or_else(|_| registry.texture(default_texture))?;

                device.cmd_bind_vertex_buffers(command_buffer, 0, &[mesh.vertex_buffer.buffer], &[0]);
                device.cmd_bind_index_buffer(command_buffer, mesh.index_buffer.buffer, 0, vk::IndexType::UINT32);
                device.cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    geometry.layout,
                    0,
                    &[uniform_set, texture.descriptor_set],
                    &[],
                );
                device.cmd_draw_indexed(command_buffer, mesh.index_count(), 1, 0, 0, 0);
                draw_calls += 1;
            }
        }

        // Subpass 1: composition
        device.cmd_next_subpass(command_buffer, vk::SubpassContents::INLINE);
        device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, composition.pipeline);
        device.cmd_bind_descriptor_sets(
            command_buffer,
            vk::PipelineBindPoint::GRAPHICS,
            composition.layout,
            0,
            &[objects.descriptors.input_set(image_index)],
            &[],
        );
        device.cmd_draw(command_buffer, 3, 1, 0, 0);

        device.cmd_end_render_pass(command_buffer);
        device
            .end_command_buffer(command_buffer)
            .map_err(|e| engine_err!("tandem::vulkan", "Failed to end command buffer: {:?}", e))?;
    }
    Ok(draw_calls)
}

// ============================================================================
// Frame submission
// ============================================================================

/// The renderer's objects as seen by one run of the frame sequence
struct FrameSubmission<'a> {
    ctx: &'a Arc<GpuContext>,
    objects: &'a DeviceObjects,
    chain: &'a ChainResources,
    registry: &'a SceneRegistry<Mesh, Texture>,
    camera: &'a CameraConfig,
    clear_color: [f32; 4],
}

impl FrameBackend for FrameSubmission<'_> {
    fn wait_slot(&mut self, slot: usize) -> Result<()> {
        self.objects.frames.wait(slot)
    }

    fn acquire(&mut self, slot: usize) -> Result<(u32, bool)> {
        self.chain
            .swapchain
            .acquire(self.objects.frames.slot(slot).image_available)
    }

    fn submit(&mut self, slot: usize, image: u32) -> Result<u32> {
        let frame = self.objects.frames.slot(slot);
        let extent = self.chain.swapchain.extent();
        let ubo = UboViewProjection::from_camera(self.camera, extent.width, extent.height);
        self.chain.uniform_buffers[image as usize].write(0, bytemuck::bytes_of(&ubo))?;

        let draw_calls = record_frame(
            &self.ctx.device,
            self.objects,
            self.chain,
            self.registry,
            frame.command_buffer,
            image as usize,
            self.clear_color,
        )?;

        self.objects.frames.reset(slot)?;
        let wait_semaphores = [frame.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [frame.command_buffer];
        let signal_semaphores = [self.chain.swapchain.render_finished_semaphore(image)];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);
        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], frame.in_flight)
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to submit frame: {:?}", e))?;
        }
        Ok(draw_calls)
    }

    fn present(&mut self, image: u32) -> Result<bool> {
        self.chain.swapchain.present(image)
    }
}

impl Renderer for VulkanRenderer {
    fn draw(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(destroyed_error());
        }
        if self.resize_pending && !self.rebuild_chain()? {
            self.stats.frames_skipped += 1;
            return Ok(());
        }

        let objects = self.objects.as_ref().ok_or_else(destroyed_error)?;
        let chain = objects.chain.as_ref().ok_or_else(destroyed_error)?;
        let mut submission = FrameSubmission {
            ctx: &self.ctx,
            objects,
            chain,
            registry: &self.registry,
            camera: &self.camera,
            clear_color: self.config.clear_color,
        };

        match run_frame(&mut self.ring, &mut submission)? {
            FrameOutcome::OutOfDate => {
                engine_warn!("tandem::vulkan", "Chain out of date on acquire, rebuilding");
                self.stats.frames_skipped += 1;
                self.rebuild_chain()?;
            }
            FrameOutcome::Presented { draw_calls, stale, .. } => {
                self.stats.frames_drawn += 1;
                self.stats.draw_calls = draw_calls;
                if stale {
                    engine_debug!("tandem::vulkan", "Chain stale after present, rebuilding");
                    self.rebuild_chain()?;
                }
            }
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.framebuffer_size = (width, height);
        self.resize_pending = true;
    }

    fn load_scene(&mut self, scene: &SceneDescription) -> Result<ModelKey> {
        if self.destroyed {
            return Err(destroyed_error());
        }
        let objects = self.objects.as_mut().ok_or_else(destroyed_error)?;
        let descriptors = &mut objects.descriptors;
        let sampler = &objects.sampler;
        let ctx = &self.ctx;
        let texture_directory = &self.config.texture_directory;

        let key = ingest_scene(
            &mut self.registry,
            scene,
            |file_name| {
                let pixels = load_rgba8(&texture_directory.join(file_name))?;
                Texture::new(ctx, descriptors, sampler, &pixels, file_name)
            },
            |mesh, texture| Mesh::from_mesh_data(ctx, mesh, texture),
        )?;

        self.stats.models = self.registry.model_count() as u32;
        self.stats.textures = self.registry.texture_count() as u32;
        Ok(key)
    }

    fn set_model_matrix(&mut self, model: ModelKey, matrix: Mat4) -> Result<()> {
        self.registry.set_model_matrix(model, matrix)
    }

    fn remove_model(&mut self, model: ModelKey) -> Result<()> {
        // Frames in flight may still read the buffers
        self.wait_idle()?;
        self.registry.remove_model(model)?;
        self.stats.models = self.registry.model_count() as u32;
        Ok(())
    }

    fn set_camera(&mut self, camera: CameraConfig) {
        self.camera = camera;
    }

    fn wait_idle(&self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
        self.destroyed = true;

        // Meshes and textures, then every device object
        self.registry.clear();
        self.objects = None;

        unsafe {
            if let Ok(mut pool) = self.ctx.transfer_command_pool.lock() {
                self.ctx.device.destroy_command_pool(*pool, None);
                *pool = vk::CommandPool::null();
            }

            // Allocator memory goes back before the device is destroyed
            match Arc::get_mut(&mut self.ctx) {
                Some(ctx) => ManuallyDrop::drop(&mut ctx.allocator),
                None => engine_error!("tandem::vulkan", "GPU resources outlive the renderer, leaking allocator"),
            }

            self.ctx.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            #[cfg(feature = "vulkan-validation")]
            if let Some(messenger) = self.debug_messenger.take() {
                messenger.destroy();
            }
            self.instance.destroy_instance(None);
        }
        engine_info!("tandem::vulkan", "Renderer destroyed after {} frames", self.stats.frames_drawn);
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        self.destroy();
    }
}
