/// Swapchain - the presentable image chain
///
/// Owns the VkSwapchainKHR, one view per presentable image and one
/// "render finished" semaphore per image. The whole object is dropped and
/// rebuilt when the surface changes; the surface itself outlives it.
///
/// The choice functions at the top are pure so the selection policy can be
/// tested without a GPU.

use ash::vk;
use std::sync::Arc;
use tandem_engine::tandem::frame::ChainLimits;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_debug, engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_image::create_image_view;

// ============================================================================
// Selection policy
// ============================================================================

/// Preferred presentable format: 8-bit RGBA or BGRA with the sRGB non-linear
/// color space. A surface reporting a single UNDEFINED entry accepts
/// anything, so RGBA is used. Otherwise the first reported format is taken.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    let preferred = vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    if formats.len() == 1 && formats[0].format == vk::Format::UNDEFINED {
        return Some(preferred);
    }

    formats
        .iter()
        .find(|f| {
            (f.format == vk::Format::R8G8B8A8_UNORM || f.format == vk::Format::B8G8R8A8_UNORM)
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// MAILBOX when offered, otherwise FIFO (always available)
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's current extent, unless the surface lets the application
/// decide (width == u32::MAX): then the framebuffer size clamped to the
/// surface bounds.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, framebuffer: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: framebuffer.0.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: framebuffer.1.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

pub fn chain_limits(capabilities: &vk::SurfaceCapabilitiesKHR) -> ChainLimits {
    ChainLimits {
        min_image_count: capabilities.min_image_count,
        max_image_count: capabilities.max_image_count,
    }
}

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D32_SFLOAT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// First candidate usable as an optimal-tiling depth/stencil attachment
pub fn choose_depth_format(supports_depth_attachment: impl Fn(vk::Format) -> bool) -> Option<vk::Format> {
    DEPTH_FORMAT_CANDIDATES
        .iter()
        .copied()
        .find(|&format| supports_depth_attachment(format))
}

/// Query the device for a depth attachment format
pub(crate) fn find_depth_format(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Result<vk::Format> {
    choose_depth_format(|format| unsafe {
        instance
            .get_physical_device_format_properties(physical_device, format)
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    })
    .ok_or_else(|| {
        engine_error!("tandem::vulkan", "No supported depth attachment format");
        Error::InitializationFailed("No supported depth attachment format".to_string())
    })
}

// ============================================================================
// Swapchain
// ============================================================================

pub struct Swapchain {
    ctx: Arc<GpuContext>,
    loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
    /// Signaled by the submission rendering into image i, waited on by its present
    render_finished: Vec<vk::Semaphore>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Build a chain for `surface` sized from `framebuffer` when the surface
    /// does not dictate its extent
    pub fn new(
        ctx: Arc<GpuContext>,
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        framebuffer: (u32, u32),
    ) -> Result<Self> {
        unsafe {
            let physical_device = ctx.physical_device;
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(|e| {
                    engine_error!("tandem::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;
            let formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| {
                    engine_error!("tandem::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;
            let present_modes = surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .map_err(|e| {
                    engine_error!("tandem::vulkan", "Failed to query present modes: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get present modes: {:?}", e))
                })?;

            let surface_format = choose_surface_format(&formats).ok_or_else(|| {
                Error::InitializationFailed("Surface reports no formats".to_string())
            })?;
            let present_mode = choose_present_mode(&present_modes);
            let extent = choose_extent(&capabilities, framebuffer);
            let image_count = chain_limits(&capabilities).image_count();

            let queue_families = ctx.queue_families();
            let mut create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true);
            create_info = if queue_families.len() > 1 {
                create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&queue_families)
            } else {
                create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            };

            let loader = ash::khr::swapchain::Device::new(instance, &ctx.device);
            let swapchain = loader.create_swapchain(&create_info, None).map_err(|e| {
                engine_error!("tandem::vulkan", "Failed to create swapchain: {:?}", e);
                Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
            })?;

            // Drop destroys whatever was created if a later step fails
            let mut chain = Self {
                ctx,
                loader,
                swapchain,
                images: Vec::new(),
                views: Vec::new(),
                render_finished: Vec::new(),
                format: surface_format.format,
                extent,
            };

            chain.images = chain.loader.get_swapchain_images(swapchain).map_err(|e| {
                engine_error!("tandem::vulkan", "Failed to get swapchain images: {:?}", e);
                Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
            })?;

            for &image in &chain.images {
                let view = create_image_view(
                    &chain.ctx.device,
                    image,
                    surface_format.format,
                    vk::ImageAspectFlags::COLOR,
                )?;
                chain.views.push(view);

                let semaphore = chain
                    .ctx
                    .device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .map_err(|e| engine_err!("tandem::vulkan", "Failed to create semaphore: {:?}", e))?;
                chain.render_finished.push(semaphore);
            }

            engine_debug!(
                "tandem::vulkan",
                "Swapchain {}x{} {:?} {:?}, {} images (requested {})",
                extent.width,
                extent.height,
                surface_format.format,
                present_mode,
                chain.images.len(),
                image_count
            );
            Ok(chain)
        }
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn views(&self) -> &[vk::ImageView] {
        &self.views
    }

    pub fn render_finished_semaphore(&self, image_index: u32) -> vk::Semaphore {
        self.render_finished[image_index as usize]
    }

    /// Acquire the next presentable image, signaling `image_available`.
    ///
    /// Returns the image index and whether the chain is suboptimal. An
    /// out-of-date chain is reported as `Error::SwapchainOutOfDate`.
    pub fn acquire(&self, image_available: vk::Semaphore) -> Result<(u32, bool)> {
        unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, image_available, vk::Fence::null())
                .map_err(|e| match e {
                    vk::Result::ERROR_OUT_OF_DATE_KHR => Error::SwapchainOutOfDate,
                    _ => engine_err!("tandem::vulkan", "Failed to acquire swapchain image: {:?}", e),
                })
        }
    }

    /// Queue image `image_index` for presentation once its render-finished
    /// semaphore is signaled. Returns true when the chain is suboptimal.
    pub fn present(&self, image_index: u32) -> Result<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [self.render_finished[image_index as usize]];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self.loader.queue_present(self.ctx.present_queue, &present_info) {
                Ok(suboptimal) => Ok(suboptimal),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SwapchainOutOfDate),
                Err(e) => Err(engine_err!("tandem::vulkan", "Failed to present: {:?}", e)),
            }
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &semaphore in &self.render_finished {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
            for &view in &self.views {
                self.ctx.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
