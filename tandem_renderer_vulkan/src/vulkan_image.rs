/// Image - a device-local 2D VkImage, its view and its allocation
///
/// Used for depth buffers, the intermediate color attachment and sampled
/// textures. Presentable images are owned by the swapchain, not by this type.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;

#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub aspect: vk::ImageAspectFlags,
}

pub struct Image {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    pub(crate) extent: vk::Extent2D,
}

/// View over the single mip level and layer of a 2D image
pub(crate) fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe { device.create_image_view(&create_info, None) }
        .map_err(|e| engine_err!("tandem::vulkan", "Failed to create image view: {:?}", e))
}

impl Image {
    pub fn new(ctx: Arc<GpuContext>, desc: ImageDesc, name: &str) -> Result<Self> {
        unsafe {
            let create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(desc.format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(desc.usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&create_info, None).map_err(|e| {
                engine_err!("tandem::vulkan", "Failed to create image '{}': {:?}", name, e)
            })?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx
                .allocator
                .lock()
                .map_err(|_| Error::BackendError("Allocator lock poisoned".to_string()))
                .and_then(|mut allocator| {
                    allocator
                        .allocate(&AllocationCreateDesc {
                            name,
                            requirements,
                            location: MemoryLocation::GpuOnly,
                            linear: false,
                            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                        })
                        .map_err(|_| {
                            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                            engine_error!(
                                "tandem::vulkan",
                                "Out of GPU memory for image '{}' ({}x{}, {:.2} MB)",
                                name, desc.width, desc.height, size_mb
                            );
                            Error::OutOfMemory
                        })
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            let mut result = Self {
                ctx,
                image,
                view: vk::ImageView::null(),
                allocation: Some(allocation),
                extent: vk::Extent2D { width: desc.width, height: desc.height },
            };

            if let Some(allocation) = &result.allocation {
                result
                    .ctx
                    .device
                    .bind_image_memory(image, allocation.memory(), allocation.offset())
                    .map_err(|e| engine_err!("tandem::vulkan", "Failed to bind image memory: {:?}", e))?;
            }
            result.view = create_image_view(&result.ctx.device, image, desc.format, desc.aspect)?;
            Ok(result)
        }
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
