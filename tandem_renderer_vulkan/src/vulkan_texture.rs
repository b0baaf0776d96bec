/// Texture - a sampled image and its descriptor set in the sampler pool

use ash::vk;
use std::sync::Arc;
use tandem_engine::tandem::resource::ImageData;
use tandem_engine::tandem::Result;

use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor::DescriptorManager;
use crate::vulkan_image::Image;
use crate::vulkan_sampler::Sampler;
use crate::vulkan_transfer::upload_image;

pub struct Texture {
    pub(crate) image: Image,
    /// Owned by the sampler pool, released with it
    pub(crate) descriptor_set: vk::DescriptorSet,
}

impl Texture {
    pub fn new(
        ctx: &Arc<GpuContext>,
        descriptors: &mut DescriptorManager,
        sampler: &Sampler,
        data: &ImageData,
        name: &str,
    ) -> Result<Self> {
        let image = upload_image(ctx, data, name)?;
        let descriptor_set = descriptors.allocate_texture_set(image.view, sampler.sampler)?;
        Ok(Self { image, descriptor_set })
    }

    pub fn width(&self) -> u32 {
        self.image.extent.width
    }

    pub fn height(&self) -> u32 {
        self.image.extent.height
    }
}
