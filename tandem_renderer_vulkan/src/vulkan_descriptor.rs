/// DescriptorManager - set layouts, pools and sets of the three families
///
/// | family           | set layout                      | pool capacity      | lifetime        |
/// |------------------|---------------------------------|--------------------|-----------------|
/// | uniform          | binding 0: uniform buffer (VS)  | image count        | chain           |
/// | sampler          | binding 0: combined sampler (FS)| max textures       | texture         |
/// | input attachment | bindings 0, 1: input att. (FS)  | 2 x image count    | chain           |
///
/// Layouts never change. The two per-image pools are destroyed and rebuilt
/// with the chain, so their set count always equals the image count.

use ash::vk;
use tandem_engine::tandem::resource::UboViewProjection;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_err, engine_error};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_frame_targets::FrameTarget;

/// Descriptor counts for each pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolCapacities {
    pub uniform_buffers: u32,
    pub samplers: u32,
    pub input_attachments: u32,
}

impl PoolCapacities {
    pub fn new(image_count: usize, max_textures: usize) -> Self {
        Self {
            uniform_buffers: image_count as u32,
            samplers: max_textures as u32,
            input_attachments: 2 * image_count as u32,
        }
    }
}

fn create_layout(
    device: &ash::Device,
    bindings: &[vk::DescriptorSetLayoutBinding],
    name: &str,
) -> Result<vk::DescriptorSetLayout> {
    let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);
    unsafe { device.create_descriptor_set_layout(&create_info, None) }.map_err(|e| {
        engine_error!("tandem::vulkan", "Failed to create {} set layout: {:?}", name, e);
        Error::InitializationFailed(format!("Failed to create {} set layout: {:?}", name, e))
    })
}

fn create_pool(
    device: &ash::Device,
    ty: vk::DescriptorType,
    descriptor_count: u32,
    max_sets: u32,
) -> Result<vk::DescriptorPool> {
    let pool_sizes = [vk::DescriptorPoolSize {
        ty,
        descriptor_count: descriptor_count.max(1),
    }];
    let create_info = vk::DescriptorPoolCreateInfo::default()
        .pool_sizes(&pool_sizes)
        .max_sets(max_sets.max(1));
    unsafe { device.create_descriptor_pool(&create_info, None) }.map_err(|e| {
        engine_error!("tandem::vulkan", "Failed to create {:?} descriptor pool: {:?}", ty, e);
        Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e))
    })
}

fn allocate_sets(
    device: &ash::Device,
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
    count: usize,
) -> Result<Vec<vk::DescriptorSet>> {
    let layouts = vec![layout; count];
    let allocate_info = vk::DescriptorSetAllocateInfo::default()
        .descriptor_pool(pool)
        .set_layouts(&layouts);
    unsafe { device.allocate_descriptor_sets(&allocate_info) }
        .map_err(|e| engine_err!("tandem::vulkan", "Failed to allocate descriptor sets: {:?}", e))
}

pub struct DescriptorManager {
    device: ash::Device,
    pub(crate) uniform_layout: vk::DescriptorSetLayout,
    pub(crate) sampler_layout: vk::DescriptorSetLayout,
    pub(crate) input_layout: vk::DescriptorSetLayout,
    sampler_pool: vk::DescriptorPool,
    max_textures: usize,
    texture_sets: usize,
    uniform_pool: vk::DescriptorPool,
    input_pool: vk::DescriptorPool,
    uniform_sets: Vec<vk::DescriptorSet>,
    input_sets: Vec<vk::DescriptorSet>,
}

impl DescriptorManager {
    /// Create the three layouts and the sampler pool
    pub fn new(device: &ash::Device, max_textures: usize) -> Result<Self> {
        // Drop releases whatever was created if a later step fails
        let mut manager = Self {
            device: device.clone(),
            uniform_layout: vk::DescriptorSetLayout::null(),
            sampler_layout: vk::DescriptorSetLayout::null(),
            input_layout: vk::DescriptorSetLayout::null(),
            sampler_pool: vk::DescriptorPool::null(),
            max_textures,
            texture_sets: 0,
            uniform_pool: vk::DescriptorPool::null(),
            input_pool: vk::DescriptorPool::null(),
            uniform_sets: Vec::new(),
            input_sets: Vec::new(),
        };

        manager.uniform_layout = create_layout(
            device,
            &[vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX)],
            "uniform",
        )?;
        manager.sampler_layout = create_layout(
            device,
            &[vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)],
            "sampler",
        )?;
        manager.input_layout = create_layout(
            device,
            &[
                vk::DescriptorSetLayoutBinding::default()
                    .binding(0)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(1)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
            ],
            "input attachment",
        )?;

        let capacities = PoolCapacities::new(0, max_textures);
        manager.sampler_pool = create_pool(
            device,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            capacities.samplers,
            capacities.samplers,
        )?;

        Ok(manager)
    }

    // ===== PER-IMAGE FAMILIES =====

    /// Rebuild the uniform and input-attachment pools for the current chain
    /// and write one set of each per presentable image
    pub fn build_per_image(&mut self, uniform_buffers: &[Buffer], targets: &[FrameTarget]) -> Result<()> {
        if uniform_buffers.len() != targets.len() {
            return Err(Error::InvalidResource(format!(
                "{} uniform buffers for {} frame targets",
                uniform_buffers.len(),
                targets.len()
            )));
        }
        self.release_per_image();

        let image_count = targets.len();
        let capacities = PoolCapacities::new(image_count, self.max_textures);
        self.uniform_pool = create_pool(
            &self.device,
            vk::DescriptorType::UNIFORM_BUFFER,
            capacities.uniform_buffers,
            image_count as u32,
        )?;
        self.input_pool = create_pool(
            &self.device,
            vk::DescriptorType::INPUT_ATTACHMENT,
            capacities.input_attachments,
            image_count as u32,
        )?;

        self.uniform_sets = allocate_sets(&self.device, self.uniform_pool, self.uniform_layout, image_count)?;
        self.input_sets = allocate_sets(&self.device, self.input_pool, self.input_layout, image_count)?;

        for (i, (buffer, target)) in uniform_buffers.iter().zip(targets).enumerate() {
            let buffer_info = [vk::DescriptorBufferInfo {
                buffer: buffer.buffer,
                offset: 0,
                range: std::mem::size_of::<UboViewProjection>() as u64,
            }];
            let color_info = [vk::DescriptorImageInfo {
                sampler: vk::Sampler::null(),
                image_view: target.color.view,
                image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            }];
            let depth_info = [vk::DescriptorImageInfo {
                sampler: vk::Sampler::null(),
                image_view: target.depth.view,
                image_layout: vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            }];

            let writes = [
                vk::WriteDescriptorSet::default()
                    .dst_set(self.uniform_sets[i])
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_info),
                vk::WriteDescriptorSet::default()
                    .dst_set(self.input_sets[i])
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .image_info(&color_info),
                vk::WriteDescriptorSet::default()
                    .dst_set(self.input_sets[i])
                    .dst_binding(1)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .image_info(&depth_info),
            ];
            unsafe {
                self.device.update_descriptor_sets(&writes, &[]);
            }
        }
        Ok(())
    }

    /// Destroy the per-image pools (their sets go with them)
    pub fn release_per_image(&mut self) {
        unsafe {
            if self.uniform_pool != vk::DescriptorPool::null() {
                self.device.destroy_descriptor_pool(self.uniform_pool, None);
                self.uniform_pool = vk::DescriptorPool::null();
            }
            if self.input_pool != vk::DescriptorPool::null() {
                self.device.destroy_descriptor_pool(self.input_pool, None);
                self.input_pool = vk::DescriptorPool::null();
            }
        }
        self.uniform_sets.clear();
        self.input_sets.clear();
    }

    pub fn uniform_set(&self, image_index: usize) -> vk::DescriptorSet {
        self.uniform_sets[image_index]
    }

    pub fn input_set(&self, image_index: usize) -> vk::DescriptorSet {
        self.input_sets[image_index]
    }

    /// (uniform sets, input-attachment sets)
    pub fn per_image_counts(&self) -> (usize, usize) {
        (self.uniform_sets.len(), self.input_sets.len())
    }

    // ===== SAMPLER FAMILY =====

    /// Allocate and write the sampler set of a new texture. Sets live until
    /// the manager is dropped.
    pub fn allocate_texture_set(&mut self, view: vk::ImageView, sampler: vk::Sampler) -> Result<vk::DescriptorSet> {
        if self.texture_sets >= self.max_textures {
            return Err(Error::InvalidResource(format!(
                "Sampler descriptor pool exhausted ({} sets)",
                self.max_textures
            )));
        }
        let set = allocate_sets(&self.device, self.sampler_pool, self.sampler_layout, 1)?[0];

        let image_info = [vk::DescriptorImageInfo {
            sampler,
            image_view: view,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_info);
        unsafe {
            self.device.update_descriptor_sets(&[write], &[]);
        }
        self.texture_sets += 1;
        Ok(set)
    }
}

impl Drop for DescriptorManager {
    fn drop(&mut self) {
        self.release_per_image();
        unsafe {
            if self.sampler_pool != vk::DescriptorPool::null() {
                self.device.destroy_descriptor_pool(self.sampler_pool, None);
            }
            for layout in [self.uniform_layout, self.sampler_layout, self.input_layout] {
                if layout != vk::DescriptorSetLayout::null() {
                    self.device.destroy_descriptor_set_layout(layout, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_capacities_follow_image_count() {
        let three = PoolCapacities::new(3, 20);
        assert_eq!(three.uniform_buffers, 3);
        assert_eq!(three.samplers, 20);
        assert_eq!(three.input_attachments, 6);

        let two = PoolCapacities::new(2, 20);
        assert_eq!(two.input_attachments, 4);
        assert_eq!(two.samplers, three.samplers);
    }
}
