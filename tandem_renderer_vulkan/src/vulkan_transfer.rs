/// Staging transfers between host memory and device-local resources
///
/// Every transfer records one command buffer from the shared transfer pool,
/// submits it on the graphics queue and waits for the queue to go idle, so
/// the staging buffer can be released as soon as the call returns.

use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;
use tandem_engine::tandem::resource::ImageData;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_err, engine_trace};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_image::{Image, ImageDesc};

/// Format of every sampled texture
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

/// Record commands into a temporary command buffer, submit them and block
/// until the graphics queue is idle
pub(crate) fn submit_one_shot(ctx: &GpuContext, record: impl FnOnce(vk::CommandBuffer)) -> Result<()> {
    let pool = ctx
        .transfer_command_pool
        .lock()
        .map_err(|_| Error::BackendError("Transfer command pool lock poisoned".to_string()))?;

    unsafe {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(*pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = ctx
            .device
            .allocate_command_buffers(&allocate_info)
            .map_err(|e| engine_err!("tandem::vulkan", "Failed to allocate transfer command buffer: {:?}", e))?[0];

        let result = (|| {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            ctx.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to begin transfer commands: {:?}", e))?;

            record(command_buffer);

            ctx.device
                .end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to end transfer commands: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            ctx.device
                .queue_submit(ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to submit transfer: {:?}", e))?;
            ctx.device
                .queue_wait_idle(ctx.graphics_queue)
                .map_err(|e| engine_err!("tandem::vulkan", "Failed to wait for transfer: {:?}", e))
        })();

        ctx.device.free_command_buffers(*pool, &[command_buffer]);
        result
    }
}

fn staging_buffer(ctx: &Arc<GpuContext>, data: &[u8]) -> Result<Buffer> {
    let staging = Buffer::new(
        Arc::clone(ctx),
        data.len() as u64,
        vk::BufferUsageFlags::TRANSFER_SRC,
        MemoryLocation::CpuToGpu,
        "staging",
    )?;
    staging.write(0, data)?;
    Ok(staging)
}

/// Copy `data` into a new device-local buffer with `usage`.
///
/// The destination also gets TRANSFER_SRC so its content can be read back.
pub fn upload_buffer(
    ctx: &Arc<GpuContext>,
    data: &[u8],
    usage: vk::BufferUsageFlags,
    name: &str,
) -> Result<Buffer> {
    if data.is_empty() {
        return Err(Error::InvalidResource(format!("Buffer '{}' has no data", name)));
    }
    let staging = staging_buffer(ctx, data)?;
    let destination = Buffer::new(
        Arc::clone(ctx),
        data.len() as u64,
        usage | vk::BufferUsageFlags::TRANSFER_DST | vk::BufferUsageFlags::TRANSFER_SRC,
        MemoryLocation::GpuOnly,
        name,
    )?;

    submit_one_shot(ctx, |cmd| unsafe {
        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: data.len() as u64,
        };
        ctx.device.cmd_copy_buffer(cmd, staging.buffer, destination.buffer, &[region]);
    })?;

    engine_trace!("tandem::vulkan", "Uploaded {} bytes to '{}'", data.len(), name);
    Ok(destination)
}

/// Copy a device buffer back to host memory
pub fn read_buffer(ctx: &Arc<GpuContext>, source: &Buffer) -> Result<Vec<u8>> {
    let readback = Buffer::new(
        Arc::clone(ctx),
        source.size(),
        vk::BufferUsageFlags::TRANSFER_DST,
        MemoryLocation::GpuToCpu,
        "readback",
    )?;

    submit_one_shot(ctx, |cmd| unsafe {
        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: source.size(),
        };
        ctx.device.cmd_copy_buffer(cmd, source.buffer, readback.buffer, &[region]);
    })?;

    readback.read()
}

fn color_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// Upload RGBA8 pixels into a new sampled image left in
/// SHADER_READ_ONLY_OPTIMAL
pub fn upload_image(ctx: &Arc<GpuContext>, data: &ImageData, name: &str) -> Result<Image> {
    let staging = staging_buffer(ctx, data.pixels())?;
    let image = Image::new(
        Arc::clone(ctx),
        ImageDesc {
            width: data.width(),
            height: data.height(),
            format: TEXTURE_FORMAT,
            usage: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
            aspect: vk::ImageAspectFlags::COLOR,
        },
        name,
    )?;

    submit_one_shot(ctx, |cmd| unsafe {
        let to_transfer = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image.image)
            .subresource_range(color_range())
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
        ctx.device.cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_transfer],
        );

        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D {
                width: data.width(),
                height: data.height(),
                depth: 1,
            },
        };
        ctx.device.cmd_copy_buffer_to_image(
            cmd,
            staging.buffer,
            image.image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );

        let to_shader = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image.image)
            .subresource_range(color_range())
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);
        ctx.device.cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_shader],
        );
    })?;

    engine_trace!(
        "tandem::vulkan",
        "Uploaded texture '{}' ({}x{})",
        name,
        data.width(),
        data.height()
    );
    Ok(image)
}
