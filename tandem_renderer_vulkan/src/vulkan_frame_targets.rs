/// FrameTarget - per-presentable-image attachments and framebuffer
///
/// Each presentable image gets its own intermediate color and depth images so
/// two frames in flight never share an attachment. Rebuilt with the chain.

use ash::vk;
use std::sync::Arc;
use tandem_engine::tandem::Result;
use tandem_engine::engine_err;

use crate::vulkan_context::GpuContext;
use crate::vulkan_image::{Image, ImageDesc};
use crate::vulkan_render_pass::{RenderPass, INTERMEDIATE_COLOR_FORMAT};

pub struct FrameTarget {
    pub(crate) framebuffer: vk::Framebuffer,
    pub(crate) color: Image,
    pub(crate) depth: Image,
    device: ash::Device,
}

impl FrameTarget {
    pub fn new(
        ctx: &Arc<GpuContext>,
        render_pass: &RenderPass,
        present_view: vk::ImageView,
        extent: vk::Extent2D,
        depth_format: vk::Format,
        index: usize,
    ) -> Result<Self> {
        let color = Image::new(
            Arc::clone(ctx),
            ImageDesc {
                width: extent.width,
                height: extent.height,
                format: INTERMEDIATE_COLOR_FORMAT,
                usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::INPUT_ATTACHMENT,
                aspect: vk::ImageAspectFlags::COLOR,
            },
            &format!("intermediate color {}", index),
        )?;
        let depth = Image::new(
            Arc::clone(ctx),
            ImageDesc {
                width: extent.width,
                height: extent.height,
                format: depth_format,
                usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::INPUT_ATTACHMENT,
                // Stencil is never read
                aspect: vk::ImageAspectFlags::DEPTH,
            },
            &format!("depth {}", index),
        )?;

        // Order matches the render pass attachment indices
        let attachments = [present_view, color.view, depth.view];
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { ctx.device.create_framebuffer(&create_info, None) }
            .map_err(|e| engine_err!("tandem::vulkan", "Failed to create framebuffer {}: {:?}", index, e))?;

        Ok(Self {
            framebuffer,
            color,
            depth,
            device: ctx.device.clone(),
        })
    }
}

impl Drop for FrameTarget {
    fn drop(&mut self) {
        // Framebuffer goes first; the images drop after this body
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
