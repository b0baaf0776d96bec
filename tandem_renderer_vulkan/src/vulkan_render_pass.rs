/// RenderPass - the two-subpass geometry/composition pass
///
/// Attachments:
/// 0. presentable color, stored and left in PRESENT_SRC
/// 1. intermediate color, written by subpass 0 and read by subpass 1
/// 2. depth, written by subpass 0 and read by subpass 1
///
/// Subpass 1 reads attachments 1 and 2 as input attachments and writes the
/// presentable image with a full-screen triangle.

use ash::vk;
use tandem_engine::tandem::{Error, Result};
use tandem_engine::engine_error;

pub const ATTACHMENT_PRESENT: u32 = 0;
pub const ATTACHMENT_COLOR: u32 = 1;
pub const ATTACHMENT_DEPTH: u32 = 2;

pub const SUBPASS_GEOMETRY: u32 = 0;
pub const SUBPASS_COMPOSITION: u32 = 1;

/// Format of the intermediate color attachment
pub const INTERMEDIATE_COLOR_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

pub(crate) fn attachment_descriptions(
    present_format: vk::Format,
    depth_format: vk::Format,
) -> [vk::AttachmentDescription; 3] {
    let base = vk::AttachmentDescription::default()
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED);

    [
        base.format(present_format)
            .store_op(vk::AttachmentStoreOp::STORE)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
        base.format(INTERMEDIATE_COLOR_FORMAT)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .final_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
        base.format(depth_format)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
    ]
}

pub(crate) fn subpass_dependencies() -> [vk::SubpassDependency; 3] {
    [
        // Nothing touches the attachments before the pass starts
        vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(SUBPASS_GEOMETRY)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            )
            .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ),
        // Composition sees the geometry pass writes
        vk::SubpassDependency::default()
            .src_subpass(SUBPASS_GEOMETRY)
            .dst_subpass(SUBPASS_COMPOSITION)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            )
            .src_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
            .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
            .dst_access_mask(vk::AccessFlags::INPUT_ATTACHMENT_READ)
            .dependency_flags(vk::DependencyFlags::BY_REGION),
        // Drain before present
        vk::SubpassDependency::default()
            .src_subpass(SUBPASS_COMPOSITION)
            .dst_subpass(vk::SUBPASS_EXTERNAL)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .dst_stage_mask(vk::PipelineStageFlags::BOTTOM_OF_PIPE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ),
    ]
}

pub struct RenderPass {
    pub(crate) render_pass: vk::RenderPass,
    device: ash::Device,
}

impl RenderPass {
    pub fn new(device: &ash::Device, present_format: vk::Format, depth_format: vk::Format) -> Result<Self> {
        let attachments = attachment_descriptions(present_format, depth_format);

        let geometry_color = [vk::AttachmentReference {
            attachment: ATTACHMENT_COLOR,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let geometry_depth = vk::AttachmentReference {
            attachment: ATTACHMENT_DEPTH,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let composition_color = [vk::AttachmentReference {
            attachment: ATTACHMENT_PRESENT,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let composition_inputs = [
            vk::AttachmentReference {
                attachment: ATTACHMENT_COLOR,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
            vk::AttachmentReference {
                attachment: ATTACHMENT_DEPTH,
                layout: vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            },
        ];

        let subpasses = [
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&geometry_color)
                .depth_stencil_attachment(&geometry_depth),
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&composition_color)
                .input_attachments(&composition_inputs),
        ];
        let dependencies = subpass_dependencies();

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { device.create_render_pass(&create_info, None) }.map_err(|e| {
            engine_error!("tandem::vulkan", "Failed to create render pass: {:?}", e);
            Error::InitializationFailed(format!("Failed to create render pass: {:?}", e))
        })?;

        Ok(Self {
            render_pass,
            device: device.clone(),
        })
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_store_and_final_layouts() {
        let [present, color, depth] =
            attachment_descriptions(vk::Format::B8G8R8A8_UNORM, vk::Format::D32_SFLOAT);

        assert_eq!(present.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(present.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(present.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);

        assert_eq!(color.format, INTERMEDIATE_COLOR_FORMAT);
        assert_eq!(color.store_op, vk::AttachmentStoreOp::DONT_CARE);
        assert_eq!(color.final_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

        assert_eq!(depth.format, vk::Format::D32_SFLOAT);
        assert_eq!(depth.store_op, vk::AttachmentStoreOp::DONT_CARE);
        assert_eq!(depth.final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        for attachment in [present, color, depth] {
            assert_eq!(attachment.load_op, vk::AttachmentLoadOp::CLEAR);
            assert_eq!(attachment.initial_layout, vk::ImageLayout::UNDEFINED);
        }
    }

    #[test]
    fn test_dependency_chain() {
        let [enter, between, leave] = subpass_dependencies();

        assert_eq!((enter.src_subpass, enter.dst_subpass), (vk::SUBPASS_EXTERNAL, SUBPASS_GEOMETRY));
        assert_eq!((between.src_subpass, between.dst_subpass), (SUBPASS_GEOMETRY, SUBPASS_COMPOSITION));
        assert_eq!((leave.src_subpass, leave.dst_subpass), (SUBPASS_COMPOSITION, vk::SUBPASS_EXTERNAL));
    }

    #[test]
    fn test_composition_waits_for_geometry_writes() {
        let between = subpass_dependencies()[1];
        assert!(between.src_access_mask.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
        assert!(between.src_access_mask.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));
        assert!(between.dst_stage_mask.contains(vk::PipelineStageFlags::FRAGMENT_SHADER));
        assert!(between.dst_access_mask.contains(vk::AccessFlags::INPUT_ATTACHMENT_READ));
    }
}
