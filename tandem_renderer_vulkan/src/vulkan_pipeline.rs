/// Pipelines - the geometry and composition graphics pipelines
///
/// Both use dynamic viewport and scissor, so they survive chain rebuilds:
/// only the render pass formats, which do not change on resize, are baked in.

use ash::vk;
use std::path::Path;
use tandem_engine::tandem::resource::{Vertex, MODEL_PUSH_CONSTANT_SIZE};
use tandem_engine::tandem::{Error, Result};
use tandem_engine::{engine_debug, engine_error};

use crate::vulkan_descriptor::DescriptorManager;
use crate::vulkan_render_pass::{RenderPass, SUBPASS_COMPOSITION, SUBPASS_GEOMETRY};
use crate::vulkan_shader::{
    ShaderModule, COMPOSITION_FRAGMENT_SHADER, COMPOSITION_VERTEX_SHADER, GEOMETRY_FRAGMENT_SHADER,
    GEOMETRY_VERTEX_SHADER,
};

/// Vulkan format of a float vertex attribute with `components` components
pub(crate) fn attribute_format(components: u32) -> vk::Format {
    match components {
        1 => vk::Format::R32_SFLOAT,
        2 => vk::Format::R32G32_SFLOAT,
        3 => vk::Format::R32G32B32_SFLOAT,
        _ => vk::Format::R32G32B32A32_SFLOAT,
    }
}

pub(crate) fn vertex_attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
    Vertex::attributes()
        .iter()
        .map(|attribute| vk::VertexInputAttributeDescription {
            location: attribute.location,
            binding: 0,
            format: attribute_format(attribute.components),
            offset: attribute.offset,
        })
        .collect()
}

pub struct Pipeline {
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
    device: ash::Device,
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                self.device.destroy_pipeline(self.pipeline, None);
            }
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Fixed-function state that differs between the two pipelines
struct PipelineVariant<'a> {
    name: &'a str,
    subpass: u32,
    vertex_shader: &'a str,
    fragment_shader: &'a str,
    with_vertex_input: bool,
    depth_write: bool,
    cull_mode: vk::CullModeFlags,
}

fn create_layout(
    device: &ash::Device,
    set_layouts: &[vk::DescriptorSetLayout],
    push_constants: &[vk::PushConstantRange],
    name: &str,
) -> Result<Pipeline> {
    let create_info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(set_layouts)
        .push_constant_ranges(push_constants);
    let layout = unsafe { device.create_pipeline_layout(&create_info, None) }.map_err(|e| {
        engine_error!("tandem::vulkan", "Failed to create {} pipeline layout: {:?}", name, e);
        Error::InitializationFailed(format!("Failed to create {} pipeline layout: {:?}", name, e))
    })?;
    Ok(Pipeline {
        pipeline: vk::Pipeline::null(),
        layout,
        device: device.clone(),
    })
}

fn build_pipeline(
    device: &ash::Device,
    render_pass: &RenderPass,
    shader_directory: &Path,
    variant: &PipelineVariant,
    mut pipeline: Pipeline,
) -> Result<Pipeline> {
    let vertex = ShaderModule::load(device, &shader_directory.join(variant.vertex_shader))?;
    let fragment = ShaderModule::load(device, &shader_directory.join(variant.fragment_shader))?;

    let stages = [
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex.module)
            .name(c"main"),
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fragment.module)
            .name(c"main"),
    ];

    let bindings = [vk::VertexInputBindingDescription {
        binding: 0,
        stride: Vertex::stride(),
        input_rate: vk::VertexInputRate::VERTEX,
    }];
    let attributes = vertex_attribute_descriptions();
    let vertex_input = if variant.with_vertex_input {
        vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes)
    } else {
        vk::PipelineVertexInputStateCreateInfo::default()
    };

    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);

    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1);

    let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(variant.cull_mode)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE);

    let multisample = vk::PipelineMultisampleStateCreateInfo::default()
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(variant.depth_write)
        .depth_write_enable(variant.depth_write)
        .depth_compare_op(vk::CompareOp::LESS)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .blend_enable(false)];
    let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(false)
        .attachments(&blend_attachments);

    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

    let create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&stages)
        .vertex_input_state(&vertex_input)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization)
        .multisample_state(&multisample)
        .depth_stencil_state(&depth_stencil)
        .color_blend_state(&color_blend)
        .dynamic_state(&dynamic_state)
        .layout(pipeline.layout)
        .render_pass(render_pass.render_pass)
        .subpass(variant.subpass);

    let pipelines = unsafe {
        device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
    }
    .map_err(|(_, e)| {
        engine_error!("tandem::vulkan", "Failed to create {} pipeline: {:?}", variant.name, e);
        Error::InitializationFailed(format!("Failed to create {} pipeline: {:?}", variant.name, e))
    })?;

    pipeline.pipeline = pipelines[0];
    engine_debug!("tandem::vulkan", "Created {} pipeline (subpass {})", variant.name, variant.subpass);
    Ok(pipeline)
}

pub struct Pipelines {
    pub(crate) geometry: Pipeline,
    pub(crate) composition: Pipeline,
}

impl Pipelines {
    pub fn new(
        device: &ash::Device,
        render_pass: &RenderPass,
        descriptors: &DescriptorManager,
        shader_directory: &Path,
    ) -> Result<Self> {
        let model_matrix = [vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX,
            offset: 0,
            size: MODEL_PUSH_CONSTANT_SIZE,
        }];
        let geometry_layout = create_layout(
            device,
            &[descriptors.uniform_layout, descriptors.sampler_layout],
            &model_matrix,
            "geometry",
        )?;
        let geometry = build_pipeline(
            device,
            render_pass,
            shader_directory,
            &PipelineVariant {
                name: "geometry",
                subpass: SUBPASS_GEOMETRY,
                vertex_shader: GEOMETRY_VERTEX_SHADER,
                fragment_shader: GEOMETRY_FRAGMENT_SHADER,
                with_vertex_input: true,
                depth_write: true,
                cull_mode: vk::CullModeFlags::BACK,
            },
            geometry_layout,
        )?;

        let composition_layout = create_layout(device, &[descriptors.input_layout], &[], "composition")?;
        let composition = build_pipeline(
            device,
            render_pass,
            shader_directory,
            &PipelineVariant {
                name: "composition",
                subpass: SUBPASS_COMPOSITION,
                vertex_shader: COMPOSITION_VERTEX_SHADER,
                fragment_shader: COMPOSITION_FRAGMENT_SHADER,
                with_vertex_input: false,
                depth_write: false,
                // The full-screen triangle's winding is irrelevant
                cull_mode: vk::CullModeFlags::NONE,
            },
            composition_layout,
        )?;

        Ok(Self { geometry, composition })
    }
}
