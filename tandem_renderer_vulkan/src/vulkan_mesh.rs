/// Mesh - device-local vertex and index buffers of one loaded mesh

use ash::vk;
use std::sync::Arc;
use tandem_engine::tandem::resource::Vertex;
use tandem_engine::tandem::scene::{MeshData, TextureKey};
use tandem_engine::tandem::{Error, Result};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_transfer::upload_buffer;

pub struct Mesh {
    pub(crate) vertex_buffer: Buffer,
    pub(crate) index_buffer: Buffer,
    vertex_count: u32,
    index_count: u32,
    texture: TextureKey,
}

impl Mesh {
    /// Upload `vertices` and `indices` through staging buffers
    pub fn new(
        ctx: &Arc<GpuContext>,
        vertices: &[Vertex],
        indices: &[u32],
        texture: TextureKey,
    ) -> Result<Self> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(Error::LoadFailed("Mesh has no vertices or no indices".to_string()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::LoadFailed(format!(
                "Index {} out of range ({} vertices)",
                bad,
                vertices.len()
            )));
        }

        let vertex_buffer = upload_buffer(
            ctx,
            bytemuck::cast_slice(vertices),
            vk::BufferUsageFlags::VERTEX_BUFFER,
            "vertex buffer",
        )?;
        let index_buffer = upload_buffer(
            ctx,
            bytemuck::cast_slice(indices),
            vk::BufferUsageFlags::INDEX_BUFFER,
            "index buffer",
        )?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
            texture,
        })
    }

    /// Upload a mesh record from a scene description
    pub fn from_mesh_data(ctx: &Arc<GpuContext>, data: &MeshData, texture: TextureKey) -> Result<Self> {
        Self::new(ctx, &data.vertices(), &data.indices, texture)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn texture(&self) -> TextureKey {
        self.texture
    }
}
