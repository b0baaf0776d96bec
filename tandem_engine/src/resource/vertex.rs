/// Vertex layout consumed by the geometry pass.
///
/// `#[repr(C)]` + `Pod` so that a `&[Vertex]` can be handed to the transfer
/// engine as raw bytes. Attribute offsets are exposed for pipeline creation.

use bytemuck::{Pod, Zeroable};
use std::mem::{offset_of, size_of};

/// One vertex: position, color, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// Vertex attribute description (backend agnostic)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of f32 components
    pub components: u32,
    /// Byte offset inside [`Vertex`]
    pub offset: u32,
}

impl Vertex {
    /// Vertex colors default to white (shaders modulate the texture by it)
    pub const DEFAULT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

    pub fn new(position: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            color: Self::DEFAULT_COLOR,
            tex_coord,
        }
    }

    /// Distance in bytes between two consecutive vertices
    pub const fn stride() -> u32 {
        size_of::<Vertex>() as u32
    }

    /// Attributes at locations 0 (position), 1 (color), 2 (tex_coord)
    pub fn attributes() -> [VertexAttribute; 3] {
        [
            VertexAttribute { location: 0, components: 3, offset: offset_of!(Vertex, position) as u32 },
            VertexAttribute { location: 1, components: 3, offset: offset_of!(Vertex, color) as u32 },
            VertexAttribute { location: 2, components: 2, offset: offset_of!(Vertex, tex_coord) as u32 },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(Vertex::stride(), 32);
        let offsets: Vec<u32> = Vertex::attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }

    #[test]
    fn test_new_uses_white() {
        let v = Vertex::new([1.0, 2.0, 3.0], [0.5, 0.25]);
        assert_eq!(v.color, Vertex::DEFAULT_COLOR);
        assert_eq!(bytemuck::bytes_of(&v).len(), 32);
    }
}
