/// Wavefront OBJ loading into a [`SceneDescription`].
///
/// OBJ has no node hierarchy: the root node carries no meshes and each OBJ
/// object/group becomes one child node holding its single mesh.

use std::path::Path;
use crate::error::{Error, Result};
use crate::engine_warn;
use super::import::{MaterialDesc, MeshData, SceneDescription, SceneNode};

/// Load an OBJ file (and its MTL library, if any)
///
/// Faces are triangulated and positions/UVs are re-indexed to a single index
/// buffer. V texture coordinates are flipped to Vulkan's top-left origin.
pub fn load_obj_scene(path: &Path) -> Result<SceneDescription> {
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
        .map_err(|e| Error::LoadFailed(format!("{}: {}", path.display(), e)))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            engine_warn!(
                "tandem::scene",
                "{}: material library unavailable ({}), using default texture",
                path.display(),
                e
            );
            Vec::new()
        }
    };

    let mut scene = SceneDescription::default();

    scene.materials = materials
        .into_iter()
        .map(|m| MaterialDesc { diffuse_texture: m.diffuse_texture })
        .collect();

    for model in models {
        let mesh = model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let tex_coords = if mesh.texcoords.len() / 2 == positions.len() && !positions.is_empty() {
            Some(
                mesh.texcoords
                    .chunks_exact(2)
                    .map(|t| [t[0], 1.0 - t[1]])
                    .collect(),
            )
        } else {
            None
        };

        scene.root.children.push(SceneNode {
            meshes: vec![scene.meshes.len()],
            children: Vec::new(),
        });
        scene.meshes.push(MeshData {
            positions,
            tex_coords,
            indices: mesh.indices,
            material: mesh.material_id,
        });
    }

    if scene.meshes.is_empty() {
        return Err(Error::LoadFailed(format!("{}: no meshes", path.display())));
    }

    Ok(scene)
}

#[cfg(test)]
#[path = "obj_loader_tests.rs"]
mod tests;
