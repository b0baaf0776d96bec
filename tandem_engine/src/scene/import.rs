/// Scene import - turns a hierarchical scene description into one MeshModel.
///
/// The description is produced by a loader (see `obj_loader`) or built by hand.
/// Ingestion flattens the node tree depth-first, resolves each material to a
/// texture key (uploading each distinct file once) and creates one GPU mesh per
/// mesh record through caller-supplied closures, so the same logic runs with
/// real Vulkan resources and with test doubles.

use crate::error::{ErrorKind, Result};
use crate::resource::Vertex;
use crate::{engine_debug, engine_warn};
use super::registry::{MeshModel, ModelKey, SceneRegistry, TextureKey};

/// Raw triangle mesh as delivered by a loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    /// One entry per position when present
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Triangle list
    pub indices: Vec<u32>,
    /// Index into `SceneDescription::materials`
    pub material: Option<usize>,
}

impl MeshData {
    /// Interleave positions and texture coordinates; missing UVs become (0, 0)
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let tex_coord = self
                    .tex_coords
                    .as_ref()
                    .and_then(|uvs| uvs.get(i).copied())
                    .unwrap_or([0.0, 0.0]);
                Vertex::new(position, tex_coord)
            })
            .collect()
    }
}

/// Material record; only the diffuse texture is used
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDesc {
    /// Diffuse texture path as written in the source file. `None` or empty
    /// means the default texture.
    pub diffuse_texture: Option<String>,
}

/// Node of the scene hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneNode {
    /// Indices into `SceneDescription::meshes`
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

/// Everything a loader hands to the renderer for one `load_model` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDescription {
    pub root: SceneNode,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialDesc>,
}

impl SceneDescription {
    /// Meshes in draw order: a node's own meshes, then each child's, recursively
    pub fn flatten(&self) -> Vec<&MeshData> {
        let mut out = Vec::new();
        self.collect(&self.root, &mut out);
        out
    }

    fn collect<'a>(&'a self, node: &SceneNode, out: &mut Vec<&'a MeshData>) {
        for &index in &node.meshes {
            match self.meshes.get(index) {
                Some(mesh) => out.push(mesh),
                None => engine_warn!("tandem::scene", "Node references missing mesh {}", index),
            }
        }
        for child in &node.children {
            self.collect(child, out);
        }
    }

    /// Bare texture file name per material (`None` = default texture)
    pub fn material_texture_files(&self) -> Vec<Option<&str>> {
        self.materials
            .iter()
            .map(|m| {
                m.diffuse_texture
                    .as_deref()
                    .map(texture_file_name)
                    .filter(|name| !name.is_empty())
            })
            .collect()
    }
}

/// Strip any directory part (either separator) from a texture path
pub fn texture_file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Add every mesh of `scene` to `registry` as one new [`MeshModel`].
///
/// * `create_texture(file_name)` uploads a texture file; it is called at most
///   once per distinct file name. A `Load` error substitutes the default
///   texture; any other error aborts the import.
/// * `create_mesh(mesh, texture)` uploads one mesh.
pub fn ingest_scene<M, T>(
    registry: &mut SceneRegistry<M, T>,
    scene: &SceneDescription,
    mut create_texture: impl FnMut(&str) -> Result<T>,
    mut create_mesh: impl FnMut(&MeshData, TextureKey) -> Result<M>,
) -> Result<ModelKey> {
    let default_texture = registry.default_texture()?;

    let mut material_textures = Vec::with_capacity(scene.materials.len());
    for file in scene.material_texture_files() {
        let key = match file {
            None => default_texture,
            Some(name) => resolve_texture(registry, name, default_texture, &mut create_texture)?,
        };
        material_textures.push(key);
    }

    let flattened = scene.flatten();
    let mut meshes = Vec::with_capacity(flattened.len());
    for mesh in flattened {
        let texture = mesh
            .material
            .and_then(|m| material_textures.get(m).copied())
            .unwrap_or(default_texture);
        meshes.push(create_mesh(mesh, texture)?);
    }

    engine_debug!(
        "tandem::scene",
        "Imported {} meshes, {} materials",
        meshes.len(),
        scene.materials.len()
    );

    Ok(registry.insert_model(MeshModel::new(meshes)))
}

fn resolve_texture<M, T>(
    registry: &mut SceneRegistry<M, T>,
    file_name: &str,
    default_texture: TextureKey,
    create_texture: &mut impl FnMut(&str) -> Result<T>,
) -> Result<TextureKey> {
    if let Some(key) = registry.texture_for_file(file_name) {
        return Ok(key);
    }
    if !registry.has_texture_capacity() {
        engine_warn!(
            "tandem::scene",
            "Texture limit ({}) reached, '{}' uses the default texture",
            registry.max_textures(),
            file_name
        );
        return Ok(default_texture);
    }
    match create_texture(file_name) {
        Ok(texture) => registry.insert_texture(file_name, texture),
        Err(e) if e.kind() == ErrorKind::Load => {
            engine_warn!("tandem::scene", "{}; using the default texture", e);
            // Later materials naming the same file skip the decode
            registry.alias_texture(file_name, default_texture)?;
            Ok(default_texture)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
