/// SceneRegistry - loaded models and textures, addressed by stable keys.
///
/// Models and textures live in SlotMaps: keys carry a generation, so a key
/// kept after its model was removed is reported as stale instead of silently
/// pointing at whatever reuses the slot.
///
/// The registry is generic over the GPU mesh type `M` and texture type `T` so
/// that the same bookkeeping serves the Vulkan backend and the GPU-free tests.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use glam::Mat4;
use crate::error::{Error, Result};

new_key_type! {
    /// Stable key for a model returned by `load_model`.
    pub struct ModelKey;
}

new_key_type! {
    /// Stable key for a texture. The first texture registered is the default.
    pub struct TextureKey;
}

/// Meshes loaded together from one file, sharing one model matrix.
#[derive(Debug)]
pub struct MeshModel<M> {
    meshes: Vec<M>,
    model: Mat4,
}

impl<M> MeshModel<M> {
    /// Wrap a flattened mesh list with an identity model matrix
    pub fn new(meshes: Vec<M>) -> Self {
        Self {
            meshes,
            model: Mat4::IDENTITY,
        }
    }

    pub fn meshes(&self) -> &[M] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn model_matrix(&self) -> &Mat4 {
        &self.model
    }

    pub fn set_model_matrix(&mut self, model: Mat4) {
        self.model = model;
    }
}

/// Container for every GPU resource the orchestrator draws from.
pub struct SceneRegistry<M, T> {
    models: SlotMap<ModelKey, MeshModel<M>>,
    textures: SlotMap<TextureKey, T>,
    /// Registration order; position 0 is the default texture
    texture_order: Vec<TextureKey>,
    /// Texture file name -> key, so each file is uploaded once
    textures_by_file: FxHashMap<String, TextureKey>,
    max_textures: usize,
}

impl<M, T> SceneRegistry<M, T> {
    /// Create an empty registry that accepts at most `max_textures` textures
    /// (the default texture included)
    pub fn new(max_textures: usize) -> Self {
        Self {
            models: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            texture_order: Vec::new(),
            textures_by_file: FxHashMap::default(),
            max_textures,
        }
    }

    // ===== TEXTURES =====

    /// Register the fallback texture. Must be the first texture registered.
    pub fn set_default_texture(&mut self, texture: T) -> Result<TextureKey> {
        if !self.texture_order.is_empty() {
            return Err(Error::InvalidResource(
                "Default texture must be registered first".to_string(),
            ));
        }
        self.push_texture(texture)
    }

    /// Key of the default texture (registry index 0)
    pub fn default_texture(&self) -> Result<TextureKey> {
        self.texture_order.first().copied().ok_or_else(|| {
            Error::InvalidResource("No default texture registered".to_string())
        })
    }

    /// Register a texture loaded from `file_name`
    pub fn insert_texture(&mut self, file_name: &str, texture: T) -> Result<TextureKey> {
        if self.texture_order.is_empty() {
            return Err(Error::InvalidResource(
                "Default texture must be registered before file textures".to_string(),
            ));
        }
        if let Some(&key) = self.textures_by_file.get(file_name) {
            return Ok(key);
        }
        let key = self.push_texture(texture)?;
        self.textures_by_file.insert(file_name.to_string(), key);
        Ok(key)
    }

    /// Resolve `file_name` to an already registered texture from now on,
    /// without creating a new one
    pub fn alias_texture(&mut self, file_name: &str, key: TextureKey) -> Result<()> {
        if !self.textures.contains_key(key) {
            return Err(Error::StaleHandle("texture key no longer valid".to_string()));
        }
        self.textures_by_file.insert(file_name.to_string(), key);
        Ok(())
    }

    fn push_texture(&mut self, texture: T) -> Result<TextureKey> {
        if self.texture_order.len() >= self.max_textures {
            return Err(Error::InvalidResource(format!(
                "Texture limit reached ({})", self.max_textures
            )));
        }
        let key = self.textures.insert(texture);
        self.texture_order.push(key);
        Ok(key)
    }

    /// Texture already uploaded for `file_name`, if any
    pub fn texture_for_file(&self, file_name: &str) -> Option<TextureKey> {
        self.textures_by_file.get(file_name).copied()
    }

    pub fn texture(&self, key: TextureKey) -> Result<&T> {
        self.textures
            .get(key)
            .ok_or_else(|| Error::StaleHandle("texture key no longer valid".to_string()))
    }

    /// Registration index of a texture (0 = default)
    pub fn texture_index(&self, key: TextureKey) -> Option<usize> {
        self.texture_order.iter().position(|&k| k == key)
    }

    pub fn texture_count(&self) -> usize {
        self.texture_order.len()
    }

    /// True when another texture can still be registered
    pub fn has_texture_capacity(&self) -> bool {
        self.texture_order.len() < self.max_textures
    }

    pub fn max_textures(&self) -> usize {
        self.max_textures
    }

    // ===== MODELS =====

    pub fn insert_model(&mut self, model: MeshModel<M>) -> ModelKey {
        self.models.insert(model)
    }

    pub fn model(&self, key: ModelKey) -> Result<&MeshModel<M>> {
        self.models
            .get(key)
            .ok_or_else(|| Error::StaleHandle("model key no longer valid".to_string()))
    }

    /// Replace the model matrix pushed for every mesh of `key`
    pub fn set_model_matrix(&mut self, key: ModelKey, model: Mat4) -> Result<()> {
        let entry = self
            .models
            .get_mut(key)
            .ok_or_else(|| Error::StaleHandle("model key no longer valid".to_string()))?;
        entry.set_model_matrix(model);
        Ok(())
    }

    /// Remove a model and hand its meshes back to the caller, which is
    /// responsible for keeping them alive until the GPU is done with them
    pub fn remove_model(&mut self, key: ModelKey) -> Result<MeshModel<M>> {
        self.models
            .remove(key)
            .ok_or_else(|| Error::StaleHandle("model key no longer valid".to_string()))
    }

    /// Models in draw order
    pub fn models(&self) -> impl Iterator<Item = (ModelKey, &MeshModel<M>)> {
        self.models.iter()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Drop every model, then every texture. Models go first because their
    /// meshes reference textures by key.
    pub fn clear(&mut self) {
        self.models.clear();
        self.textures_by_file.clear();
        self.texture_order.clear();
        self.textures.clear();
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
