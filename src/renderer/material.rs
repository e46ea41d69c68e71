use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};

use crate::error::Error;
use crate::renderer::texture::{DecodedImage, TextureHandle, TextureUploader, MAX_TEXTURES};

/// How many rows the shaders' material table can hold.
pub const MAX_MATERIALS: usize = 1024;

/// Index into the [`MaterialTable`], dense and stable once handed out.
pub type MaterialId = u32;

/// The texture slots a material can fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSlot {
    Albedo,
    Opacity,
    Metalness,
    Roughness,
    Normal,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 5] = [
        TextureSlot::Albedo,
        TextureSlot::Opacity,
        TextureSlot::Metalness,
        TextureSlot::Roughness,
        TextureSlot::Normal,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One row of the material storage buffer. The texture fields index the
/// resident handle table and only mean something when the matching
/// `has_*` flag is non-zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Material {
    pub textures: [u32; 5],
    pub has_textures: [u32; 5],
    pub opacity: f32,
}

impl Material {
    /// The handle-table index bound to `slot`, if the material has one.
    pub fn texture(&self, slot: TextureSlot) -> Option<u32> {
        (self.has_textures[slot.index()] != 0).then_some(self.textures[slot.index()])
    }

    pub fn has(&self, slot: TextureSlot) -> bool {
        self.texture(slot).is_some()
    }
}

/// Source description of a material. Absent or empty paths leave the slot
/// unset.
#[derive(Clone, Debug)]
pub struct MaterialDesc {
    pub albedo: Option<PathBuf>,
    pub opacity: f32,
    pub opacity_map: Option<PathBuf>,
    pub metalness: Option<PathBuf>,
    pub roughness: Option<PathBuf>,
    pub normal: Option<PathBuf>,
}

impl Default for MaterialDesc {
    fn default() -> MaterialDesc {
        MaterialDesc {
            albedo: None,
            opacity: 1.0,
            opacity_map: None,
            metalness: None,
            roughness: None,
            normal: None,
        }
    }
}

impl MaterialDesc {
    fn path(&self, slot: TextureSlot) -> Option<&Path> {
        let path = match slot {
            TextureSlot::Albedo => &self.albedo,
            TextureSlot::Opacity => &self.opacity_map,
            TextureSlot::Metalness => &self.metalness,
            TextureSlot::Roughness => &self.roughness,
            TextureSlot::Normal => &self.normal,
        };
        path.as_deref().filter(|path| !path.as_os_str().is_empty())
    }
}

/// Insertion-ordered materials plus the resident texture handles they
/// reference. The table only grows; it is uploaded to the GPU in one go by
/// the scene aggregation step once every material is registered.
pub struct MaterialTable<U: TextureUploader> {
    uploader: U,
    materials: Vec<Material>,
    handles: Vec<TextureHandle>,
    texture_cache: HashMap<PathBuf, u32>,
    texture_capacity: usize,
}

impl<U: TextureUploader> MaterialTable<U> {
    pub fn new(uploader: U) -> MaterialTable<U> {
        MaterialTable::with_texture_capacity(uploader, MAX_TEXTURES)
    }

    pub fn with_texture_capacity(uploader: U, texture_capacity: usize) -> MaterialTable<U> {
        MaterialTable {
            uploader,
            materials: Vec::new(),
            handles: Vec::new(),
            texture_cache: HashMap::new(),
            texture_capacity,
        }
    }

    /// Registers a material, uploading any texture that has not been seen
    /// before, and returns its id.
    pub fn create(&mut self, desc: &MaterialDesc) -> Result<MaterialId, Error> {
        if self.materials.len() >= MAX_MATERIALS {
            return Err(Error::resource(
                "material table",
                format!("table is full ({MAX_MATERIALS} rows)"),
            ));
        }
        let mut material = Material {
            opacity: desc.opacity,
            ..Material::default()
        };
        for slot in TextureSlot::ALL {
            if let Some(path) = desc.path(slot) {
                material.textures[slot.index()] = self.load_texture(path)?;
                material.has_textures[slot.index()] = 1;
            }
        }
        let textured = TextureSlot::ALL
            .iter()
            .filter(|&&slot| material.has(slot))
            .count();
        self.materials.push(material);
        log::debug!(
            "Material {} created with {textured} textures",
            self.materials.len() - 1
        );
        Ok((self.materials.len() - 1) as MaterialId)
    }

    pub fn get_by_id(&self, id: MaterialId) -> Result<&Material, Error> {
        self.materials
            .get(id as usize)
            .ok_or(Error::PreconditionViolation {
                what: "material",
                id,
                len: self.materials.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn texture_handles(&self) -> &[TextureHandle] {
        &self.handles
    }

    /// Returns the handle-table index for the texture at `path`, decoding and
    /// uploading it only the first time the file is seen.
    fn load_texture(&mut self, path: &Path) -> Result<u32, Error> {
        let canonical = path
            .canonicalize()
            .map_err(|err| Error::resource(path, err))?;
        if let Some(&index) = self.texture_cache.get(&canonical) {
            log::debug!("Reusing texture {index} for {}", path.display());
            return Ok(index);
        }
        if self.handles.len() >= self.texture_capacity {
            return Err(Error::resource(
                path,
                format!(
                    "resident texture table is full ({} handles)",
                    self.texture_capacity
                ),
            ));
        }

        let image = DecodedImage::open(&canonical)?;
        let handle = self.uploader.upload(&image)?;
        let index = self.handles.len() as u32;
        self.handles.push(handle);
        self.texture_cache.insert(canonical, index);
        log::debug!(
            "Uploaded {} ({}x{}) as texture {index}",
            path.display(),
            image.width,
            image.height
        );
        Ok(index)
    }

    #[cfg(test)]
    pub fn uploader(&self) -> &U {
        &self.uploader
    }
}
