use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{ImageError, ImageReader};
use thiserror::Error;
use tracing::info;

/// Index into the [`ResourceManager`] texture arena. Cheap to copy; owners of a handle never
/// own the texture itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Texture {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, ResourceError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(ResourceError::InvalidDimensions {
                width,
                height,
                byte_len: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Result<Self, ResourceError> {
        let pixel_count = width as usize * height as usize;
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(pixel_count * 4)
            .collect();
        Self::from_rgba(width, height, rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("texture file not found: {path}")]
    NotFound { path: PathBuf },
    #[error("failed to open texture {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("a texture named '{name}' is already loaded")]
    DuplicateName { name: String },
    #[error("texture data does not match {width}x{height} rgba ({byte_len} bytes)")]
    InvalidDimensions {
        width: u32,
        height: u32,
        byte_len: usize,
    },
}

/// Owns every decoded texture; everything else refers to them by [`TextureHandle`].
#[derive(Debug)]
pub struct ResourceManager {
    asset_root: PathBuf,
    textures: Vec<Texture>,
    names: HashMap<String, TextureHandle>,
}

impl ResourceManager {
    pub fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            textures: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn asset_path(&self, relative: &Path) -> PathBuf {
        self.asset_root.join(relative)
    }

    /// Loads `relative` (under the asset root) and registers it as `name`. Names are unique;
    /// a second load under the same name fails without touching the first.
    pub fn load_texture(
        &mut self,
        relative: &Path,
        name: &str,
    ) -> Result<TextureHandle, ResourceError> {
        if self.names.contains_key(name) {
            return Err(ResourceError::DuplicateName {
                name: name.to_string(),
            });
        }

        let path = self.asset_path(relative);
        let texture = decode_texture(&path)?;
        let handle = self.insert_texture(name, texture)?;
        info!(
            name,
            path = %path.display(),
            width = self.textures[handle.index()].width,
            height = self.textures[handle.index()].height,
            "texture_loaded"
        );
        Ok(handle)
    }

    pub fn insert_texture(
        &mut self,
        name: &str,
        texture: Texture,
    ) -> Result<TextureHandle, ResourceError> {
        if self.names.contains_key(name) {
            return Err(ResourceError::DuplicateName {
                name: name.to_string(),
            });
        }
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        self.names.insert(name.to_string(), handle);
        Ok(handle)
    }

    pub fn texture_handle(&self, name: &str) -> Option<TextureHandle> {
        self.names.get(name).copied()
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.index())
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

fn decode_texture(path: &Path) -> Result<Texture, ResourceError> {
    if !path.is_file() {
        return Err(ResourceError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let reader = ImageReader::open(path).map_err(|source| ResourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| ResourceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    Texture::from_rgba(image.width(), image.height(), image.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn insert_and_lookup_by_name() {
        let mut resources = ResourceManager::new(PathBuf::from("assets"));
        let texture = Texture::solid(2, 3, [1, 2, 3, 255]).expect("texture");
        let handle = resources.insert_texture("tile", texture).expect("insert");

        assert_eq!(resources.texture_handle("tile"), Some(handle));
        let stored = resources.texture(handle).expect("stored");
        assert_eq!((stored.width(), stored.height()), (2, 3));
        assert_eq!(stored.pixel(1, 2), Some([1, 2, 3, 255]));
        assert_eq!(stored.pixel(2, 0), None);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut resources = ResourceManager::new(PathBuf::from("assets"));
        let first = resources
            .insert_texture("a", Texture::solid(1, 1, [0; 4]).expect("texture"))
            .expect("first");
        let second = resources.insert_texture("a", Texture::solid(4, 4, [9; 4]).expect("texture"));

        assert!(matches!(second, Err(ResourceError::DuplicateName { .. })));
        assert_eq!(resources.texture_count(), 1);
        assert_eq!(resources.texture(first).map(Texture::width), Some(1));
    }

    #[test]
    fn rgba_length_must_match_dimensions() {
        assert!(matches!(
            Texture::from_rgba(2, 2, vec![0; 15]),
            Err(ResourceError::InvalidDimensions { .. })
        ));
        assert!(Texture::from_rgba(0, 0, Vec::new()).is_err());
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let mut resources = ResourceManager::new(dir.path().to_path_buf());

        let result = resources.load_texture(Path::new("images/missing.png"), "missing");

        assert!(matches!(result, Err(ResourceError::NotFound { .. })));
        assert!(resources.texture_handle("missing").is_none());
    }

    #[test]
    fn loads_png_from_asset_root() {
        let dir = TempDir::new().expect("temp dir");
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        image
            .save(dir.path().join("dot.png"))
            .expect("write png");
        let mut resources = ResourceManager::new(dir.path().to_path_buf());

        let handle = resources
            .load_texture(Path::new("dot.png"), "dot")
            .expect("load");

        let texture = resources.texture(handle).expect("texture");
        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert_eq!(texture.pixel(2, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn corrupt_file_reports_decode_error() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("bad.png"), b"not a png").expect("write");
        let mut resources = ResourceManager::new(dir.path().to_path_buf());

        let result = resources.load_texture(Path::new("bad.png"), "bad");

        assert!(matches!(result, Err(ResourceError::Decode { .. })));
    }
}
