use crate::error::{Error, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Directory, relative to the media root, holding recipe images.
const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// On-disk store for uploaded media.
///
/// Paths handed out and accepted by this type are relative to the media
/// root, e.g. `uploads/recipe/<uuid>.png`. The same root is served under
/// `/media`.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    base_path: PathBuf,
}

impl ImageStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Initializes storage directory structure
    pub async fn init(&self) -> Result<()> {
        let images_dir = self.base_path.join(RECIPE_IMAGE_DIR);
        if !images_dir.exists() {
            fs::create_dir_all(&images_dir).await.map_err(|e| {
                Error::Internal(format!("Failed to create media directory {:?}: {}", images_dir, e))
            })?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.base_path
    }

    /// Absolute path of a media-relative path.
    pub fn full_path(&self, relative: &str) -> PathBuf {
        self.base_path.join(relative.trim_start_matches('/'))
    }

    /// Writes a recipe image under a fresh unique name and returns its relative path.
    pub async fn save_recipe_image(&self, content: &[u8], extension: &str) -> Result<String> {
        let relative = format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), extension);
        let file_path = self.full_path(&relative);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::Internal(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }

        fs::write(&file_path, content).await.map_err(|e| {
            Error::Internal(format!("Failed to write image {:?}: {}", file_path, e))
        })?;

        tracing::debug!(operation = "save_recipe_image", path = %relative, bytes = content.len(), "Image stored");
        Ok(relative)
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<()> {
        let file_path = self.full_path(relative);
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Internal(format!("Failed to remove file {:?}: {}", file_path, e))),
        }
    }
}

/// Checks that `content` decodes as an image and returns the file extension
/// for its format.
pub fn validate_image(content: &[u8]) -> Result<&'static str> {
    let invalid = || {
        Error::invalid(
            "image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        )
    };

    if content.is_empty() {
        return Err(Error::invalid("image", "The submitted file is empty."));
    }

    let format = image::guess_format(content).map_err(|_| invalid())?;
    image::load_from_memory_with_format(content, format).map_err(|_| invalid())?;

    Ok(extension_for(format))
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        other => other.extensions_str().first().copied().unwrap_or("img"),
    }
}
