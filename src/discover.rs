//! Batch input discovery — find ledger photos in a folder.
//!
//! The folder flow is the bulk-digitization path: a clerk drops a day's
//! scans into one directory and the whole directory becomes a batch. The
//! scan is non-recursive and filters by the supported raster formats; files
//! come back in sorted name order so batches are reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::types::ImageTask;

/// Raster formats the pipeline can decode.
const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// List the ledger photos in `folder`, sorted by filename.
pub fn discover_images(folder: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    if !folder.exists() {
        return Err(DiscoverError::FolderNotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(DiscoverError::NotADirectory(folder.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Load every discovered photo into an [`ImageTask`].
///
/// The folder flow performs no masking — regions come from interactive
/// selection, which this path doesn't have — so tasks carry no regions.
pub fn tasks_from_folder(folder: &Path) -> Result<Vec<ImageTask>, DiscoverError> {
    let mut tasks = Vec::new();
    for path in discover_images(folder)? {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image_bytes = fs::read(&path)?;
        tasks.push(ImageTask::new(filename, image_bytes, Vec::new()));
    }
    tracing::debug!(folder = %folder.display(), tasks = tasks.len(), "discovered batch input");
    Ok(tasks)
}

/// Extension must be in the supported set and the guessed MIME type must be
/// an image — a `report.png.txt` straggler is not batch input.
fn is_supported_image(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    by_extension
        && mime_guess::from_path(path)
            .first()
            .map(|m| m.type_() == mime_guess::mime::IMAGE)
            .unwrap_or(false)
}
