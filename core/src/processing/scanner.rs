use crate::prelude::{CoreError, CoreResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Accepted suffixes, matched case-sensitively against the file name.
pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".png", ".jpeg"];

pub fn is_image_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
        .unwrap_or(false)
}

/// Lists the image files directly inside `dir`, sorted by path.
pub fn scan_directory(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| CoreError::Scan {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    images.sort();
    Ok(images)
}
