//! Image discovery for batch input

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use tally_types::{Error, Result};

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Check if a path is a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a directory for image files, sorted by file name
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_supported_image(path) {
            images.push(path.to_path_buf());
        }
    }

    // Sort by filename for consistent ordering
    images.sort_by(|a, b| {
        a.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .cmp(b.file_name().and_then(|n| n.to_str()).unwrap_or(""))
    });

    Ok(images)
}

/// Expand command-line inputs into an ordered image list.
///
/// Folders are scanned; files are taken as given (an undecodable file is
/// reported later, per image) so the caller's order is kept.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            let found = scan_directory(path)?;
            debug!(dir = %path.display(), count = found.len(), "scanned folder");
            images.extend(found);
        } else if path.is_file() {
            images.push(path.clone());
        } else {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
    }

    Ok(images)
}
