//! Image acquisition
//!
//! Fetching and unpacking software images is owned by whatever feeds the
//! lab; the lifecycle only needs an image staged as a local file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Stages a software image into a host directory
pub trait ImageSource {
    /// Make the image `reference` available under `destination`
    ///
    /// Returns the local path of the staged image.
    fn acquire(&self, reference: &str, destination: &Path, decompress: bool) -> Result<PathBuf>;
}

/// Stages images that are already on the host filesystem
///
/// Accepts plain paths and `file://` URLs. Images are copied into the
/// destination directory unless they already live there.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalImageSource;

impl LocalImageSource {
    /// Create a local image source
    pub fn new() -> Self {
        Self
    }
}

/// Whether `a` and `b` name the same file, however they are spelled
///
/// `a` must exist; a missing `b` is simply a different file.
fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
    let a = fs::canonicalize(a)?;
    Ok(fs::canonicalize(b).map(|b| a == b).unwrap_or(false))
}

impl ImageSource for LocalImageSource {
    fn acquire(&self, reference: &str, destination: &Path, decompress: bool) -> Result<PathBuf> {
        if decompress {
            return Err(Error::NotImplemented("image decompression"));
        }

        let source = PathBuf::from(reference.strip_prefix("file://").unwrap_or(reference));
        let name = source
            .file_name()
            .ok_or_else(|| Error::Config(format!("image reference has no file name: {}", reference)))?;
        fs::create_dir_all(destination)?;
        let staged = destination.join(name);

        // Copying a file onto itself truncates it
        if is_same_file(&source, &staged)? {
            log::debug!("{} is already staged", staged.display());
            return Ok(staged);
        }

        log::info!("Staging {} to {}", source.display(), staged.display());
        fs::copy(&source, &staged)?;
        Ok(staged)
    }
}
