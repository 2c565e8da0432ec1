//! Test images shared read-only by every scenario.

use std::path::{Path, PathBuf};

use shrinkix_client::FilePart;

use crate::config::HarnessConfig;

/// A fixture that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot read test image {}: {reason}", .path.display())]
pub struct FixtureError {
    pub path: PathBuf,
    pub reason: String,
}

/// The two images the scenarios upload. A missing file only affects the
/// scenarios that need it.
#[derive(Debug, Clone)]
pub struct Fixtures {
    primary: Result<FilePart, FixtureError>,
    secondary: Result<FilePart, FixtureError>,
}

impl Fixtures {
    pub async fn load(config: &HarnessConfig) -> Self {
        Self {
            primary: load_image(&config.test_image).await,
            secondary: load_image(&config.secondary_image).await,
        }
    }

    /// Fixtures from in-memory parts.
    pub fn from_parts(primary: FilePart, secondary: FilePart) -> Self {
        Self {
            primary: Ok(primary),
            secondary: Ok(secondary),
        }
    }

    pub fn primary(&self) -> Result<&FilePart, FixtureError> {
        self.primary.as_ref().map_err(Clone::clone)
    }

    pub fn secondary(&self) -> Result<&FilePart, FixtureError> {
        self.secondary.as_ref().map_err(Clone::clone)
    }
}

async fn load_image(path: &Path) -> Result<FilePart, FixtureError> {
    let content = tokio::fs::read(path).await.map_err(|e| FixtureError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded test image");
    Ok(FilePart::image(filename, content))
}
