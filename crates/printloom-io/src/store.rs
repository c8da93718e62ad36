use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::format::{FormatError, SerializedScene};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("asset not found: {0}")]
    NotFound(String),
}

/// The persistence boundary for designs. Auto-save is fire-and-forget from
/// the session's point of view; apply must succeed before the caller may
/// submit its form.
pub trait DesignStore {
    fn autosave(
        &mut self,
        design: &SerializedScene,
        product_id: &str,
        variant_id: &str,
    ) -> Result<(), StoreError>;

    fn apply_design(
        &mut self,
        design: &SerializedScene,
        preview_png: &[u8],
    ) -> Result<(), StoreError>;
}

/// Resolves an asset url to raw bytes (template and mask images).
pub trait AssetFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, StoreError>;
}

// ── Filesystem implementations ───────────────────────────────────────

/// Stores designs as files under a root directory. Used by the workbench and
/// by tests; a deployment would put a remote client behind [`DesignStore`]
/// instead.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn design_path(&self) -> PathBuf {
        self.root.join("design.json")
    }

    pub fn preview_path(&self) -> PathBuf {
        self.root.join("preview.png")
    }
}

impl DesignStore for FileStore {
    fn autosave(
        &mut self,
        design: &SerializedScene,
        product_id: &str,
        variant_id: &str,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let path = self
            .root
            .join(format!("autosave-{product_id}-{variant_id}.json"));
        fs::write(&path, design.to_json()?)?;
        info!("autosaved design to {}", path.display());
        Ok(())
    }

    fn apply_design(
        &mut self,
        design: &SerializedScene,
        preview_png: &[u8],
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.design_path(), design.to_json()?)?;
        fs::write(self.preview_path(), preview_png)?;
        info!("applied design to {}", self.root.display());
        Ok(())
    }
}

/// Resolves asset urls as paths relative to a base directory.
pub struct FileFetcher {
    base: PathBuf,
}

impl FileFetcher {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl AssetFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let path = if Path::new(url).is_absolute() {
            PathBuf::from(url)
        } else {
            self.base.join(url)
        };
        fs::read(&path).map_err(|_| StoreError::NotFound(path.display().to_string()))
    }
}
