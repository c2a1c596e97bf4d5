use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::domain::{ImageUuid, NormalizedName};
use crate::error::MarkerError;

/// Output directory holding downloaded silhouettes and composed markers.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn silhouette_path(&self, species: &NormalizedName, uuid: &ImageUuid) -> Utf8PathBuf {
        self.root.join(format!("{}_{}.svg", species.file_stem(), uuid.as_str()))
    }

    pub fn marker_path(&self, species: &NormalizedName) -> Utf8PathBuf {
        self.root.join(format!("{}_marker.svg", species.file_stem()))
    }

    pub fn ensure_root(&self) -> Result<(), MarkerError> {
        create_private_dir(&self.root).map_err(|err| {
            MarkerError::Filesystem(format!("failed to create {}: {err}", self.root))
        })
    }

    /// Writes through a temporary sibling so readers never see a partial file.
    /// The result is readable and writable by the owner only. The parent
    /// directory must already exist.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), MarkerError> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));
        let mut temp = Builder::new()
            .prefix(".species-marker")
            .suffix(".tmp")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| MarkerError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| MarkerError::Filesystem(format!("write {path}: {err}")))?;
        restrict_to_owner(temp.as_file())
            .map_err(|err| MarkerError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| MarkerError::Filesystem(format!("persist {path}: {}", err.error)))?;
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path.as_std_path())
}

#[cfg(not(unix))]
fn create_private_dir(path: &Utf8Path) -> std::io::Result<()> {
    fs::create_dir_all(path.as_std_path())
}

#[cfg(unix)]
fn restrict_to_owner(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}
