//! On-disk layout and name validation.
//!
//! ```text
//! <data_dir>/blob/<account>/<container>/<blob name segments...>   content
//! <data_dir>/blob-meta/<account>/<container>/<blob name segments...> properties (JSON)
//! <data_dir>/.staging/<uuid>                                       in-flight writes
//! ```
//!
//! The property tree mirrors the content tree exactly, so any name that fits
//! in one fits in the other.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

pub const BLOB_DIR: &str = "blob";
pub const META_DIR: &str = "blob-meta";
pub const STAGING_DIR: &str = ".staging";

/// Resolves logical names to filesystem paths under a data directory.
#[derive(Debug, Clone)]
pub struct Layout {
    blob_root: PathBuf,
    meta_root: PathBuf,
    staging_root: PathBuf,
}

impl Layout {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            blob_root: data_dir.join(BLOB_DIR),
            meta_root: data_dir.join(META_DIR),
            staging_root: data_dir.join(STAGING_DIR),
        }
    }

    pub fn blob_root(&self) -> &Path {
        &self.blob_root
    }

    pub fn meta_root(&self) -> &Path {
        &self.meta_root
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// `<blob_root>/<account>/<container>`
    pub fn container_path(&self, account: &str, container: &str) -> PathBuf {
        self.blob_root.join(account).join(container)
    }

    /// `<container_path>/<blob name>`, one path component per `/` segment.
    pub fn blob_path(&self, account: &str, container: &str, blob: &str) -> PathBuf {
        push_segments(self.container_path(account, container), blob)
    }

    pub fn container_meta_path(&self, account: &str, container: &str) -> PathBuf {
        self.meta_root.join(account).join(container)
    }

    pub fn sidecar_path(&self, account: &str, container: &str, blob: &str) -> PathBuf {
        push_segments(self.container_meta_path(account, container), blob)
    }

    /// A fresh, unique staging file path.
    pub fn staging_file(&self) -> PathBuf {
        self.staging_root.join(Uuid::new_v4().simple().to_string())
    }
}

fn push_segments(mut path: PathBuf, name: &str) -> PathBuf {
    for segment in name.split('/') {
        path.push(segment);
    }
    path
}

/// Validates an account or container name: a single, non-empty path segment.
pub fn validate_segment(what: &str, value: &str) -> StorageResult<()> {
    if value.is_empty() {
        return Err(StorageError::invalid_argument(format!(
            "{} name is required",
            what
        )));
    }
    if value.contains(['/', '\\', '\0']) || value == "." || value == ".." {
        return Err(StorageError::invalid_argument(format!(
            "{} name '{}' is not a valid path segment",
            what, value
        )));
    }
    Ok(())
}

/// Validates a blob name: non-empty, relative, `/`-separated, with no empty,
/// `.` or `..` segments.
pub fn validate_blob_name(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::invalid_argument("blob name is required"));
    }
    if name.contains(['\\', '\0']) {
        return Err(StorageError::invalid_argument(format!(
            "blob name '{}' contains an invalid character",
            name
        )));
    }
    if name
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::invalid_argument(format!(
            "blob name '{}' has an empty or relative path segment",
            name
        )));
    }
    Ok(())
}

pub fn validate_container(account: &str, container: &str) -> StorageResult<()> {
    validate_segment("account", account)?;
    validate_segment("container", container)
}

pub fn validate_blob(account: &str, container: &str, blob: &str) -> StorageResult<()> {
    validate_container(account, container)?;
    validate_blob_name(blob)
}
