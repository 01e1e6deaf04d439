//! Filesystem-backed blob storage engine.
//!
//! All operations are synchronous and block on filesystem I/O. The async
//! [`FileBlobStore`](super::FileBlobStore) handle moves them onto the blocking
//! pool.
//!
//! Locking: one `RwLock` around the [`NamespaceIndex`] per engine. Container
//! create/delete and the implicit create inside `put_blob` take it for
//! writing and touch the directory while holding it. Blob reads, writes,
//! deletes and listings hold it for reading, which keeps a container
//! deletion from interleaving with them while letting them overlap with
//! each other.
//!
//! A blob's content and its properties are two files. Gets, puts and deletes
//! of the same blob also take one of a fixed set of striped mutexes, always
//! after the index guard, so the pair is replaced and read as a unit.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::index::NamespaceIndex;
use super::layout::{self, Layout};
use crate::error::{ErrorCode, StorageError, StorageResult};
use crate::models::{Blob, BlobInfo, BlobProperties};

/// Number of mutexes that same-blob operations are spread over.
const BLOB_LOCK_STRIPES: usize = 64;

/// Blob storage engine rooted at a data directory.
pub struct BlobEngine {
    layout: Layout,
    index: RwLock<NamespaceIndex>,
    blob_locks: BlobLocks,
}

impl BlobEngine {
    /// Opens (creating if needed) the data directory and rebuilds the
    /// container index from the directories already on disk.
    pub fn open(data_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let layout = Layout::new(data_dir);

        for dir in [layout.blob_root(), layout.meta_root(), layout.staging_root()] {
            fs::create_dir_all(dir)
                .map_err(|e| StorageError::io("failed to create blob directory", e))?;
        }

        clear_staging(layout.staging_root());
        let index = load_index(layout.blob_root())?;

        info!(
            root = %layout.blob_root().display(),
            containers = index.len(),
            "blob store opened"
        );

        Ok(Self {
            layout,
            index: RwLock::new(index),
            blob_locks: BlobLocks::new(BLOB_LOCK_STRIPES),
        })
    }

    // Container operations

    /// Creates a container. Fails with `ContainerAlreadyExists` if the index
    /// already records it; a directory left on disk without an index entry
    /// is adopted silently.
    pub fn create_container(&self, account: &str, container: &str) -> StorageResult<()> {
        layout::validate_container(account, container)?;

        let mut index = self.index.write();
        if index.exists(account, container) {
            return Err(StorageError::with_message(
                ErrorCode::ContainerAlreadyExists,
                format!("container {} already exists", container),
            ));
        }

        self.create_container_dir(&mut index, account, container)
    }

    /// Deletes a container and every blob in it.
    pub fn delete_container(&self, account: &str, container: &str) -> StorageResult<()> {
        layout::validate_container(account, container)?;

        let mut index = self.index.write();
        if !index.exists(account, container) {
            return Err(StorageError::with_message(
                ErrorCode::ContainerNotFound,
                format!("container {} does not exist", container),
            ));
        }

        remove_tree(&self.layout.container_meta_path(account, container))
            .map_err(|e| StorageError::io("failed to delete container properties", e))?;
        remove_tree(&self.layout.container_path(account, container))
            .map_err(|e| StorageError::io("failed to delete container directory", e))?;

        index.unmark(account, container);
        Ok(())
    }

    /// Index lookup only; never touches the disk.
    pub fn container_exists(&self, account: &str, container: &str) -> StorageResult<bool> {
        layout::validate_container(account, container)?;
        Ok(self.index.read().exists(account, container))
    }

    // Blob operations

    /// Writes a blob, creating the container and any intermediate
    /// directories implied by the blob name.
    ///
    /// Content and properties are each written to a staging file and renamed
    /// into place under the blob's lock, so readers see either the old or the
    /// new blob, never a partial one or a mix of the two.
    ///
    /// A name that runs through an existing blob, or that names a directory,
    /// fails with `InvalidArgument`.
    pub fn put_blob(
        &self,
        account: &str,
        container: &str,
        blob: &str,
        content: &[u8],
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        layout::validate_blob(account, container, blob)?;

        let properties = BlobProperties::new(content_type, metadata);
        let encoded = serde_json::to_vec(&properties)
            .map_err(|e| StorageError::internal(format!("failed to encode blob properties: {}", e)))?;

        let _guard = self.ensure_container(account, container)?;
        let _blob_lock = self.blob_locks.lock(account, container, blob);

        let root = self.layout.container_path(account, container);
        let target = self.layout.blob_path(account, container, blob);
        if let Some(conflict) = name_conflict(&root, &target, blob) {
            return Err(conflict);
        }

        // Another blob may have claimed a parent name since the check above.
        let write_failed = |context: &str, e: io::Error| {
            name_conflict(&root, &target, blob).unwrap_or_else(|| StorageError::io(context, e))
        };

        self.write_atomic(&self.layout.sidecar_path(account, container, blob), &encoded)
            .map_err(|e| write_failed("failed to write blob properties", e))?;
        self.write_atomic(&target, content)
            .map_err(|e| write_failed("failed to write blob", e))?;

        debug!(account, container, blob, size = content.len(), "blob written");
        Ok(())
    }

    /// Reads a blob and its properties.
    pub fn get_blob(&self, account: &str, container: &str, blob: &str) -> StorageResult<Blob> {
        layout::validate_blob(account, container, blob)?;

        let _guard = self.index.read();
        let _blob_lock = self.blob_locks.lock(account, container, blob);
        let root = self.layout.container_path(account, container);
        let path = self.layout.blob_path(account, container, blob);

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if is_missing(&e, &root, &path) => return Err(blob_not_found(blob)),
            Err(e) => return Err(StorageError::io("failed to read blob", e)),
        };

        let stat = fs::metadata(&path)
            .map_err(|e| StorageError::internal(format!("failed to stat blob: {}", e)))?;
        let (created_at, modified_at) = file_times(&stat)?;
        let properties = self.read_properties(account, container, blob);

        Ok(Blob {
            account: account.to_string(),
            container: container.to_string(),
            name: blob.to_string(),
            size: content.len() as u64,
            content: Bytes::from(content),
            content_type: properties.content_type,
            created_at,
            modified_at,
            metadata: properties.metadata,
        })
    }

    /// Removes a blob. Its container and sibling blobs are untouched.
    ///
    /// Content goes first. Properties left behind by a failed cleanup are
    /// never read without content and are replaced by the next put.
    pub fn delete_blob(&self, account: &str, container: &str, blob: &str) -> StorageResult<()> {
        layout::validate_blob(account, container, blob)?;

        let _guard = self.index.read();
        let _blob_lock = self.blob_locks.lock(account, container, blob);
        let root = self.layout.container_path(account, container);
        let path = self.layout.blob_path(account, container, blob);

        match fs::metadata(&path) {
            Ok(stat) if stat.is_file() => {}
            Ok(_) => return Err(blob_not_found(blob)),
            Err(e) if is_missing(&e, &root, &path) => return Err(blob_not_found(blob)),
            Err(e) => return Err(StorageError::io("failed to stat blob", e)),
        }

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(blob_not_found(blob)),
            Err(e) => return Err(StorageError::io("failed to delete blob", e)),
        }

        if let Err(e) = remove_file_if_exists(&self.layout.sidecar_path(account, container, blob)) {
            warn!(account, container, blob, error = %e, "failed to delete blob properties");
        }
        Ok(())
    }

    /// Lists blobs under a container.
    ///
    /// The walk is depth-first with siblings visited in file-name order, so
    /// results are reproducible. `prefix` is a plain string prefix on the
    /// blob name (not segment aware). With `max_results` set above zero the
    /// walk stops once that many entries have been collected.
    pub fn list_blobs(
        &self,
        account: &str,
        container: &str,
        prefix: Option<&str>,
        max_results: Option<usize>,
    ) -> StorageResult<Vec<BlobInfo>> {
        layout::validate_container(account, container)?;

        let _guard = self.index.read();
        let root = self.layout.container_path(account, container);
        if !root.is_dir() {
            return Err(StorageError::with_message(
                ErrorCode::ContainerNotFound,
                format!("container {} does not exist", container),
            ));
        }

        let prefix = prefix.filter(|p| !p.is_empty());
        let limit = max_results.filter(|&n| n > 0).unwrap_or(usize::MAX);

        walk_blobs(&root)
            .filter(|entry| match (entry, prefix) {
                (Ok(file), Some(p)) => file.name.starts_with(p),
                _ => true,
            })
            .take(limit)
            .map(|entry| {
                let file = entry?;
                let properties = self.read_properties(account, container, &file.name);
                Ok(BlobInfo {
                    name: file.name,
                    content_type: properties.content_type,
                    content_length: file.size,
                    last_modified: file.modified,
                    metadata: properties.metadata,
                })
            })
            .collect()
    }

    // Internals

    fn create_container_dir(
        &self,
        index: &mut NamespaceIndex,
        account: &str,
        container: &str,
    ) -> StorageResult<()> {
        fs::create_dir_all(self.layout.container_path(account, container))
            .map_err(|e| StorageError::io("failed to create container directory", e))?;
        index.mark(account, container);
        Ok(())
    }

    /// Returns a read guard on the index with the container guaranteed to
    /// exist, creating it under the write lock first if needed.
    fn ensure_container(
        &self,
        account: &str,
        container: &str,
    ) -> StorageResult<RwLockReadGuard<'_, NamespaceIndex>> {
        let guard = self.index.read();
        if guard.exists(account, container) {
            return Ok(guard);
        }
        drop(guard);

        let mut index = self.index.write();
        if !index.exists(account, container) {
            self.create_container_dir(&mut index, account, container)?;
            info!(account, container, "container created implicitly");
        }
        Ok(RwLockWriteGuard::downgrade(index))
    }

    fn write_atomic(&self, target: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let staging = self.layout.staging_file();
        let result = File::create(&staging)
            .and_then(|mut file| {
                file.write_all(data)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&staging, target));

        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    /// Loads stored properties, falling back to defaults for blobs written
    /// before properties were persisted.
    fn read_properties(&self, account: &str, container: &str, blob: &str) -> BlobProperties {
        let path = self.layout.sidecar_path(account, container, blob);
        match fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(account, container, blob, error = %e, "unreadable blob properties, using defaults");
                BlobProperties::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BlobProperties::default(),
            Err(e) => {
                warn!(account, container, blob, error = %e, "failed to read blob properties, using defaults");
                BlobProperties::default()
            }
        }
    }
}

/// Striped mutexes serialising operations on the same blob.
struct BlobLocks {
    stripes: Box<[Mutex<()>]>,
}

impl BlobLocks {
    fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    fn lock(&self, account: &str, container: &str, blob: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        (account, container, blob).hash(&mut hasher);
        let stripe = (hasher.finish() % self.stripes.len() as u64) as usize;
        self.stripes[stripe].lock()
    }
}

/// A regular file found while walking a container.
struct WalkedFile {
    name: String,
    size: u64,
    modified: DateTime<Utc>,
}

/// Lazily yields every regular file under `root` as a blob name relative to
/// it, `/`-separated on every platform.
fn walk_blobs(root: &Path) -> impl Iterator<Item = StorageResult<WalkedFile>> + '_ {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                // Removed by a concurrent delete between readdir and stat.
                Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                    return None;
                }
                Err(e) => {
                    return Some(Err(StorageError::with_message(
                        ErrorCode::IoError,
                        format!("failed to walk container: {}", e),
                    )));
                }
            };

            if !entry.file_type().is_file() {
                return None;
            }

            let stat = match entry.metadata() {
                Ok(stat) => stat,
                Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                    return None;
                }
                Err(e) => {
                    return Some(Err(StorageError::with_message(
                        ErrorCode::IoError,
                        format!("failed to stat blob: {}", e),
                    )));
                }
            };

            let relative = entry.path().strip_prefix(root).ok()?;
            Some(file_times(&stat).map(|(_, modified)| WalkedFile {
                name: blob_name(relative),
                size: stat.len(),
                modified,
            }))
        })
}

/// Joins the components of a container-relative path with `/`.
fn blob_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn file_times(stat: &fs::Metadata) -> StorageResult<(DateTime<Utc>, DateTime<Utc>)> {
    let modified: SystemTime = stat
        .modified()
        .map_err(|e| StorageError::internal(format!("failed to read modification time: {}", e)))?;
    let created = stat.created().unwrap_or(modified);
    Ok((created.into(), modified.into()))
}

/// Returns the nearest ancestor of `path`, strictly inside `root`, that is a
/// regular file.
fn blocking_file(root: &Path, path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .take_while(|ancestor| *ancestor != root && ancestor.starts_with(root))
        .find(|ancestor| ancestor.is_file())
        .map(Path::to_path_buf)
}

/// Whether a failed lookup of `path` means there is no blob there.
fn is_missing(err: &io::Error, root: &Path, path: &Path) -> bool {
    err.kind() == io::ErrorKind::NotFound
        || path.is_dir()
        || blocking_file(root, path).is_some()
}

/// Reports a blob name that collides with an existing directory or blob.
fn name_conflict(root: &Path, target: &Path, blob: &str) -> Option<StorageError> {
    if target.is_dir() {
        return Some(StorageError::invalid_argument(format!(
            "blob name '{}' conflicts with an existing directory",
            blob
        )));
    }
    let file = blocking_file(root, target)?;
    let existing = file.strip_prefix(root).map(blob_name).unwrap_or_default();
    Some(StorageError::invalid_argument(format!(
        "blob name '{}' conflicts with existing blob '{}'",
        blob, existing
    )))
}

fn blob_not_found(blob: &str) -> StorageError {
    StorageError::with_message(
        ErrorCode::BlobNotFound,
        format!("blob {} does not exist", blob),
    )
}

fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Rebuilds the index from `<root>/<account>/<container>` directories.
fn load_index(root: &Path) -> StorageResult<NamespaceIndex> {
    let mut index = NamespaceIndex::new();

    for account in read_subdirs(root)? {
        for container in read_subdirs(&root.join(&account))? {
            if layout::validate_container(&account, &container).is_ok() {
                index.mark(&account, &container);
            }
        }
    }

    Ok(index)
}

fn read_subdirs(dir: &Path) -> StorageResult<Vec<String>> {
    let entries =
        fs::read_dir(dir).map_err(|e| StorageError::io("failed to scan blob directory", e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io("failed to scan blob directory", e))?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => warn!(?name, "skipping directory with non UTF-8 name"),
        }
    }
    Ok(names)
}

/// Drops staging files left behind by an interrupted write.
fn clear_staging(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if let Err(e) = fs::remove_file(entry.path()) {
            warn!(path = %entry.path().display(), error = %e, "failed to remove stale staging file");
        }
    }
}
