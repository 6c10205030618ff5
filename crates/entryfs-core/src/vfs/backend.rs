//! Backend trait: the primitive storage contract.
//!
//! Backends supply only primitives: existence checks, whole-content reads
//! and writes, non-recursive create/delete, rename and attribute access.
//! Everything built on top (copy, clear, recursive delete, line reading,
//! zipping) lives in the entry types and works the same on every backend.
//!
//! # Implementing a backend
//!
//! Implement the required methods. The `VfsPath` values you receive are
//! already normalized; folder paths end with `/`. Return
//! [`Error::NotFound`](crate::Error::NotFound) for missing entries (the
//! [`Error::io`](crate::Error::io) helper does this for `std::io` errors).
//!
//! The optional hooks at the bottom of the trait let a backend offer faster
//! paths for copies; entries only use them when both sides agree.
//!
//! # Blocking
//!
//! Every call blocks until the backend is done. Timeouts and retries belong
//! to the transport behind a remote backend, not to this layer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::path::VfsPath;
use super::permissions::Permissions;
use super::types::{Bytes, ChildEntry};
use crate::error::{Error, Result};

/// Storage backend for file and folder entries.
pub trait Backend: Send + Sync {
    /// Short backend name for logs and errors, e.g. `"local"`.
    fn name(&self) -> &'static str;

    // -- file primitives --

    /// Whether anything exists at a file path.
    fn exists_file(&self, path: &VfsPath) -> Result<bool>;

    fn read_bytes(&self, path: &VfsPath) -> Result<Vec<u8>>;

    /// Create or truncate the file, then write `data`.
    fn write_bytes(&self, path: &VfsPath, data: &[u8]) -> Result<()>;

    fn delete_file(&self, path: &VfsPath) -> Result<()>;

    fn rename_file(&self, from: &VfsPath, to: &VfsPath) -> Result<()>;

    /// Set the modification time, creating an empty file if none exists.
    fn touch_file(&self, path: &VfsPath, time: DateTime<Utc>) -> Result<()>;

    // -- folder primitives --

    fn exists_folder(&self, path: &VfsPath) -> Result<bool>;

    /// Direct children, without `.` and `..`.
    fn list_children(&self, path: &VfsPath) -> Result<Vec<ChildEntry>>;

    /// Create a single folder. The parent must exist.
    fn create_folder(&self, path: &VfsPath) -> Result<()>;

    /// Delete an empty folder.
    fn delete_folder(&self, path: &VfsPath) -> Result<()>;

    fn rename_folder(&self, from: &VfsPath, to: &VfsPath) -> Result<()>;

    // -- metadata primitives --

    fn size(&self, path: &VfsPath) -> Result<Bytes>;

    fn last_change(&self, path: &VfsPath) -> Result<DateTime<Utc>>;

    fn owner(&self, path: &VfsPath) -> Result<String>;

    fn group(&self, path: &VfsPath) -> Result<String>;

    fn permissions(&self, path: &VfsPath) -> Result<Permissions>;

    fn set_owner(&self, _path: &VfsPath, _owner: &str) -> Result<()> {
        Err(not_implemented(self.name(), "set_owner"))
    }

    fn set_group(&self, _path: &VfsPath, _group: &str) -> Result<()> {
        Err(not_implemented(self.name(), "set_group"))
    }

    fn set_permissions(&self, _path: &VfsPath, _mode: Permissions) -> Result<()> {
        Err(not_implemented(self.name(), "set_permissions"))
    }

    // -- optional capabilities --

    /// OS path backing `path`, for backends that live on the local disk.
    fn local_path(&self, _path: &VfsPath) -> Option<PathBuf> {
        None
    }

    /// Copy within this backend without going through memory.
    ///
    /// Only called when source and target share the same backend instance.
    /// `None` means "not supported, use the portable path".
    fn copy_native(&self, _from: &VfsPath, _to: &VfsPath) -> Option<Result<()>> {
        None
    }

    /// Upload a file from the local disk straight to `to`.
    ///
    /// Remote transports that can stream a local file (FTP `put` and the
    /// like) override this. `None` means "not supported".
    fn upload_local_file(&self, _source: &Path, _to: &VfsPath) -> Option<Result<()>> {
        None
    }
}

pub(crate) fn not_implemented(backend: &'static str, operation: &'static str) -> Error {
    Error::NotImplemented { backend, operation }
}
