//! What ties an entry to its storage, and the file-or-folder sum type.

use std::fmt;
use std::sync::Arc;

use super::backend::Backend;
use super::file::FileEntry;
use super::folder::FolderEntry;
use super::path::VfsPath;
use super::registry::StreamHandle;
use super::types::EntryKind;

/// Backend plus the stream handle it was resolved from (none for local).
///
/// Cloning shares both; entries listed from a folder inherit its binding.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) handle: Option<Arc<dyn StreamHandle>>,
}

impl Binding {
    pub(crate) fn new(backend: Arc<dyn Backend>, handle: Option<Arc<dyn StreamHandle>>) -> Self {
        Self { backend, handle }
    }

    pub(crate) fn shares_backend_with(&self, other: &Binding) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    /// Whether both bindings reach the same stored entries, even through
    /// separately resolved backend instances.
    pub(crate) fn same_storage(&self, other: &Binding) -> bool {
        if self.shares_backend_with(other) {
            return true;
        }
        match (&self.handle, &other.handle) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => self.backend.name() == other.backend.name(),
            _ => false,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("backend", &self.backend.name())
            .field("handle", &self.handle.as_ref().map(|h| h.kind().to_string()))
            .finish()
    }
}

/// A resolved entry.
#[derive(Debug)]
pub enum Entry {
    File(FileEntry),
    Folder(FolderEntry),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File(_) => EntryKind::File,
            Entry::Folder(_) => EntryKind::Folder,
        }
    }

    pub fn path(&self) -> &VfsPath {
        match self {
            Entry::File(file) => file.path(),
            Entry::Folder(folder) => folder.path(),
        }
    }

    pub fn name(&self) -> &str {
        self.path().name()
    }

    pub fn into_file(self) -> Option<FileEntry> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Folder(_) => None,
        }
    }

    pub fn into_folder(self) -> Option<FolderEntry> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::File(_) => None,
        }
    }
}

/// Where [`FileEntry::copy`] should put the copy.
#[derive(Debug, Clone, Copy)]
pub enum CopyTarget<'a> {
    /// Exactly this file.
    File(&'a FileEntry),
    /// A file with the source's name inside this folder.
    Folder(&'a FolderEntry),
}

impl<'a> From<&'a FileEntry> for CopyTarget<'a> {
    fn from(file: &'a FileEntry) -> Self {
        CopyTarget::File(file)
    }
}

impl<'a> From<&'a FolderEntry> for CopyTarget<'a> {
    fn from(folder: &'a FolderEntry) -> Self {
        CopyTarget::Folder(folder)
    }
}
