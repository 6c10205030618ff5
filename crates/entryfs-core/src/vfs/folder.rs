//! Folder entries and the recursive operations built on them.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::backend::Backend;
use super::entry::{Binding, Entry};
use super::file::FileEntry;
use super::metadata::{AttributeCache, Metadata, sealed};
use super::path::{VfsPath, validate_name};
use super::registry::StreamHandle;
use super::types::{ChildEntry, EntryKind};
use crate::error::{Error, Result};

/// Decides per item whether [`FolderEntry::copy`] copies it. Receives the
/// source and the would-be destination.
pub type FileFilter<'f> = Box<dyn FnMut(&FileEntry, &FileEntry) -> bool + 'f>;
pub type FolderFilter<'f> = Box<dyn FnMut(&FolderEntry, &FolderEntry) -> bool + 'f>;

/// Filters for a recursive folder copy. Both default to "copy everything".
#[derive(Default)]
pub struct CopyOptions<'f> {
    file_filter: Option<FileFilter<'f>>,
    folder_filter: Option<FolderFilter<'f>>,
}

impl<'f> CopyOptions<'f> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip files for which `filter` returns false.
    pub fn file_filter(mut self, filter: impl FnMut(&FileEntry, &FileEntry) -> bool + 'f) -> Self {
        self.file_filter = Some(Box::new(filter));
        self
    }

    /// Skip folders (and everything below them) for which `filter` returns
    /// false.
    pub fn folder_filter(
        mut self,
        filter: impl FnMut(&FolderEntry, &FolderEntry) -> bool + 'f,
    ) -> Self {
        self.folder_filter = Some(Box::new(filter));
        self
    }
}

/// A folder on some backend. Listings are never cached.
pub struct FolderEntry {
    path: VfsPath,
    binding: Binding,
    cache: AttributeCache,
}

impl FolderEntry {
    pub(crate) fn new(path: VfsPath, binding: Binding) -> Self {
        Self {
            path,
            binding,
            cache: AttributeCache::default(),
        }
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    /// Current cache state, without touching the backend.
    pub fn cached(&self) -> &AttributeCache {
        &self.cache
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn stream(&self) -> Option<&Arc<dyn StreamHandle>> {
        self.binding.handle.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.binding.backend.name()
    }

    /// Path of the containing folder; root and `.` have none.
    pub fn parent_path(&self) -> Result<VfsPath> {
        match self.path.as_str() {
            "/" | "" => Err(Error::Path {
                path: self.path.to_string(),
                reason: "has no parent folder",
            }),
            _ => Ok(self.path.container()),
        }
    }

    pub fn parent(&self) -> Result<FolderEntry> {
        Ok(FolderEntry::new(self.parent_path()?, self.binding.clone()))
    }

    /// File entry for `name` inside this folder. It need not exist.
    pub fn file(&self, name: &str) -> Result<FileEntry> {
        validate_name(name)?;
        Ok(FileEntry::new(
            self.path.child_file(name)?,
            self.binding.clone(),
        ))
    }

    /// Folder entry for `name` inside this folder. It need not exist.
    pub fn folder(&self, name: &str) -> Result<FolderEntry> {
        validate_name(name)?;
        Ok(FolderEntry::new(
            self.path.child_folder(name)?,
            self.binding.clone(),
        ))
    }

    fn children(&self) -> Result<Vec<ChildEntry>> {
        self.binding.backend.list_children(&self.path)
    }

    /// Direct file children, sorted by name.
    pub fn files(&self) -> Result<Vec<FileEntry>> {
        self.children()?
            .into_iter()
            .filter(|child| child.kind == EntryKind::File)
            .map(|child| self.file(&child.name))
            .collect()
    }

    /// Direct folder children, sorted by name.
    pub fn folders(&self) -> Result<Vec<FolderEntry>> {
        self.children()?
            .into_iter()
            .filter(|child| child.kind == EntryKind::Folder)
            .map(|child| self.folder(&child.name))
            .collect()
    }

    /// Folders first, then files.
    pub fn files_and_folders(&self) -> Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = self.folders()?.into_iter().map(Entry::Folder).collect();
        entries.extend(self.files()?.into_iter().map(Entry::File));
        Ok(entries)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.children()?.is_empty())
    }

    /// Create this folder. The parent must exist.
    pub fn create(&mut self) -> Result<()> {
        debug!("{}: create folder {}", self.backend_name(), self.path);
        self.binding.backend.create_folder(&self.path)?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Create this folder if it is missing, first creating up to `depth`
    /// missing ancestors. With `depth == 0` the parent must already exist.
    pub fn create_if_not_exists(&mut self, depth: u32) -> Result<()> {
        if self.exists()? {
            return Ok(());
        }
        if depth > 0
            && let Ok(mut parent) = self.parent()
        {
            parent.create_if_not_exists(depth - 1)?;
        }
        info!("creating missing folder {}", self.path);
        self.create()
    }

    /// Delete every child, depth first. The folder itself stays.
    ///
    /// Stops at the first failure; whatever was deleted stays deleted.
    pub fn clear(&mut self) -> Result<()> {
        for file in self.files()? {
            file.delete()?;
        }
        for folder in self.folders()? {
            folder.delete_recursive()?;
        }
        self.cache.invalidate_content();
        Ok(())
    }

    /// Delete this folder, which must be empty. The entry is consumed.
    pub fn delete(self) -> Result<()> {
        debug!("{}: delete folder {}", self.backend_name(), self.path);
        self.binding.backend.delete_folder(&self.path)
    }

    /// Delete this folder with everything in it.
    pub fn delete_recursive(mut self) -> Result<()> {
        self.clear()?;
        self.delete()
    }

    /// Rename within the same parent folder.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        let container = self.parent_path()?;
        let target = container.child_folder(new_name)?;
        let backend = &self.binding.backend;
        if backend.exists_folder(&target)? || backend.exists_file(&container.child_file(new_name)?)? {
            return Err(Error::Conflict {
                path: target.to_string(),
            });
        }
        debug!(
            "{}: rename folder {} -> {}",
            self.backend_name(),
            self.path,
            target
        );
        self.binding.backend.rename_folder(&self.path, &target)?;
        self.path = target;
        self.cache.invalidate_content();
        Ok(())
    }

    /// Copy the contents of this folder into `destination`, which must exist.
    ///
    /// Files are copied with `replace = true`. Missing destination subfolders
    /// are created. A destination that is this folder or lies inside it is
    /// an [`Error::Path`]. Best effort: the first failure aborts and leaves
    /// the destination partly populated.
    pub fn copy(&self, destination: &FolderEntry, options: &mut CopyOptions<'_>) -> Result<()> {
        if self.contains(destination) {
            return Err(Error::Path {
                path: destination.path.to_string(),
                reason: "is the copied folder or lies inside it",
            });
        }
        self.copy_into(destination, options)
    }

    fn copy_into(&self, destination: &FolderEntry, options: &mut CopyOptions<'_>) -> Result<()> {
        for mut file in self.files()? {
            let target = destination.file(file.name())?;
            if let Some(filter) = options.file_filter.as_mut()
                && !filter(&file, &target)
            {
                debug!("copy: skipping {}", file.path());
                continue;
            }
            file.copy(&target, true)?;
        }

        for folder in self.folders()? {
            let mut target = destination.folder(folder.name())?;
            if let Some(filter) = options.folder_filter.as_mut()
                && !filter(&folder, &target)
            {
                debug!("copy: skipping {}", folder.path());
                continue;
            }
            if !target.exists()? {
                target.create()?;
            }
            folder.copy_into(&target, options)?;
        }
        Ok(())
    }

    /// Whether `other` is this folder or one below it, on the same storage.
    fn contains(&self, other: &FolderEntry) -> bool {
        if !self.binding.same_storage(&other.binding) {
            return false;
        }
        // The relative root holds relative paths only.
        if self.path.as_str().is_empty() {
            return !other.path.as_str().starts_with('/');
        }
        other.path.strip_root(&self.path).is_some()
    }

    /// A fresh entry for the same path and backend.
    pub fn get_clone(&self) -> FolderEntry {
        FolderEntry::new(self.path.clone(), self.binding.clone())
    }

    /// Move this entry to a path below it, e.g. `cd("logs/2024")`.
    pub fn cd(&mut self, relative: &str) -> Result<()> {
        self.path = VfsPath::folder(&format!("{}{}", self.path, relative))?;
        self.cache = AttributeCache::default();
        Ok(())
    }

    /// Delete up to `max_count` direct files last changed before `cutoff`,
    /// in name order. Returns how many were deleted.
    pub fn prune_files_older_than(&self, cutoff: DateTime<Utc>, max_count: usize) -> Result<usize> {
        let mut deleted = 0;
        for mut file in self.files()? {
            if deleted >= max_count {
                break;
            }
            if file.last_change(false)? < cutoff {
                file.delete()?;
                deleted += 1;
            }
        }
        if deleted > 0 {
            info!("pruned {} file(s) from {}", deleted, self.path);
        }
        Ok(deleted)
    }
}

impl sealed::Parts for FolderEntry {
    fn parts(&mut self) -> (&dyn Backend, &VfsPath, &mut AttributeCache) {
        (self.binding.backend.as_ref(), &self.path, &mut self.cache)
    }
}

impl Metadata for FolderEntry {
    fn exists(&self) -> Result<bool> {
        self.binding.backend.exists_folder(&self.path)
    }
}

impl fmt::Debug for FolderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderEntry")
            .field("path", &self.path)
            .field("binding", &self.binding)
            .finish()
    }
}
