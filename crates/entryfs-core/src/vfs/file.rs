//! File entries.
//!
//! A [`FileEntry`] is a path bound to a backend. Everything here is built on
//! the backend primitives, so the same call sequence behaves the same on the
//! local disk, in memory, or on any registered remote backend.

use std::fmt;
use std::io;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use log::debug;
use regex::Regex;

use super::backend::Backend;
use super::entry::{Binding, CopyTarget};
use super::folder::FolderEntry;
use super::metadata::{AttributeCache, Metadata, sealed};
use super::mime::{DataUrl, mime_type_for_extension};
use super::path::{VfsPath, validate_name};
use super::registry::StreamHandle;
use crate::error::{Error, Result};

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("static regex"));

/// A file on some backend, with a lazily filled content cache.
pub struct FileEntry {
    path: VfsPath,
    binding: Binding,
    content: Option<Vec<u8>>,
    cache: AttributeCache,
}

impl FileEntry {
    pub(crate) fn new(path: VfsPath, binding: Binding) -> Self {
        Self {
            path,
            binding,
            content: None,
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

    /// File name with extension.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        self.path.stem()
    }

    pub fn extension(&self) -> &str {
        self.path.extension()
    }

    /// Path of the containing folder.
    pub fn folder_path(&self) -> VfsPath {
        self.path.container()
    }

    /// The containing folder, on the same backend.
    pub fn folder(&self) -> FolderEntry {
        FolderEntry::new(self.folder_path(), self.binding.clone())
    }

    /// Stream handle this entry was resolved through, if any.
    pub fn stream(&self) -> Option<&Arc<dyn StreamHandle>> {
        self.binding.handle.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.binding.backend.name()
    }

    /// Content, from the cache unless `forced` or nothing is cached yet.
    pub fn read(&mut self, forced: bool) -> Result<&[u8]> {
        if forced || self.content.is_none() {
            self.content = Some(self.binding.backend.read_bytes(&self.path)?);
        }
        Ok(self.content.as_deref().unwrap_or_default())
    }

    /// Content as UTF-8 text.
    pub fn read_string(&mut self, forced: bool) -> Result<String> {
        let bytes = self.read(forced)?.to_vec();
        String::from_utf8(bytes).map_err(|e| {
            Error::io(
                "read",
                self.path.as_str(),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Content split on `\r\n`, `\r` or `\n`.
    ///
    /// A single trailing line break does not produce an empty last line.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let text = self.read_string(false)?;
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let mut lines: Vec<String> = LINE_BREAK.split(&text).map(str::to_string).collect();
        if lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        Ok(lines)
    }

    /// Replace the content. Clears the content cache and marks size and
    /// modification time stale.
    pub fn write(&mut self, content: impl AsRef<[u8]>) -> Result<()> {
        let content = content.as_ref();
        debug!(
            "{}: write {} ({} bytes)",
            self.backend_name(),
            self.path,
            content.len()
        );
        self.binding.backend.write_bytes(&self.path, content)?;
        self.content = None;
        self.cache.invalidate_content();
        Ok(())
    }

    /// Append to the content; a missing file counts as empty.
    ///
    /// Read, then write: not atomic against other writers.
    pub fn append(&mut self, value: impl AsRef<[u8]>) -> Result<()> {
        let mut content = match self.read(false) {
            Ok(existing) => existing.to_vec(),
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        content.extend_from_slice(value.as_ref());
        self.write(content)
    }

    pub fn append_line(&mut self, value: &str) -> Result<()> {
        self.append(format!("{}\n", value))
    }

    /// Create the file empty (truncating an existing one).
    pub fn create(&mut self) -> Result<()> {
        debug!("{}: create {}", self.backend_name(), self.path);
        self.binding.backend.write_bytes(&self.path, b"")?;
        self.content = None;
        self.cache.invalidate_content();
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.write(b"")
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.read(false)?.is_empty())
    }

    /// Rename within the same folder.
    ///
    /// Fails with [`Error::Name`] before any I/O if `new_name` contains a
    /// separator, and with [`Error::Conflict`] if the sibling exists.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        let target = self.path.container().child_file(new_name)?;
        if self.binding.backend.exists_file(&target)? {
            return Err(Error::Conflict {
                path: target.to_string(),
            });
        }
        debug!(
            "{}: rename {} -> {}",
            self.backend_name(),
            self.path,
            target
        );
        self.binding.backend.rename_file(&self.path, &target)?;
        self.path = target;
        self.cache.invalidate_content();
        Ok(())
    }

    /// Delete the file. The entry is consumed.
    pub fn delete(self) -> Result<()> {
        debug!("{}: delete {}", self.backend_name(), self.path);
        self.binding.backend.delete_file(&self.path)
    }

    /// Set the modification time (now when `None`), creating the file if
    /// needed.
    pub fn touch(&mut self, time: Option<DateTime<Utc>>) -> Result<()> {
        let time = time.unwrap_or_else(Utc::now);
        debug!("{}: touch {} at {}", self.backend_name(), self.path, time);
        self.binding.backend.touch_file(&self.path, time)?;
        self.cache.invalidate_content();
        Ok(())
    }

    /// Copy this file and return an entry for the copy.
    ///
    /// A folder target means "same name inside that folder". Without
    /// `replace`, an existing target is a [`Error::Conflict`]; with it, a
    /// copy onto the file itself leaves it untouched. Within one
    /// backend instance its native copy is used; from a local file to a
    /// backend that can upload local files, the upload is used; otherwise
    /// the content is read and written.
    pub fn copy<'a>(&mut self, target: impl Into<CopyTarget<'a>>, replace: bool) -> Result<FileEntry> {
        let mut target = match target.into() {
            CopyTarget::File(file) => file.get_clone(),
            CopyTarget::Folder(folder) => folder.file(self.name())?,
        };
        if !replace && target.exists()? {
            return Err(Error::Conflict {
                path: target.path.to_string(),
            });
        }
        if self.path == target.path && self.binding.same_storage(&target.binding) {
            debug!("{}: copy {} onto itself, skipped", self.backend_name(), self.path);
            return Ok(target);
        }
        debug!(
            "{}: copy {} -> {}: {}",
            self.backend_name(),
            self.path,
            target.backend_name(),
            target.path
        );

        if self.binding.shares_backend_with(&target.binding)
            && let Some(result) = self.binding.backend.copy_native(&self.path, &target.path)
        {
            result?;
            target.cache.invalidate_content();
            return Ok(target);
        }

        if let Some(source) = self.binding.backend.local_path(&self.path)
            && let Some(result) = target.binding.backend.upload_local_file(&source, &target.path)
        {
            result?;
            target.cache.invalidate_content();
            return Ok(target);
        }

        target.write(self.read(false)?)?;
        Ok(target)
    }

    /// MIME type from the extension.
    pub fn mime_type(&self) -> &'static str {
        mime_type_for_extension(self.extension())
    }

    /// `data:<mime>;base64,<content>`.
    pub fn to_data_url(&mut self) -> Result<String> {
        let mime_type = self.mime_type();
        Ok(DataUrl::encode(mime_type, self.read(false)?))
    }

    /// A fresh entry for the same path and backend, with empty caches.
    pub fn get_clone(&self) -> FileEntry {
        FileEntry::new(self.path.clone(), self.binding.clone())
    }
}

impl sealed::Parts for FileEntry {
    fn parts(&mut self) -> (&dyn Backend, &VfsPath, &mut AttributeCache) {
        (self.binding.backend.as_ref(), &self.path, &mut self.cache)
    }
}

impl Metadata for FileEntry {
    fn exists(&self) -> Result<bool> {
        self.binding.backend.exists_file(&self.path)
    }
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.path)
            .field("binding", &self.binding)
            .field("content_cached", &self.content.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::memory::{MemoryBackend, MemoryStore};
    use crate::vfs::local::LocalBackend;
    use crate::vfs::metadata::Cached;
    use tempfile::TempDir;

    fn memory_file(path: &str) -> FileEntry {
        let store = MemoryStore::new();
        let binding = Binding::new(
            Arc::new(MemoryBackend::new(store.clone())),
            Some(Arc::new(store)),
        );
        FileEntry::new(VfsPath::file(path).unwrap(), binding)
    }

    fn local_file(dir: &TempDir, name: &str) -> FileEntry {
        let path = VfsPath::file(&format!("{}/{}", dir.path().display(), name)).unwrap();
        FileEntry::new(path, Binding::new(Arc::new(LocalBackend::new()), None))
    }

    #[test]
    fn test_copy_onto_itself_keeps_content() {
        let dir = TempDir::new().unwrap();
        let mut file = local_file(&dir, "same.txt");
        file.write("payload").unwrap();

        // Separately built entry for the same path.
        let mut copy = file.copy(&local_file(&dir, "same.txt"), true).unwrap();
        assert_eq!(copy.read(true).unwrap(), b"payload");
        let same = file.get_clone();
        let mut copy = file.copy(&same, true).unwrap();
        assert_eq!(copy.read(true).unwrap(), b"payload");

        let err = file.copy(&same, false).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(file.read(true).unwrap(), b"payload");
    }

    #[test]
    fn test_write_clears_content_cache() {
        let mut file = memory_file("/a.txt");
        file.write("one").unwrap();
        assert_eq!(file.read(false).unwrap(), b"one");
        file.write("two").unwrap();
        assert_eq!(file.read(false).unwrap(), b"two");
    }

    #[test]
    fn test_read_lines_mixed_breaks() {
        let mut file = memory_file("/lines.txt");
        file.write("a\r\nb\rc\nd\n").unwrap();
        assert_eq!(file.read_lines().unwrap(), vec!["a", "b", "c", "d"]);

        file.write("x\n\ny").unwrap();
        assert_eq!(file.read_lines().unwrap(), vec!["x", "", "y"]);

        file.clear().unwrap();
        assert!(file.read_lines().unwrap().is_empty());
    }

    #[test]
    fn test_append_line_on_missing_file() {
        let mut file = memory_file("/log.txt");
        file.append_line("first").unwrap();
        file.append_line("second").unwrap();
        assert_eq!(file.read_string(false).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_is_empty_follows_content() {
        let mut file = memory_file("/e");
        file.create().unwrap();
        assert!(file.is_empty().unwrap());
        file.write("x").unwrap();
        assert!(!file.is_empty().unwrap());
    }

    #[test]
    fn test_read_string_rejects_invalid_utf8() {
        let mut file = memory_file("/bin");
        file.write([0xff_u8, 0xfe]).unwrap();
        assert!(matches!(file.read_string(false), Err(Error::Io { .. })));
    }

    #[test]
    fn test_rename_rejects_separator_before_io() {
        let mut file = memory_file("/never-written");
        assert!(matches!(file.rename("a/b"), Err(Error::Name { .. })));
        assert_eq!(file.path().as_str(), "/never-written");
    }

    #[test]
    fn test_rename_rebinds_path() {
        let mut file = memory_file("/old.txt");
        file.write("x").unwrap();
        file.rename("new.txt").unwrap();
        assert_eq!(file.path().as_str(), "/new.txt");
        assert_eq!(file.read(true).unwrap(), b"x");
    }

    #[test]
    fn test_write_marks_size_stale() {
        let mut file = memory_file("/s");
        file.write("abc").unwrap();
        assert_eq!(file.size(false).unwrap().as_u64(), 3);
        file.write("abcdef").unwrap();
        assert_eq!(file.cached().size, Cached::Stale);
        assert_eq!(file.size(false).unwrap().as_u64(), 6);
    }

    #[test]
    fn test_names_and_mime() {
        let file = memory_file("/docs/report.final.PDF");
        assert_eq!(file.name(), "report.final.PDF");
        assert_eq!(file.stem(), "report.final");
        assert_eq!(file.extension(), "PDF");
        assert_eq!(file.mime_type(), "application/pdf");
        assert_eq!(file.folder_path().as_str(), "/docs/");
    }

    #[test]
    fn test_to_data_url() {
        let mut file = memory_file("/hello.txt");
        file.write("hello").unwrap();
        assert_eq!(
            file.to_data_url().unwrap(),
            "data:text/plain;base64,aGVsbG8="
        );
    }

    #[test]
    fn test_delete_consumes_entry() {
        let mut file = memory_file("/gone");
        file.write("x").unwrap();
        let again = file.get_clone();
        file.delete().unwrap();
        assert!(!again.exists().unwrap());
    }
}
