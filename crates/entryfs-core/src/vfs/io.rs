//! The IO factory: the only place that turns paths and stream handles into
//! entries.
//!
//! Without a handle, entries are bound to the local backend. With one, the
//! handle's kind picks a constructor from the [`BackendRegistry`].
//!
//! ```no_run
//! use entryfs_core::{Io, IoConfig, Metadata};
//!
//! let io = Io::new(IoConfig::default())?;
//! let mut file = io.file("/tmp/notes.txt", None)?;
//! file.append_line("hello")?;
//! println!("{} bytes", file.size(true)?);
//! # Ok::<(), entryfs_core::Error>(())
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use super::archive;
use super::backend::Backend;
use super::entry::{Binding, Entry};
use super::file::FileEntry;
use super::folder::FolderEntry;
use super::local::LocalBackend;
use super::memory::{MemoryBackend, MemoryStore};
use super::mime::{DataUrl, extension_for_mime_type};
use super::path::VfsPath;
use super::registry::{BackendRegistry, StreamHandle};
use crate::config::IoConfig;
use crate::error::{Error, Result};

/// Path of volatile files inside their private store.
const VOLATILE_STEM: &str = "/volatile";

/// Entry factory. Cheap to share by reference; holds no open resources.
#[derive(Debug)]
pub struct Io {
    config: IoConfig,
    registry: BackendRegistry,
    local: Arc<LocalBackend>,
}

impl Io {
    /// Factory with the built-in backends (local and `memory`).
    pub fn new(config: IoConfig) -> Result<Self> {
        let local = Arc::new(LocalBackend::with_folder_mode(config.folder_permissions()?));
        Ok(Self {
            config,
            registry: BackendRegistry::new(),
            local,
        })
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    /// Add or replace the backend constructor for a stream handle kind.
    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(&Arc<dyn StreamHandle>) -> Result<Arc<dyn Backend>> + Send + Sync + 'static,
    {
        self.registry.register(kind, constructor);
    }

    fn bind(&self, handle: Option<&Arc<dyn StreamHandle>>) -> Result<Binding> {
        match handle {
            None => Ok(Binding::new(self.local.clone(), None)),
            Some(handle) => {
                let backend = self.registry.resolve(handle)?;
                Ok(Binding::new(backend, Some(handle.clone())))
            }
        }
    }

    pub fn file(&self, path: &str, handle: Option<&Arc<dyn StreamHandle>>) -> Result<FileEntry> {
        Ok(FileEntry::new(VfsPath::file(path)?, self.bind(handle)?))
    }

    pub fn folder(&self, path: &str, handle: Option<&Arc<dyn StreamHandle>>) -> Result<FolderEntry> {
        Ok(FolderEntry::new(VfsPath::folder(path)?, self.bind(handle)?))
    }

    /// File or folder entry for `path`.
    ///
    /// A trailing separator, or an existing folder at `path`, gives a folder
    /// entry. Anything else, including a missing path, gives a file entry.
    pub fn resolve(&self, path: &str, handle: Option<&Arc<dyn StreamHandle>>) -> Result<Entry> {
        let binding = self.bind(handle)?;
        let trimmed = path.trim();
        if trimmed.is_empty() || trimmed.ends_with(['/', '\\']) {
            return Ok(Entry::Folder(FolderEntry::new(VfsPath::folder(path)?, binding)));
        }
        // A file named "a." has no valid folder form; it can only be a file.
        if let Ok(folder_path) = VfsPath::folder(path)
            && binding.backend.exists_folder(&folder_path)?
        {
            return Ok(Entry::Folder(FolderEntry::new(folder_path, binding)));
        }
        Ok(Entry::File(FileEntry::new(VfsPath::file(path)?, binding)))
    }

    /// Create a new empty temp file and return its normalized path.
    ///
    /// `prefix` defaults to the configured one; `extension` is appended
    /// after a dot.
    pub fn temp_file_path(&self, prefix: Option<&str>, extension: Option<&str>) -> Result<VfsPath> {
        let prefix = prefix.unwrap_or(self.config.temp_prefix.as_str());
        let suffix = match extension.map(|e| e.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => format!(".{}", ext),
            _ => String::new(),
        };
        let dir: PathBuf = self
            .config
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        let (_, path) = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(Error::io_with("create temp file", &dir.to_string_lossy()))?
            .keep()
            .map_err(|e| Error::io("keep temp file", dir.to_string_lossy(), e.error))?;
        debug!("created temp file {}", path.display());
        VfsPath::file(&path.to_string_lossy())
    }

    /// Local entry for a fresh temp file.
    pub fn temp_file(&self, prefix: Option<&str>, extension: Option<&str>) -> Result<FileEntry> {
        let path = self.temp_file_path(prefix, extension)?;
        Ok(FileEntry::new(path, self.bind(None)?))
    }

    /// One-shot read.
    pub fn read_file(&self, path: &str, handle: Option<&Arc<dyn StreamHandle>>) -> Result<Vec<u8>> {
        let mut file = self.file(path, handle)?;
        Ok(file.read(false)?.to_vec())
    }

    /// One-shot write; returns the written entry.
    pub fn write_file(
        &self,
        path: &str,
        content: impl AsRef<[u8]>,
        handle: Option<&Arc<dyn StreamHandle>>,
    ) -> Result<FileEntry> {
        let mut file = self.file(path, handle)?;
        file.write(content)?;
        Ok(file)
    }

    /// Empty file that lives only in memory, on a store of its own.
    pub fn volatile_file(&self) -> Result<FileEntry> {
        self.volatile_file_with_extension(None)
    }

    fn volatile_file_with_extension(&self, extension: Option<&str>) -> Result<FileEntry> {
        let store = MemoryStore::new();
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new(store.clone()));
        let handle: Arc<dyn StreamHandle> = Arc::new(store);
        let path = match extension {
            Some(ext) => VfsPath::file(&format!("{}.{}", VOLATILE_STEM, ext))?,
            None => VfsPath::file(VOLATILE_STEM)?,
        };
        let mut file = FileEntry::new(path, Binding::new(backend, Some(handle)));
        file.create()?;
        Ok(file)
    }

    /// Volatile file holding the payload of a base64 `data:` URL.
    ///
    /// The file name carries an extension matching the media type when one
    /// is known, so [`FileEntry::mime_type`] round-trips.
    pub fn from_data_url(&self, encoded: &str) -> Result<FileEntry> {
        let url = DataUrl::parse(encoded)?;
        let mut file = self.volatile_file_with_extension(extension_for_mime_type(&url.mime_type))?;
        file.write(&url.data)?;
        Ok(file)
    }

    /// Pack `folder` into `target` with the configured compression.
    pub fn zip_folder(&self, folder: &FolderEntry, target: &mut FileEntry) -> Result<usize> {
        archive::folder_to_zip(folder, target, self.config.compression)
    }

    /// Unpack `archive` into `destination`.
    pub fn extract_zip(&self, archive: &mut FileEntry, destination: &FolderEntry) -> Result<usize> {
        archive::extract_zip(archive, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::metadata::Metadata;
    use crate::vfs::registry::kind;
    use std::any::Any;
    use tempfile::TempDir;

    struct FakeSsh;

    impl StreamHandle for FakeSsh {
        fn kind(&self) -> &str {
            kind::SSH
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn io_in(dir: &TempDir) -> Io {
        let config = IoConfig {
            temp_dir: Some(dir.path().to_path_buf()),
            ..IoConfig::default()
        };
        Io::new(config).unwrap()
    }

    #[test]
    fn test_resolve_picks_kind() {
        let dir = TempDir::new().unwrap();
        let io = io_in(&dir);
        let base = dir.path().display().to_string();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(matches!(io.resolve(&format!("{base}/sub"), None).unwrap(), Entry::Folder(_)));
        assert!(matches!(io.resolve(&format!("{base}/new/"), None).unwrap(), Entry::Folder(_)));
        assert!(matches!(io.resolve(&format!("{base}/missing"), None).unwrap(), Entry::File(_)));
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = TempDir::new().unwrap();
        let io = io_in(&dir);
        std::fs::write(dir.path().join("present.txt"), "here").unwrap();

        let path = format!("{}/present.txt", dir.path().display());
        match io.resolve(&path, None).unwrap() {
            Entry::File(mut file) => assert_eq!(file.read_string(false).unwrap(), "here"),
            Entry::Folder(folder) => panic!("resolved to folder {}", folder.path()),
        }
    }

    #[test]
    fn test_unregistered_handle_is_driver_not_found() {
        let dir = TempDir::new().unwrap();
        let io = io_in(&dir);
        let handle: Arc<dyn StreamHandle> = Arc::new(FakeSsh);
        assert!(matches!(
            io.file("/x", Some(&handle)),
            Err(Error::DriverNotFound { .. })
        ));
    }

    #[test]
    fn test_register_new_kind() {
        let dir = TempDir::new().unwrap();
        let mut io = io_in(&dir);
        let store = MemoryStore::new();
        let backing = store.clone();
        io.register(kind::SSH, move |_| {
            Ok(Arc::new(MemoryBackend::new(backing.clone())) as Arc<dyn Backend>)
        });

        let handle: Arc<dyn StreamHandle> = Arc::new(FakeSsh);
        let mut file = io.write_file("/remote.txt", "over ssh", Some(&handle)).unwrap();
        assert_eq!(file.backend_name(), "memory");
        assert!(file.stream().is_some());
        assert_eq!(file.read(true).unwrap(), b"over ssh");
    }

    #[test]
    fn test_memory_handles_share_a_store() {
        let dir = TempDir::new().unwrap();
        let io = io_in(&dir);
        let handle: Arc<dyn StreamHandle> = Arc::new(MemoryStore::new());
        io.write_file("/a", "1", Some(&handle)).unwrap();
        assert_eq!(io.read_file("/a", Some(&handle)).unwrap(), b"1");
    }

    #[test]
    fn test_temp_file_path_uses_config() {
        let dir = TempDir::new().unwrap();
        let io = io_in(&dir);

        let path = io.temp_file_path(Some("report"), Some(".csv")).unwrap();
        assert!(path.name().starts_with("report"));
        assert_eq!(path.extension(), "csv");
        assert!(path.as_str().starts_with(&dir.path().display().to_string().replace('\\', "/")));
        assert!(std::path::Path::new(path.as_str()).exists());

        let default = io.temp_file(None, None).unwrap();
        assert!(default.name().starts_with("tmp"));
        assert!(default.exists().unwrap());
    }

    #[test]
    fn test_volatile_files_are_private() {
        let dir = TempDir::new().unwrap();
        let io = io_in(&dir);
        let mut first = io.volatile_file().unwrap();
        let mut second = io.volatile_file().unwrap();
        first.write("one").unwrap();
        assert!(second.is_empty().unwrap());
        assert_eq!(first.backend_name(), "memory");
        assert!(!dir.path().join("volatile").exists());
    }

    #[test]
    fn test_from_data_url() {
        let dir = TempDir::new().unwrap();
        let io = io_in(&dir);
        let mut file = io
            .from_data_url("data:image/png;base64,iVBORw0KGgo=")
            .unwrap();
        assert_eq!(file.name(), "volatile.png");
        assert_eq!(file.mime_type(), "image/png");
        assert_eq!(file.read(false).unwrap(), b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_bad_folder_mode_fails_construction() {
        let config = IoConfig {
            folder_mode: Some("nope".to_string()),
            ..IoConfig::default()
        };
        assert!(matches!(Io::new(config), Err(Error::Mode(_))));
    }
}
