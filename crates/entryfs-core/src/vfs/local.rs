//! Local filesystem backend.
//!
//! Maps `VfsPath` values straight to OS paths. The empty path (the normalized
//! form of `.`) maps to the current directory.

use std::fs::{self, DirBuilder, FileTimes, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use super::backend::Backend;
use super::path::VfsPath;
use super::permissions::Permissions;
use super::types::{Bytes, ChildEntry};
use crate::error::{Error, Result};

/// Filesystem-backed storage on the local machine.
#[derive(Debug, Default)]
pub struct LocalBackend {
    #[cfg_attr(not(unix), allow(dead_code))]
    folder_mode: Option<Permissions>,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that creates folders with `mode` (still subject to the umask).
    pub fn with_folder_mode(folder_mode: Option<Permissions>) -> Self {
        Self { folder_mode }
    }

    /// Map a VFS path to an OS path.
    fn os_path(path: &VfsPath) -> PathBuf {
        match path.as_str() {
            "" => PathBuf::from("."),
            p => PathBuf::from(p),
        }
    }

    fn stat(path: &VfsPath) -> Result<fs::Metadata> {
        fs::metadata(Self::os_path(path)).map_err(Error::io_with("stat", path.as_str()))
    }
}

impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn exists_file(&self, path: &VfsPath) -> Result<bool> {
        Self::os_path(path)
            .try_exists()
            .map_err(Error::io_with("exists", path.as_str()))
    }

    fn read_bytes(&self, path: &VfsPath) -> Result<Vec<u8>> {
        fs::read(Self::os_path(path)).map_err(Error::io_with("read", path.as_str()))
    }

    fn write_bytes(&self, path: &VfsPath, data: &[u8]) -> Result<()> {
        let write = || -> io::Result<()> {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(Self::os_path(path))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(data)?;
            writer.flush()
        };
        write().map_err(Error::io_with("write", path.as_str()))
    }

    fn delete_file(&self, path: &VfsPath) -> Result<()> {
        fs::remove_file(Self::os_path(path)).map_err(Error::io_with("delete", path.as_str()))
    }

    fn rename_file(&self, from: &VfsPath, to: &VfsPath) -> Result<()> {
        fs::rename(Self::os_path(from), Self::os_path(to))
            .map_err(Error::io_with("rename", from.as_str()))
    }

    fn touch_file(&self, path: &VfsPath, time: DateTime<Utc>) -> Result<()> {
        let touch = || -> io::Result<()> {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(Self::os_path(path))?;
            let time = SystemTime::from(time);
            file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
        };
        touch().map_err(Error::io_with("touch", path.as_str()))
    }

    fn exists_folder(&self, path: &VfsPath) -> Result<bool> {
        match fs::metadata(Self::os_path(path)) {
            Ok(meta) => Ok(meta.is_dir()),
            // A folder path naming a regular file ("a.txt/") is ENOTDIR.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(Error::io("exists", path.as_str(), e)),
        }
    }

    fn list_children(&self, path: &VfsPath) -> Result<Vec<ChildEntry>> {
        let map_err = Error::io_with("list", path.as_str());
        let mut children = Vec::new();
        for entry in fs::read_dir(Self::os_path(path)).map_err(map_err)? {
            let entry = entry.map_err(Error::io_with("list", path.as_str()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks, so a link to a folder lists as a folder.
            if entry.path().is_dir() {
                children.push(ChildEntry::folder(name));
            } else {
                children.push(ChildEntry::file(name));
            }
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    fn create_folder(&self, path: &VfsPath) -> Result<()> {
        let mut builder = DirBuilder::new();
        #[cfg(unix)]
        if let Some(mode) = self.folder_mode {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode.mode());
        }
        builder
            .create(Self::os_path(path))
            .map_err(Error::io_with("create", path.as_str()))
    }

    fn delete_folder(&self, path: &VfsPath) -> Result<()> {
        fs::remove_dir(Self::os_path(path)).map_err(Error::io_with("delete", path.as_str()))
    }

    fn rename_folder(&self, from: &VfsPath, to: &VfsPath) -> Result<()> {
        fs::rename(Self::os_path(from), Self::os_path(to))
            .map_err(Error::io_with("rename", from.as_str()))
    }

    fn size(&self, path: &VfsPath) -> Result<Bytes> {
        Ok(Bytes::new(Self::stat(path)?.len()))
    }

    fn last_change(&self, path: &VfsPath) -> Result<DateTime<Utc>> {
        let modified = Self::stat(path)?
            .modified()
            .map_err(Error::io_with("stat", path.as_str()))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    #[cfg(unix)]
    fn owner(&self, path: &VfsPath) -> Result<String> {
        use std::os::unix::fs::MetadataExt;
        Ok(Self::stat(path)?.uid().to_string())
    }

    #[cfg(not(unix))]
    fn owner(&self, _path: &VfsPath) -> Result<String> {
        Err(super::backend::not_implemented(self.name(), "owner"))
    }

    #[cfg(unix)]
    fn group(&self, path: &VfsPath) -> Result<String> {
        use std::os::unix::fs::MetadataExt;
        Ok(Self::stat(path)?.gid().to_string())
    }

    #[cfg(not(unix))]
    fn group(&self, _path: &VfsPath) -> Result<String> {
        Err(super::backend::not_implemented(self.name(), "group"))
    }

    #[cfg(unix)]
    fn permissions(&self, path: &VfsPath) -> Result<Permissions> {
        use std::os::unix::fs::PermissionsExt;
        Ok(Permissions::from_mode(Self::stat(path)?.permissions().mode()))
    }

    #[cfg(not(unix))]
    fn permissions(&self, path: &VfsPath) -> Result<Permissions> {
        let readonly = Self::stat(path)?.permissions().readonly();
        Ok(Permissions::from_mode(if readonly { 0o444 } else { 0o666 }))
    }

    #[cfg(unix)]
    fn set_owner(&self, path: &VfsPath, owner: &str) -> Result<()> {
        let uid = numeric_id(path, owner, "chown")?;
        std::os::unix::fs::chown(Self::os_path(path), Some(uid), None)
            .map_err(Error::io_with("chown", path.as_str()))
    }

    #[cfg(unix)]
    fn set_group(&self, path: &VfsPath, group: &str) -> Result<()> {
        let gid = numeric_id(path, group, "chgrp")?;
        std::os::unix::fs::chown(Self::os_path(path), None, Some(gid))
            .map_err(Error::io_with("chgrp", path.as_str()))
    }

    #[cfg(unix)]
    fn set_permissions(&self, path: &VfsPath, mode: Permissions) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(Self::os_path(path), fs::Permissions::from_mode(mode.mode()))
            .map_err(Error::io_with("chmod", path.as_str()))
    }

    fn local_path(&self, path: &VfsPath) -> Option<PathBuf> {
        Some(Self::os_path(path))
    }

    fn copy_native(&self, from: &VfsPath, to: &VfsPath) -> Option<Result<()>> {
        Some(
            fs::copy(Self::os_path(from), Self::os_path(to))
                .map(|_| ())
                .map_err(Error::io_with("copy", from.as_str())),
        )
    }
}

/// Owners and groups are numeric ids on the local backend.
#[cfg(unix)]
fn numeric_id(path: &VfsPath, value: &str, op: &'static str) -> Result<u32> {
    value.trim().parse().map_err(|_| {
        Error::io(
            op,
            path.as_str(),
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("\"{}\" is not a numeric id", value),
            ),
        )
    })
}

/// Read a local file without going through an entry.
pub(crate) fn read_os_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(Error::io_with("read", &path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalBackend) {
        let dir = TempDir::new().unwrap();
        (dir, LocalBackend::new())
    }

    fn file_in(dir: &TempDir, name: &str) -> VfsPath {
        VfsPath::file(&format!("{}/{}", dir.path().display(), name)).unwrap()
    }

    fn folder_in(dir: &TempDir, name: &str) -> VfsPath {
        VfsPath::folder(&format!("{}/{}", dir.path().display(), name)).unwrap()
    }

    #[test]
    fn test_write_and_read() {
        let (dir, backend) = setup();
        let path = file_in(&dir, "test.txt");
        backend.write_bytes(&path, b"hello").unwrap();
        assert_eq!(backend.read_bytes(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_write_truncates() {
        let (dir, backend) = setup();
        let path = file_in(&dir, "test.txt");
        backend.write_bytes(&path, b"a much longer first version").unwrap();
        backend.write_bytes(&path, b"short").unwrap();
        assert_eq!(backend.read_bytes(&path).unwrap(), b"short");
    }

    #[test]
    fn test_write_without_parent_fails() {
        let (dir, backend) = setup();
        let path = file_in(&dir, "missing/file.txt");
        assert!(backend.write_bytes(&path, b"x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_nonexistent_returns_not_found() {
        let (dir, backend) = setup();
        let err = backend.read_bytes(&file_in(&dir, "nope.txt")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_exists() {
        let (dir, backend) = setup();
        let file = file_in(&dir, "e.txt");
        assert!(!backend.exists_file(&file).unwrap());
        backend.write_bytes(&file, b"x").unwrap();
        assert!(backend.exists_file(&file).unwrap());
        assert!(!backend.exists_folder(&folder_in(&dir, "e.txt")).unwrap());
        assert!(backend.exists_folder(&folder_in(&dir, "")).unwrap());
    }

    #[test]
    fn test_exists_folder_on_regular_file_is_false() {
        let (dir, backend) = setup();
        backend.write_bytes(&file_in(&dir, "plain.txt"), b"x").unwrap();
        assert!(!backend.exists_folder(&folder_in(&dir, "plain.txt")).unwrap());
        assert!(!backend.exists_folder(&folder_in(&dir, "plain.txt/below")).unwrap());
    }

    #[test]
    fn test_delete_and_rename() {
        let (dir, backend) = setup();
        let old = file_in(&dir, "old.txt");
        let new = file_in(&dir, "new.txt");
        backend.write_bytes(&old, b"moved").unwrap();
        backend.rename_file(&old, &new).unwrap();
        assert!(!backend.exists_file(&old).unwrap());
        assert_eq!(backend.read_bytes(&new).unwrap(), b"moved");
        backend.delete_file(&new).unwrap();
        assert!(backend.delete_file(&new).unwrap_err().is_not_found());
    }

    #[test]
    fn test_folder_primitives() {
        let (dir, backend) = setup();
        let sub = folder_in(&dir, "sub");
        backend.create_folder(&sub).unwrap();
        assert!(backend.exists_folder(&sub).unwrap());
        // Non-recursive: a missing parent fails.
        assert!(backend.create_folder(&folder_in(&dir, "a/b")).is_err());

        backend.write_bytes(&file_in(&dir, "sub/f.txt"), b"x").unwrap();
        assert!(backend.delete_folder(&sub).is_err());
        backend.delete_file(&file_in(&dir, "sub/f.txt")).unwrap();
        backend.delete_folder(&sub).unwrap();
        assert!(!backend.exists_folder(&sub).unwrap());
    }

    #[test]
    fn test_list_children_sorted_with_kinds() {
        let (dir, backend) = setup();
        backend.write_bytes(&file_in(&dir, "b.txt"), b"b").unwrap();
        backend.write_bytes(&file_in(&dir, "a.txt"), b"a").unwrap();
        backend.create_folder(&folder_in(&dir, "sub")).unwrap();

        let children = backend.list_children(&folder_in(&dir, "")).unwrap();
        assert_eq!(
            children,
            vec![
                ChildEntry::file("a.txt"),
                ChildEntry::file("b.txt"),
                ChildEntry::folder("sub"),
            ]
        );
    }

    #[test]
    fn test_list_missing_folder_is_not_found() {
        let (dir, backend) = setup();
        let err = backend.list_children(&folder_in(&dir, "nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_touch_sets_mtime_and_creates() {
        let (dir, backend) = setup();
        let path = file_in(&dir, "touched.txt");
        let when = DateTime::parse_from_rfc3339("2020-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        backend.touch_file(&path, when).unwrap();
        assert!(backend.exists_file(&path).unwrap());
        assert_eq!(backend.last_change(&path).unwrap(), when);
    }

    #[test]
    fn test_size() {
        let (dir, backend) = setup();
        let path = file_in(&dir, "sized.txt");
        backend.write_bytes(&path, b"12345").unwrap();
        assert_eq!(backend.size(&path).unwrap(), Bytes::new(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_round_trip() {
        let (dir, backend) = setup();
        let path = file_in(&dir, "mode.txt");
        backend.write_bytes(&path, b"x").unwrap();
        backend
            .set_permissions(&path, Permissions::from_mode(0o640))
            .unwrap();
        assert_eq!(backend.permissions(&path).unwrap().to_string(), "0640");
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_is_numeric_uid() {
        let (dir, backend) = setup();
        let path = file_in(&dir, "owned.txt");
        backend.write_bytes(&path, b"x").unwrap();
        let owner = backend.owner(&path).unwrap();
        assert!(owner.parse::<u32>().is_ok());
        // Re-assigning the current owner is always permitted.
        backend.set_owner(&path, &owner).unwrap();
        assert!(backend.set_owner(&path, "not-a-uid").is_err());
    }

    #[test]
    fn test_copy_native() {
        let (dir, backend) = setup();
        let src = file_in(&dir, "orig.txt");
        let dst = file_in(&dir, "copy.txt");
        backend.write_bytes(&src, b"content").unwrap();
        backend.copy_native(&src, &dst).unwrap().unwrap();
        assert_eq!(backend.read_bytes(&dst).unwrap(), b"content");
        assert!(backend.exists_file(&src).unwrap());
    }
}
