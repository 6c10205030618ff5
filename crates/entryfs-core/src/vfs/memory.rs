//! In-memory backend.
//!
//! [`MemoryStore`] is a stream handle of kind `memory`: a shared tree of
//! nodes that any number of [`MemoryBackend`]s (and entries) can point at.
//! Volatile files live on a private store; tests use it to exercise the
//! handle-bound code paths without a network.
//!
//! The store follows filesystem rules: parents must exist, folders must be
//! empty to delete, files and folders cannot swap kinds. Leading slashes
//! are not significant, `/a` and `a` address the same node.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::backend::Backend;
use super::local::read_os_file;
use super::path::{VfsPath, dirname};
use super::permissions::Permissions;
use super::registry::{StreamHandle, kind};
use super::types::{Bytes, ChildEntry};
use crate::error::{Error, Result};

const FILE_MODE: Permissions = Permissions::from_mode(0o644);
const FOLDER_MODE: Permissions = Permissions::from_mode(0o755);
const DEFAULT_OWNER: &str = "0";

#[derive(Debug, Clone)]
enum Content {
    File(Vec<u8>),
    Folder,
}

#[derive(Debug, Clone)]
struct Node {
    content: Content,
    modified: DateTime<Utc>,
    owner: String,
    group: String,
    mode: Permissions,
}

impl Node {
    fn file(data: Vec<u8>) -> Self {
        Self {
            content: Content::File(data),
            modified: Utc::now(),
            owner: DEFAULT_OWNER.to_string(),
            group: DEFAULT_OWNER.to_string(),
            mode: FILE_MODE,
        }
    }

    fn folder() -> Self {
        Self {
            content: Content::Folder,
            mode: FOLDER_MODE,
            ..Self::file(Vec::new())
        }
    }

    fn is_folder(&self) -> bool {
        matches!(self.content, Content::Folder)
    }
}

type Nodes = BTreeMap<String, Node>;

/// Shared in-memory tree; clones share the same nodes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    nodes: Arc<Mutex<Nodes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Nodes> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("nodes", &self.lock().len())
            .finish()
    }
}

impl StreamHandle for MemoryStore {
    fn kind(&self) -> &str {
        kind::MEMORY
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Backend over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: MemoryStore,
}

impl MemoryBackend {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

/// Store key for a path: no leading or trailing slashes, root is `""`.
fn key(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn parent_key(key: &str) -> String {
    match dirname(key) {
        "." | "/" => String::new(),
        dir => dir.to_string(),
    }
}

fn failure(op: &'static str, path: &VfsPath, kind: io::ErrorKind, message: &str) -> Error {
    Error::io(op, path.as_str(), io::Error::new(kind, message.to_string()))
}

fn not_found(path: &VfsPath) -> Error {
    Error::NotFound {
        path: path.to_string(),
    }
}

fn is_folder(nodes: &Nodes, key: &str) -> bool {
    key.is_empty() || nodes.get(key).is_some_and(Node::is_folder)
}

/// Fail unless the folder that would contain `key` exists.
fn require_parent(nodes: &Nodes, key: &str, path: &VfsPath) -> Result<()> {
    if is_folder(nodes, &parent_key(key)) {
        Ok(())
    } else {
        Err(not_found(path))
    }
}

fn node<'a>(nodes: &'a Nodes, path: &VfsPath) -> Result<&'a Node> {
    nodes.get(&key(path.as_str())).ok_or_else(|| not_found(path))
}

fn node_mut<'a>(nodes: &'a mut Nodes, path: &VfsPath) -> Result<&'a mut Node> {
    nodes
        .get_mut(&key(path.as_str()))
        .ok_or_else(|| not_found(path))
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn exists_file(&self, path: &VfsPath) -> Result<bool> {
        let key = key(path.as_str());
        Ok(key.is_empty() || self.store.lock().contains_key(&key))
    }

    fn read_bytes(&self, path: &VfsPath) -> Result<Vec<u8>> {
        let nodes = self.store.lock();
        match &node(&nodes, path)?.content {
            Content::File(data) => Ok(data.clone()),
            Content::Folder => Err(failure(
                "read",
                path,
                io::ErrorKind::IsADirectory,
                "is a folder",
            )),
        }
    }

    fn write_bytes(&self, path: &VfsPath, data: &[u8]) -> Result<()> {
        let key = key(path.as_str());
        let mut nodes = self.store.lock();
        require_parent(&nodes, &key, path)?;
        match nodes.get_mut(&key) {
            Some(existing) if existing.is_folder() => Err(failure(
                "write",
                path,
                io::ErrorKind::IsADirectory,
                "is a folder",
            )),
            Some(existing) => {
                existing.content = Content::File(data.to_vec());
                existing.modified = Utc::now();
                Ok(())
            }
            None => {
                nodes.insert(key, Node::file(data.to_vec()));
                Ok(())
            }
        }
    }

    fn delete_file(&self, path: &VfsPath) -> Result<()> {
        let mut nodes = self.store.lock();
        if node(&nodes, path)?.is_folder() {
            return Err(failure(
                "delete",
                path,
                io::ErrorKind::IsADirectory,
                "is a folder",
            ));
        }
        nodes.remove(&key(path.as_str()));
        Ok(())
    }

    fn rename_file(&self, from: &VfsPath, to: &VfsPath) -> Result<()> {
        let (from_key, to_key) = (key(from.as_str()), key(to.as_str()));
        let mut nodes = self.store.lock();
        if node(&nodes, from)?.is_folder() {
            return Err(failure(
                "rename",
                from,
                io::ErrorKind::IsADirectory,
                "is a folder",
            ));
        }
        require_parent(&nodes, &to_key, to)?;
        if nodes.get(&to_key).is_some_and(Node::is_folder) {
            return Err(failure(
                "rename",
                to,
                io::ErrorKind::IsADirectory,
                "target is a folder",
            ));
        }
        if let Some(moved) = nodes.remove(&from_key) {
            nodes.insert(to_key, moved);
        }
        Ok(())
    }

    fn touch_file(&self, path: &VfsPath, time: DateTime<Utc>) -> Result<()> {
        let key = key(path.as_str());
        let mut nodes = self.store.lock();
        if !nodes.contains_key(&key) {
            require_parent(&nodes, &key, path)?;
            nodes.insert(key.clone(), Node::file(Vec::new()));
        }
        if let Some(node) = nodes.get_mut(&key) {
            node.modified = time;
        }
        Ok(())
    }

    fn exists_folder(&self, path: &VfsPath) -> Result<bool> {
        Ok(is_folder(&self.store.lock(), &key(path.as_str())))
    }

    fn list_children(&self, path: &VfsPath) -> Result<Vec<ChildEntry>> {
        let key = key(path.as_str());
        let nodes = self.store.lock();
        if !is_folder(&nodes, &key) {
            return Err(not_found(path));
        }
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{}/", key)
        };
        // BTreeMap order keeps the listing sorted by name.
        Ok(nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, node)| {
                let name = &k[prefix.len()..];
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some(if node.is_folder() {
                    ChildEntry::folder(name)
                } else {
                    ChildEntry::file(name)
                })
            })
            .collect())
    }

    fn create_folder(&self, path: &VfsPath) -> Result<()> {
        let key = key(path.as_str());
        let mut nodes = self.store.lock();
        if key.is_empty() || nodes.contains_key(&key) {
            return Err(failure(
                "create folder",
                path,
                io::ErrorKind::AlreadyExists,
                "already exists",
            ));
        }
        require_parent(&nodes, &key, path)?;
        nodes.insert(key, Node::folder());
        Ok(())
    }

    fn delete_folder(&self, path: &VfsPath) -> Result<()> {
        let key = key(path.as_str());
        if key.is_empty() {
            return Err(failure(
                "delete folder",
                path,
                io::ErrorKind::PermissionDenied,
                "cannot delete the root",
            ));
        }
        let mut nodes = self.store.lock();
        if !is_folder(&nodes, &key) {
            return Err(not_found(path));
        }
        let prefix = format!("{}/", key);
        if nodes.keys().any(|k| k.starts_with(&prefix)) {
            return Err(failure(
                "delete folder",
                path,
                io::ErrorKind::DirectoryNotEmpty,
                "folder is not empty",
            ));
        }
        nodes.remove(&key);
        Ok(())
    }

    fn rename_folder(&self, from: &VfsPath, to: &VfsPath) -> Result<()> {
        let (from_key, to_key) = (key(from.as_str()), key(to.as_str()));
        let mut nodes = self.store.lock();
        if from_key.is_empty() || !is_folder(&nodes, &from_key) {
            return Err(not_found(from));
        }
        if to_key == from_key || to_key.starts_with(&format!("{}/", from_key)) {
            return Err(failure(
                "rename folder",
                to,
                io::ErrorKind::InvalidInput,
                "cannot move a folder into itself",
            ));
        }
        if to_key.is_empty() || nodes.contains_key(&to_key) {
            return Err(failure(
                "rename folder",
                to,
                io::ErrorKind::AlreadyExists,
                "already exists",
            ));
        }
        require_parent(&nodes, &to_key, to)?;

        let prefix = format!("{}/", from_key);
        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| **k == from_key || k.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{}{}", to_key, &old[from_key.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    fn size(&self, path: &VfsPath) -> Result<Bytes> {
        let nodes = self.store.lock();
        Ok(match &node(&nodes, path)?.content {
            Content::File(data) => Bytes::new(data.len() as u64),
            Content::Folder => Bytes::new(0),
        })
    }

    fn last_change(&self, path: &VfsPath) -> Result<DateTime<Utc>> {
        Ok(node(&self.store.lock(), path)?.modified)
    }

    fn owner(&self, path: &VfsPath) -> Result<String> {
        Ok(node(&self.store.lock(), path)?.owner.clone())
    }

    fn group(&self, path: &VfsPath) -> Result<String> {
        Ok(node(&self.store.lock(), path)?.group.clone())
    }

    fn permissions(&self, path: &VfsPath) -> Result<Permissions> {
        Ok(node(&self.store.lock(), path)?.mode)
    }

    fn set_owner(&self, path: &VfsPath, owner: &str) -> Result<()> {
        node_mut(&mut self.store.lock(), path)?.owner = owner.to_string();
        Ok(())
    }

    fn set_group(&self, path: &VfsPath, group: &str) -> Result<()> {
        node_mut(&mut self.store.lock(), path)?.group = group.to_string();
        Ok(())
    }

    fn set_permissions(&self, path: &VfsPath, mode: Permissions) -> Result<()> {
        node_mut(&mut self.store.lock(), path)?.mode = mode;
        Ok(())
    }

    fn copy_native(&self, from: &VfsPath, to: &VfsPath) -> Option<Result<()>> {
        let data = match self.read_bytes(from) {
            Ok(data) => data,
            Err(e) => return Some(Err(e)),
        };
        Some(self.write_bytes(to, &data))
    }

    fn upload_local_file(&self, source: &Path, to: &VfsPath) -> Option<Result<()>> {
        Some(read_os_file(source).and_then(|data| self.write_bytes(to, &data)))
    }
}
