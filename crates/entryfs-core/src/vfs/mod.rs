//! Backend-agnostic files and folders.
//!
//! # Architecture
//!
//! ```text
//! caller  ->  Io (factory)  ->  FileEntry / FolderEntry (derived ops)  ->  Backend (primitives)
//! ```
//!
//! Backends supply a small set of primitives: existence, whole-content read
//! and write, non-recursive create and delete, rename, attributes. Entries
//! build everything else on top of them (copy, clear, recursive delete,
//! line reading, zip packing), once, for every backend.
//!
//! Entries without a stream handle use the local filesystem. Entries with
//! one resolve their backend through the [`BackendRegistry`] by the handle's
//! kind; `memory` is built in, remote transports register their own.

pub mod archive;
pub mod backend;
mod entry;
mod file;
mod folder;
mod io;
pub mod local;
pub mod memory;
pub mod metadata;
pub mod mime;
pub mod path;
pub mod permissions;
pub mod registry;
pub mod types;

pub use backend::Backend;
pub use entry::{CopyTarget, Entry};
pub use file::FileEntry;
pub use folder::{CopyOptions, FileFilter, FolderEntry, FolderFilter};
pub use io::Io;
pub use local::LocalBackend;
pub use memory::{MemoryBackend, MemoryStore};
pub use metadata::{AttributeCache, Cached, Metadata};
pub use mime::{DataUrl, mime_type_for_extension};
pub use path::{VfsPath, normalize, validate_name};
pub use permissions::Permissions;
pub use registry::{BackendRegistry, StreamHandle};
pub use types::{Attribute, Bytes, ChildEntry, EntryKind};
