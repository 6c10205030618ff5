//! entryfs-core: one file and folder API over local disk, memory, and any
//! registered remote transport.
//!
//! # Quick Start
//!
//! ```no_run
//! use entryfs_core::{CopyOptions, Io, IoConfig, Metadata};
//!
//! let io = Io::new(IoConfig::default())?;
//!
//! let mut site = io.folder("/srv/site", None)?;
//! site.create_if_not_exists(2)?;
//! site.file("index.html")?.write("<h1>hi</h1>")?;
//!
//! // Copy everything except logs into a staging folder.
//! let mut staging = io.folder("/srv/staging", None)?;
//! staging.create_if_not_exists(0)?;
//! let mut options = CopyOptions::new().file_filter(|file, _| file.extension() != "log");
//! site.copy(&staging, &mut options)?;
//!
//! let mut archive = io.file("/srv/site.zip", None)?;
//! io.zip_folder(&site, &mut archive)?;
//! println!("archive is {}", archive.size(true)?);
//! # Ok::<(), entryfs_core::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod vfs;

pub use config::{Compression, IoConfig};
pub use error::{Error, Result};
pub use vfs::{
    Backend, BackendRegistry, Bytes, CopyOptions, CopyTarget, Entry, EntryKind, FileEntry,
    FolderEntry, Io, Metadata, Permissions, StreamHandle, VfsPath,
};
