//! Rendering of entry metadata for `entryfs stat`.

use std::fmt;

use entryfs_core::{Entry, EntryKind, Metadata};
use serde::Serialize;

/// Snapshot of one entry's metadata, printable as text or JSON.
#[derive(Debug, Serialize)]
pub struct StatReport {
    pub path: String,
    pub kind: String,
    pub size: u64,
    pub size_human: String,
    /// RFC 3339, UTC.
    pub last_change: String,
    pub owner: String,
    pub group: String,
    /// Octal, e.g. `0644`.
    pub mode: String,
}

impl StatReport {
    pub fn collect(entry: Entry) -> entryfs_core::Result<Self> {
        let kind = entry.kind();
        let path = entry.path().to_string();
        match entry {
            Entry::File(mut file) => Self::from_metadata(path, kind, &mut file),
            Entry::Folder(mut folder) => Self::from_metadata(path, kind, &mut folder),
        }
    }

    fn from_metadata<M: Metadata>(
        path: String,
        kind: EntryKind,
        entry: &mut M,
    ) -> entryfs_core::Result<Self> {
        let size = entry.size(false)?;
        Ok(Self {
            path,
            kind: kind.to_string(),
            size: size.as_u64(),
            size_human: size.to_string(),
            last_change: entry.last_change(false)?.to_rfc3339(),
            owner: entry.owner(false)?,
            group: entry.group(false)?,
            mode: entry.permissions(false)?.to_string(),
        })
    }
}

impl fmt::Display for StatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path:        {}", self.path)?;
        writeln!(f, "kind:        {}", self.kind)?;
        writeln!(f, "size:        {} ({} bytes)", self.size_human, self.size)?;
        writeln!(f, "last change: {}", self.last_change)?;
        writeln!(f, "owner:       {}", self.owner)?;
        writeln!(f, "group:       {}", self.group)?;
        write!(f, "mode:        {}", self.mode)
    }
}
