//! Data types shared across the module.

use std::fmt;

use strum::{Display, EnumString};

/// Kind of entry a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// A single child returned by a folder listing.
///
/// Name and kind only. Metadata is fetched lazily by the entry built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ChildEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
        }
    }
}

/// Byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bytes(u64);

impl Bytes {
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Bytes {
    fn from(count: u64) -> Self {
        Self(count)
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
        if self.0 < 1024 {
            return write!(f, "{} B", self.0);
        }
        let mut value = self.0 as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        if value.fract() == 0.0 {
            write!(f, "{} {}", value as u64, UNITS[unit])
        } else {
            write!(f, "{:.1} {}", value, UNITS[unit])
        }
    }
}

/// Metadata attribute names, used in log lines and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    Size,
    LastChange,
    Owner,
    Group,
    Permissions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_bytes_display() {
        assert_eq!(Bytes::new(0).to_string(), "0 B");
        assert_eq!(Bytes::new(512).to_string(), "512 B");
        assert_eq!(Bytes::new(1024).to_string(), "1 KiB");
        assert_eq!(Bytes::new(1536).to_string(), "1.5 KiB");
        assert_eq!(Bytes::new(5 * 1024 * 1024).to_string(), "5 MiB");
    }

    #[test]
    fn test_entry_kind_strings() {
        assert_eq!(EntryKind::Folder.to_string(), "folder");
        assert_eq!(EntryKind::from_str("file").unwrap(), EntryKind::File);
    }

    #[test]
    fn test_attribute_display() {
        assert_eq!(Attribute::LastChange.to_string(), "last_change");
    }
}
