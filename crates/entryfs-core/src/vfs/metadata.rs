//! Lazily fetched, entry-local attribute cache.
//!
//! Each attribute moves through [`Cached`]: it starts `Unloaded`, becomes
//! `Cached` on first access, and turns `Stale` when a mutation issued through
//! the owning entry (write, rename, touch) may have changed it. `renew = true`
//! resets it to `Unloaded` before reading.
//!
//! Changes made to the backend behind the entry's back are not detected;
//! callers that suspect them pass `renew = true`.

use chrono::{DateTime, Utc};
use log::debug;

use super::backend::Backend;
use super::path::VfsPath;
use super::permissions::Permissions;
use super::types::{Attribute, Bytes};
use crate::error::Result;

/// State of one cached attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cached<T> {
    #[default]
    Unloaded,
    Cached(T),
    Stale,
}

impl<T: Clone> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Cached::Cached(value) => Some(value),
            Cached::Unloaded | Cached::Stale => None,
        }
    }

    /// Return the cached value, fetching it first unless it is cached and
    /// `renew` is false. A failed fetch leaves the state as it was after the
    /// renew reset.
    fn fetch_with(&mut self, renew: bool, fetch: impl FnOnce() -> Result<T>) -> Result<T> {
        if renew {
            *self = Cached::Unloaded;
        }
        if let Cached::Cached(value) = self {
            return Ok(value.clone());
        }
        let value = fetch()?;
        *self = Cached::Cached(value.clone());
        Ok(value)
    }

    fn invalidate(&mut self) {
        if matches!(self, Cached::Cached(_)) {
            *self = Cached::Stale;
        }
    }
}

/// Cached attributes of one entry.
#[derive(Debug, Clone, Default)]
pub struct AttributeCache {
    pub size: Cached<Bytes>,
    pub last_change: Cached<DateTime<Utc>>,
    pub owner: Cached<String>,
    pub group: Cached<String>,
    pub permissions: Cached<Permissions>,
}

impl AttributeCache {
    /// Mark size and modification time stale after a content mutation.
    pub(crate) fn invalidate_content(&mut self) {
        self.size.invalidate();
        self.last_change.invalidate();
    }

    pub(crate) fn invalidate_all(&mut self) {
        self.invalidate_content();
        self.owner.invalidate();
        self.group.invalidate();
        self.permissions.invalidate();
    }
}

pub(crate) mod sealed {
    use super::{AttributeCache, Backend, VfsPath};

    /// Split borrow of the pieces the metadata contract works on.
    pub trait Parts {
        fn parts(&mut self) -> (&dyn Backend, &VfsPath, &mut AttributeCache);
    }
}

/// Metadata contract shared by file and folder entries.
///
/// Getters fetch lazily and cache; setters write through to the backend
/// first and only update the cache when the backend accepted the change.
pub trait Metadata: sealed::Parts {
    /// Whether the entry exists on its backend. Never cached.
    fn exists(&self) -> Result<bool>;

    fn size(&mut self, renew: bool) -> Result<Bytes> {
        let (backend, path, cache) = self.parts();
        cache.size.fetch_with(renew, || backend.size(path))
    }

    fn last_change(&mut self, renew: bool) -> Result<DateTime<Utc>> {
        let (backend, path, cache) = self.parts();
        cache.last_change.fetch_with(renew, || backend.last_change(path))
    }

    fn owner(&mut self, renew: bool) -> Result<String> {
        let (backend, path, cache) = self.parts();
        cache.owner.fetch_with(renew, || backend.owner(path))
    }

    fn group(&mut self, renew: bool) -> Result<String> {
        let (backend, path, cache) = self.parts();
        cache.group.fetch_with(renew, || backend.group(path))
    }

    fn permissions(&mut self, renew: bool) -> Result<Permissions> {
        let (backend, path, cache) = self.parts();
        cache.permissions.fetch_with(renew, || backend.permissions(path))
    }

    fn set_owner(&mut self, owner: &str) -> Result<()> {
        let (backend, path, cache) = self.parts();
        debug!("{}: set {} of {} to {}", backend.name(), Attribute::Owner, path, owner);
        backend.set_owner(path, owner)?;
        cache.owner = Cached::Cached(owner.to_string());
        Ok(())
    }

    fn set_group(&mut self, group: &str) -> Result<()> {
        let (backend, path, cache) = self.parts();
        debug!("{}: set {} of {} to {}", backend.name(), Attribute::Group, path, group);
        backend.set_group(path, group)?;
        cache.group = Cached::Cached(group.to_string());
        Ok(())
    }

    fn set_permissions(&mut self, mode: Permissions) -> Result<()> {
        let (backend, path, cache) = self.parts();
        debug!("{}: set {} of {} to {}", backend.name(), Attribute::Permissions, path, mode);
        backend.set_permissions(path, mode)?;
        cache.permissions = Cached::Cached(mode);
        Ok(())
    }
}
