//! Stream handles and the backend registry.
//!
//! A stream handle is an open connection (an FTP session, an SSH channel, an
//! in-memory store). Entries bound to a handle resolve their backend through
//! the registry, keyed by the handle's kind. A kind without a registered
//! constructor yields [`Error::DriverNotFound`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use super::backend::Backend;
use super::memory::{MemoryBackend, MemoryStore};
use crate::error::{Error, Result};

/// Handle kinds with a well-known name. Only `memory` ships a backend.
pub mod kind {
    pub const FTP: &str = "ftp";
    pub const SFTP: &str = "sftp";
    pub const SSH: &str = "ssh";
    pub const SHELL: &str = "shell";
    pub const MEMORY: &str = "memory";
}

/// An open connection that entries can be bound to.
pub trait StreamHandle: Send + Sync + 'static {
    /// Registry key selecting the backend, e.g. `"ftp"`.
    fn kind(&self) -> &str;

    /// Concrete type name, reported when no backend matches.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Builds a backend around a stream handle.
pub type BackendConstructor =
    Box<dyn Fn(&Arc<dyn StreamHandle>) -> Result<Arc<dyn Backend>> + Send + Sync>;

/// Maps handle kinds to backend constructors.
pub struct BackendRegistry {
    constructors: HashMap<String, BackendConstructor>,
}

impl BackendRegistry {
    /// Registry with no backends.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with the built-in `memory` backend.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(kind::MEMORY, |handle| {
            let store = handle
                .as_any()
                .downcast_ref::<MemoryStore>()
                .ok_or_else(|| Error::DriverNotFound {
                    kind: handle.kind().to_string(),
                    type_name: handle.type_name().to_string(),
                })?;
            Ok(Arc::new(MemoryBackend::new(store.clone())) as Arc<dyn Backend>)
        });
        registry
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(&Arc<dyn StreamHandle>) -> Result<Arc<dyn Backend>> + Send + Sync + 'static,
    {
        debug!("registering backend for stream kind \"{}\"", kind);
        self.constructors
            .insert(kind.to_string(), Box::new(constructor));
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Backend for `handle`, built by the constructor registered for its kind.
    pub fn resolve(&self, handle: &Arc<dyn StreamHandle>) -> Result<Arc<dyn Backend>> {
        match self.constructors.get(handle.kind()) {
            Some(constructor) => constructor(handle),
            None => Err(Error::DriverNotFound {
                kind: handle.kind().to_string(),
                type_name: handle.type_name().to_string(),
            }),
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("BackendRegistry").field("kinds", &kinds).finish()
    }
}
