//! Error type shared by every layer of the crate.
//!
//! Backends report failures through the same enum as the derived operations,
//! so a caller at the system boundary only ever matches on [`Error`].

use std::io;

use thiserror::Error;

/// Result alias used throughout entryfs-core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed path, e.g. one containing a `./` segment.
    #[error("invalid path \"{path}\": {reason}")]
    Path { path: String, reason: &'static str },

    /// Bare name containing a separator.
    #[error("invalid name \"{name}\": names cannot contain '/' or '\\'")]
    Name { name: String },

    /// Rename or copy target already exists and replacing was not requested.
    #[error("\"{path}\" already exists")]
    Conflict { path: String },

    #[error("\"{path}\" not found")]
    NotFound { path: String },

    /// No backend is registered for the stream handle's kind.
    #[error("no backend registered for stream handle {type_name} (kind \"{kind}\")")]
    DriverNotFound { kind: String, type_name: String },

    /// Backend-level failure; `source` is the backend's native error.
    #[error("{op} failed for \"{path}\": {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{backend} backend does not implement {operation}")]
    NotImplemented {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("archive \"{path}\": {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid permission mode: {0}")]
    Mode(String),

    #[error("invalid data URL: {0}")]
    DataUrl(String),

    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a backend I/O error for `op` on `path`.
    ///
    /// `NotFound` is lifted into [`Error::NotFound`]; everything else keeps
    /// the native error as its source.
    pub fn io(op: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound { path }
        } else {
            Error::Io { op, path, source }
        }
    }

    /// Closure form of [`Error::io`] for `map_err`.
    pub(crate) fn io_with<'a>(
        op: &'static str,
        path: &'a str,
    ) -> impl FnOnce(io::Error) -> Error + 'a {
        move |source| Error::io(op, path, source)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_lifted() {
        let err = Error::io("read", "/x", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "\"/x\" not found");
    }

    #[test]
    fn test_other_io_keeps_source() {
        let err = Error::io(
            "write",
            "/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        match &err {
            Error::Io { op, source, .. } => {
                assert_eq!(*op, "write");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_with_maps_in_result_chain() {
        let path = String::from("/data/owned.txt");
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::from(io::ErrorKind::NotFound));
        let err = result.map_err(Error::io_with("stat", path.as_str())).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("/data/owned.txt"));
    }

    #[test]
    fn test_driver_not_found_names_type() {
        let err = Error::DriverNotFound {
            kind: "ftp".to_string(),
            type_name: "my::FtpConnection".to_string(),
        };
        assert!(err.to_string().contains("my::FtpConnection"));
    }
}
