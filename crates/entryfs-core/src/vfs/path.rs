//! Path rules: normalization, name validation and string splitting.
//!
//! Paths are plain forward-slash strings. A folder path always ends with `/`,
//! a file path never does (root `/` aside). Backends receive [`VfsPath`]
//! values that already passed [`normalize`] and translate them to their own
//! addressing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("static regex"));

/// Normalize a path string.
///
/// Backslashes become `/`, surrounding whitespace and trailing `/` or spaces
/// are trimmed, `""` becomes `/`, `"."` becomes `""` and repeated slashes
/// collapse. With `trailing_slash_for_folders` a non-empty result gets a
/// trailing `/`.
///
/// Any `./` sequence is rejected. This also rejects folder names ending in
/// a dot, such as a folder literally called `...`.
pub fn normalize(path: &str, trailing_slash_for_folders: bool) -> Result<String> {
    let path = path.replace('\\', "/");
    let path = path.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    let path = path.trim_end_matches(['/', ' ']);

    let mut path = match path {
        "" => "/".to_string(),
        "." => String::new(),
        other => other.to_string(),
    };
    if trailing_slash_for_folders && !path.is_empty() {
        path.push('/');
    }

    // Checked after the folder slash so a folder named "a." fails here and
    // not only once a child path is built from it.
    if path.contains("./") {
        return Err(Error::Path {
            path,
            reason: "contains a './' segment",
        });
    }

    Ok(REPEATED_SLASHES.replace_all(&path, "/").into_owned())
}

/// Reject bare names that contain a path separator.
pub fn validate_name(name: &str) -> Result<()> {
    if name.contains(['/', '\\']) {
        return Err(Error::Name {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Last path component; trailing slashes are ignored.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Everything before the last component.
///
/// Returns `"/"` for top-level entries and `"."` when the path has no
/// separator at all.
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') { "/" } else { "" };
    }
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(pos) => &trimmed[..pos],
        None => ".",
    }
}

/// Text after the last `.` of the basename, or `""`.
pub fn extension(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(pos) => &name[pos + 1..],
        None => "",
    }
}

/// Basename without its extension.
pub fn stem(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Normalized path addressing one entry on one backend.
///
/// Built with [`VfsPath::file`] or [`VfsPath::folder`]; the folder form keeps
/// the trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VfsPath(String);

impl VfsPath {
    pub fn file(path: &str) -> Result<Self> {
        normalize(path, false).map(Self)
    }

    pub fn folder(path: &str) -> Result<Self> {
        normalize(path, true).map(Self)
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn name(&self) -> &str {
        basename(&self.0)
    }

    pub fn extension(&self) -> &str {
        extension(&self.0)
    }

    pub fn stem(&self) -> &str {
        stem(&self.0)
    }

    /// Folder path containing this entry.
    ///
    /// `""` for bare relative names, `/` for top-level entries and for root.
    pub fn container(&self) -> VfsPath {
        // Slicing an already normalized path never reintroduces './' or
        // repeated slashes, so the private constructor is enough here.
        match dirname(&self.0) {
            "." | "" => VfsPath(String::new()),
            "/" => VfsPath("/".to_string()),
            dir => VfsPath(format!("{}/", dir)),
        }
    }

    /// Path of a file called `name` inside this folder path.
    pub fn child_file(&self, name: &str) -> Result<VfsPath> {
        VfsPath::file(&format!("{}{}", self.folder_prefix(), name))
    }

    /// Path of a folder called `name` inside this folder path.
    pub fn child_folder(&self, name: &str) -> Result<VfsPath> {
        VfsPath::folder(&format!("{}{}", self.folder_prefix(), name))
    }

    /// Part of `self` below `root`, if `self` lives under it.
    pub fn strip_root<'a>(&'a self, root: &VfsPath) -> Option<&'a str> {
        let prefix = root.folder_prefix();
        if prefix.is_empty() {
            return Some(&self.0);
        }
        self.0.strip_prefix(prefix.as_str())
    }

    fn folder_prefix(&self) -> String {
        if self.0.is_empty() || self.0.ends_with('/') {
            self.0.clone()
        } else {
            format!("{}/", self.0)
        }
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
