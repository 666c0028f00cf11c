use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Maps caller-supplied relative paths onto absolute paths inside a fixed
/// content root.
///
/// Every path handed out by [`PathResolver::resolve`] or
/// [`PathResolver::resolve_dir`] is lexically contained in [`root`]. No
/// other component re-validates paths, so this is the only place that
/// decides what may be touched.
///
/// [`root`]: PathResolver::root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    reserved: Option<String>,
}

impl PathResolver {
    /// Create a resolver confined to `root`.
    ///
    /// # Arguments
    /// * `root` - Absolute directory every resolved path must stay under.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reserved: None,
        }
    }

    /// Refuse paths whose first segment is `name` (compared ASCII
    /// case-insensitively). Used to keep callers out of the upload staging
    /// directory.
    pub fn with_reserved(mut self, name: impl Into<String>) -> Self {
        self.reserved = Some(name.into());
        self
    }

    /// The content root all resolved paths live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a percent-encoded relative path to an absolute file path.
    ///
    /// # Errors
    /// - [`Error::PathEscape`] if the path is absolute or `..` climbs above the root.
    /// - [`Error::InvalidPath`] if nothing remains after normalization, the
    ///   input does not decode to valid UTF-8, or it starts with the reserved
    ///   segment.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let segments = self.segments(rel)?;
        if segments.is_empty() {
            return Err(Error::invalid_path(format!(
                "'{}' does not name a file",
                rel
            )));
        }
        let resolved = self.join(&segments);
        log::debug!("resolved '{}' to {}", rel, resolved.display());
        Ok(resolved)
    }

    /// Like [`resolve`](Self::resolve), but an empty path means the root itself.
    pub fn resolve_dir(&self, rel: &str) -> Result<PathBuf> {
        let segments = self.segments(rel)?;
        Ok(self.join(&segments))
    }

    /// The `/`-separated path of `abs` below the root.
    ///
    /// # Errors
    /// Returns [`Error::PathEscape`] if `abs` is not under the root.
    pub fn relative(&self, abs: &Path) -> Result<String> {
        let rest = abs
            .strip_prefix(&self.root)
            .map_err(|_| Error::path_escape(abs.display().to_string()))?;
        let mut segments = Vec::new();
        for component in rest.components() {
            match component {
                Component::Normal(seg) => segments.push(seg.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return Err(Error::path_escape(abs.display().to_string())),
            }
        }
        Ok(segments.join("/"))
    }

    fn segments(&self, rel: &str) -> Result<Vec<String>> {
        let segments = normalize_path(&decode_path(rel)?)?;
        if let (Some(reserved), Some(first)) = (&self.reserved, segments.first()) {
            if first.eq_ignore_ascii_case(reserved) {
                return Err(Error::invalid_path(format!("'{}' is reserved", rel)));
            }
        }
        Ok(segments)
    }

    fn join(&self, segments: &[String]) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(segments);
        path
    }
}

/// Percent-decode a raw path taken from a request.
pub fn decode_path(raw: &str) -> Result<Cow<'_, str>> {
    urlencoding::decode(raw)
        .map_err(|_| Error::invalid_path(format!("'{}' is not valid UTF-8 once decoded", raw)))
}

/// Lexically normalize a relative path into its segments.
///
/// Empty segments and `.` are dropped, `..` removes the previous segment.
/// Both `/` and `\` separate segments.
///
/// # Errors
/// - [`Error::PathEscape`] for absolute inputs, when `..` has nothing left
///   to remove, or for a `.git` segment.
/// - [`Error::InvalidPath`] for segments containing NUL.
pub fn normalize_path(path: &str) -> Result<Vec<String>> {
    if is_absolute(path) {
        return Err(Error::path_escape(path));
    }

    let mut segments: Vec<String> = Vec::new();
    for seg in path.split(['/', '\\']) {
        match seg {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::path_escape(path));
                }
            }
            _ if seg.contains('\0') => {
                return Err(Error::invalid_path("path must not contain NUL"));
            }
            _ if seg.eq_ignore_ascii_case(".git") => {
                return Err(Error::path_escape(path));
            }
            _ => segments.push(seg.to_string()),
        }
    }
    Ok(segments)
}

fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let p = Path::new(path);
    p.has_root() || matches!(p.components().next(), Some(Component::Prefix(_)))
}

/// Validate a bare file name: one non-empty component with no separators.
///
/// # Arguments
/// * `name` - A client-supplied or generated file name.
///
/// # Errors
/// Returns [`Error::InvalidPath`] for empty names, `.`/`..`, separators or NUL.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::invalid_path(format!("'{}' is not a file name", name)));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(Error::invalid_path(format!(
            "file name '{}' must not contain separators",
            name
        )));
    }
    Ok(())
}

/// Commit message for a single-file delete.
pub fn delete_message(prefix: &str, rel: &str) -> String {
    format!("{}: delete {}", prefix, rel)
}
