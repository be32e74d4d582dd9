//! Resource identity (URI-like locator)

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FILE_SCHEME: &str = "file";
pub const UNTITLED_SCHEME: &str = "untitled";

/// Stable identity of an editable resource, e.g. `file:///tmp/cat.paw` or
/// `untitled:Untitled-1`. Compared by exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceUri(CompactString);

impl ResourceUri {
    /// Accepts `scheme:rest`; a bare path is treated as a `file` resource.
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((scheme, _)) if is_scheme(scheme) => Self(CompactString::new(value)),
            _ => Self::from_path(Path::new(value)),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        let mut s = CompactString::new("file://");
        s.push_str(&abs.to_string_lossy());
        Self(s)
    }

    pub fn untitled(name: &str) -> Self {
        let mut s = CompactString::new(UNTITLED_SCHEME);
        s.push(':');
        s.push_str(name);
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map(|(s, _)| s).unwrap_or(FILE_SCHEME)
    }

    pub fn is_untitled(&self) -> bool {
        self.scheme() == UNTITLED_SCHEME
    }

    /// Local path for `file` resources.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.scheme() != FILE_SCHEME {
            return None;
        }
        let rest = self.0.strip_prefix("file:")?;
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        if rest.is_empty() {
            return None;
        }
        Some(PathBuf::from(rest))
    }
}

fn is_scheme(s: &str) -> bool {
    // single letters are Windows drive prefixes, not schemes
    s.len() > 1
        && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl std::fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&Path> for ResourceUri {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/resource.rs"]
mod tests;
