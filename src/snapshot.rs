//! Directory snapshots and change detection
//!
//! A [`Snapshot`] records every file and directory below a root as a relative
//! path string. Directories carry a trailing `/`, components are always joined
//! with `/`, and the root itself is never part of the set.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Component, Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Set of relative paths found under a directory at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    paths: BTreeSet<String>,
}

impl Snapshot {
    /// Walk `root` and record every entry below it
    ///
    /// A missing or unreadable root yields an empty snapshot. Entries that
    /// cannot be read are skipped.
    pub fn capture(root: &Path) -> Self {
        let mut paths = BTreeSet::new();

        for entry in WalkDir::new(root).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            let mut key = relative_key(relative);
            if entry.file_type().is_dir() {
                key.push('/');
            }
            paths.insert(key);
        }

        Self { paths }
    }

    /// Paths present in `self` but not in `before`, sorted
    pub fn new_since(&self, before: &Snapshot) -> Vec<String> {
        self.paths.difference(&before.paths).cloned().collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl<S: Into<String>> FromIterator<S> for Snapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(component_key(part)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Name of one path component; names that are not valid UTF-8 are escaped
/// byte for byte so that two different names never share a key
fn component_key(part: &OsStr) -> String {
    if let Some(name) = part.to_str() {
        return name.to_string();
    }

    let escaped = format!("{:?}", part);
    let escaped = escaped
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(&escaped)
        .to_string();
    warn!("File name is not valid UTF-8, reporting it as {}", escaped);
    escaped
}
