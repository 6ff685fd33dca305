//! In-memory virtual filesystem
//!
//! Blocks stage intermediate files here. Paths are normalized before every
//! lookup or insertion:
//! - separators `\` and `/` are equivalent, repeated separators collapse
//! - `.` segments are dropped, `..` pops the previous segment (never above root)
//! - comparison is case-insensitive
//!
//! `normalize_path(normalize_path(p)) == normalize_path(p)` holds for every
//! input.

use std::collections::BTreeMap;

use super::file::File;

/// Storage for files addressed by logical path
pub trait FileSystem {
    /// Look up a file
    fn get_file(&self, path: &str) -> Option<&File>;

    /// Insert a file, returning the file previously stored at that path
    fn put_file(&mut self, path: &str, file: File) -> Option<File>;
}

/// Normalize a logical path
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    for segment in path.split(&['/', '\\'][..]) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other.to_lowercase()),
        }
    }
    segments.join("/")
}

/// Process-local filesystem backed by an ordered map
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    files: BTreeMap<String, File>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_file(&mut self, path: &str) -> Option<File> {
        self.files.remove(&normalize_path(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    /// Normalized paths of all stored files, in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Files stored directly or transitively below `dir`
    pub fn list(&self, dir: &str) -> Vec<(&str, &File)> {
        let prefix = normalize_path(dir);
        self.files
            .iter()
            .filter(|(path, _)| {
                prefix.is_empty()
                    || path
                        .strip_prefix(prefix.as_str())
                        .map_or(false, |rest| rest.starts_with('/'))
            })
            .map(|(path, file)| (path.as_str(), file))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn get_file(&self, path: &str) -> Option<&File> {
        self.files.get(&normalize_path(path))
    }

    fn put_file(&mut self, path: &str, file: File) -> Option<File> {
        self.files.insert(normalize_path(path), file)
    }
}
