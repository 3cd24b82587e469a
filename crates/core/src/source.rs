//! Source provider abstraction for filesystem-independent parsing.
//!
//! The [`SourceProvider`] trait abstracts file I/O so the parser, the
//! include resolver and `workspace extends` can run against a real
//! filesystem or an in-memory map (tests, sandboxed embedders).

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

pub trait SourceProvider {
    /// Read the full source text for a path.
    fn read_source(&self, path: &Path) -> io::Result<String>;

    /// Canonicalize a path for include cycle detection.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn exists(&self, path: &Path) -> bool;

    /// Expand a path to the files it covers: a file is itself; a directory
    /// is every file underneath it, recursively, in lexicographic order.
    /// Hidden files are skipped.
    fn find_files(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Default filesystem-backed provider.
pub struct FileSystemProvider;

impl FileSystemProvider {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .collect::<io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !n.starts_with('.'))
            })
            .collect();
        entries.sort();
        for entry in entries {
            if entry.is_dir() {
                Self::walk(&entry, out)?;
            } else {
                out.push(entry);
            }
        }
        Ok(())
    }
}

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn find_files(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if path.is_dir() {
            let mut out = Vec::new();
            Self::walk(path, &mut out)?;
            Ok(out)
        } else {
            Ok(vec![path.to_path_buf()])
        }
    }
}

/// In-memory provider for tests and embedders without filesystem access.
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        Self { files }
    }

    /// Resolve `.` and `..` components without touching the filesystem.
    fn normalize(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !components.is_empty() {
                        components.pop();
                    }
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        let normalized = Self::normalize(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(Self::normalize(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = Self::normalize(path);
        self.files.contains_key(&normalized)
            || self.files.keys().any(|k| k.starts_with(&normalized))
    }

    fn find_files(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let normalized = Self::normalize(path);
        if self.files.contains_key(&normalized) {
            return Ok(vec![normalized]);
        }
        let mut matches: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|k| k.starts_with(&normalized))
            .cloned()
            .collect();
        if matches.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("path not found in memory: {}", normalized.display()),
            ));
        }
        matches.sort();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(files: &[(&str, &str)]) -> InMemoryProvider {
        InMemoryProvider::new(
            files
                .iter()
                .map(|(p, c)| (PathBuf::from(p), c.to_string()))
                .collect(),
        )
    }

    #[test]
    fn normalize_resolves_dot_and_dotdot() {
        let p = Path::new("/a/b/../c/./d.dsl");
        assert_eq!(InMemoryProvider::normalize(p), PathBuf::from("/a/c/d.dsl"));
    }

    #[test]
    fn find_files_on_directory_is_sorted() {
        let p = provider(&[
            ("/dir/b.dsl", "b"),
            ("/dir/a.dsl", "a"),
            ("/dir/sub/c.dsl", "c"),
        ]);
        let files = p.find_files(Path::new("/dir")).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/dir/a.dsl"),
                PathBuf::from("/dir/b.dsl"),
                PathBuf::from("/dir/sub/c.dsl"),
            ]
        );
    }

    #[test]
    fn missing_path_is_an_error() {
        let p = provider(&[]);
        assert!(p.find_files(Path::new("/nope")).is_err());
        assert!(!p.exists(Path::new("/nope")));
    }
}
