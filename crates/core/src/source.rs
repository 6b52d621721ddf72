//! Source provider abstraction for filesystem-independent compilation.
//!
//! The `include` closure reads other documents through a [`SourceProvider`],
//! so the whole pipeline can run against in-memory sources in tests.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Abstracts file I/O for the compilation pipeline.
pub trait SourceProvider {
    /// Read the source text for a given path.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Resolve an include symbol against the including document's directory.
    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf;

    /// Canonicalize a path for include-cycle detection.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error>;
}

/// Filesystem-backed provider delegating to `std::fs`.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        base.join(include)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        path.canonicalize()
    }
}

/// In-memory provider mapping paths to source text.
#[derive(Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        let files = files
            .into_iter()
            .map(|(p, s)| (Self::normalize_path(&p), s))
            .collect();
        Self { files }
    }

    /// Builder-style insert, handy in tests.
    pub fn with_file(mut self, path: impl AsRef<Path>, src: impl Into<String>) -> Self {
        self.files
            .insert(Self::normalize_path(path.as_ref()), src.into());
        self
    }

    /// Resolve `.` and `..` without touching the filesystem.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    components.pop();
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        Self::normalize_path(&base.join(include))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        let normalized = Self::normalize_path(path);
        if self.files.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("path not found in memory provider: {}", normalized.display()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let p = Path::new("conf/weapons/../shared/./base.sini");
        assert_eq!(
            InMemoryProvider::normalize_path(p),
            PathBuf::from("conf/shared/base.sini")
        );
    }

    #[test]
    fn in_memory_read_found_and_missing() {
        let provider = InMemoryProvider::default().with_file("a.sini", "k = 1");
        assert_eq!(provider.read_source(Path::new("./a.sini")).unwrap(), "k = 1");
        let err = provider.read_source(Path::new("b.sini")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn in_memory_resolve_include_is_relative_to_base() {
        let provider = InMemoryProvider::default();
        let resolved = provider.resolve_include(Path::new("conf"), "../shared.sini");
        assert_eq!(resolved, PathBuf::from("shared.sini"));
    }

    #[test]
    fn in_memory_canonicalize_missing_is_not_found() {
        let provider = InMemoryProvider::default().with_file("conf/a.sini", "");
        assert_eq!(
            provider
                .canonicalize(Path::new("conf/x/../a.sini"))
                .unwrap(),
            PathBuf::from("conf/a.sini")
        );
        let err = provider.canonicalize(Path::new("nope.sini")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
