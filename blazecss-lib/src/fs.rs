use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Source of stylesheet text. Implemented for the real filesystem and for
/// in-memory buffers (unsaved editor documents, tests).
pub trait FileReader: Send + Sync {
    fn read_text(&self, path: &Path) -> io::Result<String>;

    fn exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiskReader;

impl FileReader for DiskReader {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Files keyed by their normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        MemoryReader::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files
            .insert(normalize_path(path.as_ref()), text.into());
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl FileReader for MemoryReader {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file in memory"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }
}

/// Lexically resolves `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/ws/styles/./nested/../base.css")),
            PathBuf::from("/ws/styles/base.css")
        );
    }

    #[test]
    fn test_memory_reader_matches_unnormalized_paths() {
        let reader = MemoryReader::new().with_file("/ws/a.css", ".a {}");
        assert!(reader.exists(Path::new("/ws/sub/../a.css")));
        assert_eq!(reader.read_text(Path::new("/ws/./a.css")).unwrap(), ".a {}");
        assert_eq!(
            reader.read_text(Path::new("/ws/b.css")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
