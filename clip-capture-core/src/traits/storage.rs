use std::io::{self, Read, Write};

/// A readable file handle that knows its total size.
pub trait StorageReader: Read + Send {
    /// Total size of the file in bytes.
    fn size(&self) -> u64;
}

/// File abstraction used to persist sounds.
///
/// Paths are absolute within the storage (`/recordings/take1.wav`). Closing a
/// handle is dropping it; writers are flushed before they are dropped.
pub trait Storage: Send + Sync {
    fn exists(&self, path: &str) -> bool;

    /// Create a single directory. The parent must already exist.
    fn create_dir(&self, path: &str) -> io::Result<()>;

    fn open_read(&self, path: &str) -> io::Result<Box<dyn StorageReader>>;

    /// Open `path` for writing, truncating any existing content.
    fn open_write(&self, path: &str) -> io::Result<Box<dyn Write + Send>>;
}

/// Give `path` a leading `/` and collapse doubled separators.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }
    normalized
}

/// Every proper ancestor directory of `path`, outermost first.
///
/// `/a/b/c.wav` yields `/a` and `/a/b`.
pub fn ancestor_dirs(path: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    for (index, ch) in path.char_indices().skip(1) {
        if ch == '/' {
            dirs.push(path[..index].to_string());
        }
    }
    dirs
}
