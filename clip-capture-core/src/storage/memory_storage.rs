use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::traits::storage::{Storage, StorageReader};

#[derive(Debug, Default)]
struct MemoryFs {
    files: HashMap<String, Vec<u8>>,
    dirs: HashSet<String>,
    write_limit: Option<usize>,
}

impl MemoryFs {
    fn dir_exists(&self, dir: &str) -> bool {
        dir == "/" || self.dirs.contains(dir)
    }
}

/// In-memory `Storage` with mkdir semantics: a directory or file can only be
/// created inside a directory that already exists.
///
/// Clones share the same contents. A write limit caps how many bytes any one
/// file may hold; writes past it come back short.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryFs>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose files stop accepting bytes after `limit`.
    pub fn with_write_limit(limit: usize) -> Self {
        let storage = Self::default();
        storage.inner.lock().write_limit = Some(limit);
        storage
    }

    /// Contents of a file, if present.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().files.get(path).cloned()
    }

    /// Place a file directly, bypassing directory checks.
    pub fn insert_file(&self, path: &str, bytes: Vec<u8>) {
        self.inner.lock().files.insert(path.to_string(), bytes);
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.inner.lock().dir_exists(path)
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(index) => &path[..index],
    }
}

struct MemoryReader {
    cursor: Cursor<Vec<u8>>,
    size: u64,
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl StorageReader for MemoryReader {
    fn size(&self) -> u64 {
        self.size
    }
}

struct MemoryWriter {
    inner: Arc<Mutex<MemoryFs>>,
    path: String,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut fs = self.inner.lock();
        let limit = fs.write_limit;
        let file = fs.files.entry(self.path.clone()).or_default();
        let room = limit.map_or(usize::MAX, |limit| limit.saturating_sub(file.len()));
        let accepted = buf.len().min(room);
        file.extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &str) -> bool {
        let fs = self.inner.lock();
        fs.dir_exists(path) || fs.files.contains_key(path)
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        let mut fs = self.inner.lock();
        if fs.dir_exists(path) || fs.files.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, format!("{} exists", path)));
        }
        if !fs.dir_exists(parent_dir(path)) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {} does not exist", path),
            ));
        }
        fs.dirs.insert(path.to_string());
        Ok(())
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn StorageReader>> {
        let bytes = self
            .inner
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path)))?;
        let size = bytes.len() as u64;
        Ok(Box::new(MemoryReader {
            cursor: Cursor::new(bytes),
            size,
        }))
    }

    fn open_write(&self, path: &str) -> io::Result<Box<dyn Write + Send>> {
        let mut fs = self.inner.lock();
        if fs.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path),
            ));
        }
        if !fs.dir_exists(parent_dir(path)) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {} does not exist", path),
            ));
        }
        fs.files.insert(path.to_string(), Vec::new());
        Ok(Box::new(MemoryWriter {
            inner: Arc::clone(&self.inner),
            path: path.to_string(),
        }))
    }
}
