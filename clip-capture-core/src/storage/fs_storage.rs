use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::traits::storage::{Storage, StorageReader};

/// `Storage` backed by a directory on the host file system.
///
/// Storage paths are resolved below `root`, so `/rec/take.wav` becomes
/// `{root}/rec/take.wav`.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a storage path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

struct FsReader {
    file: File,
    size: u64,
}

impl Read for FsReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl StorageReader for FsReader {
    fn size(&self) -> u64 {
        self.size
    }
}

impl Storage for FsStorage {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        fs::create_dir(self.resolve(path))
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn StorageReader>> {
        let file = File::open(self.resolve(path))?;
        let size = file.metadata()?.len();
        Ok(Box::new(FsReader { file, size }))
    }

    fn open_write(&self, path: &str) -> io::Result<Box<dyn Write + Send>> {
        let file = File::create(self.resolve(path))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}
