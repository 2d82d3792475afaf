//! Byte sources for catalog files
//!
//! Loaders only need to open a path and read it to the end, so the same
//! decoding code works on bundled assets, a directory on disk or bytes that
//! are already in memory.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use log::warn;
use memmap2::MmapOptions;

/// Source of catalog bytes addressed by relative path
pub trait AssetProvider: Send + Sync {
    /// Opens `path` for sequential reading
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Whether `path` exists
    fn exists(&self, path: &str) -> bool;

    /// Entries under `path`; providers that cannot enumerate return nothing
    fn list(&self, _path: &str) -> io::Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Reads the whole asset into memory
    fn read_all(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Assets stored under a directory on disk
///
/// Files are memory-mapped when possible and read normally otherwise.
#[derive(Debug, Clone)]
pub struct FileAssetProvider {
    root: PathBuf,
}

impl FileAssetProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetProvider for FileAssetProvider {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let full = self.resolve(path);
        let file = File::open(&full)?;
        if file.metadata()?.len() == 0 {
            // Zero-length files cannot be mapped on every platform
            return Ok(Box::new(Cursor::new(Vec::new())));
        }

        // Safety: catalog files are written once by the packer and only read afterwards
        match unsafe { MmapOptions::new().map(&file) } {
            Ok(mmap) => Ok(Box::new(Cursor::new(mmap))),
            Err(e) => {
                warn!(
                    "Memory mapping {} failed: {}. Falling back to regular I/O.",
                    full.display(),
                    e
                );
                Ok(Box::new(file))
            }
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries.sort();
        Ok(entries)
    }
}

/// Assets held in memory, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetProvider {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method that adds one asset
    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) {
        self.files.insert(path.to_string(), bytes);
    }
}

impl AssetProvider for MemoryAssetProvider {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        match self.files.get(path) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("asset not found: {}", path),
            )),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let prefix = if path.is_empty() || path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        };
        let mut entries: Vec<String> = self
            .files
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .map(|rest| rest.split('/').next().unwrap_or(rest).to_string())
            .collect();
        entries.sort();
        entries.dedup();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_file_provider_reads_and_lists() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("catalog")).unwrap();
        let mut file = File::create(dir.path().join("catalog/a.bin")).unwrap();
        file.write_all(b"hello").unwrap();
        File::create(dir.path().join("catalog/empty.bin")).unwrap();

        let provider = FileAssetProvider::new(dir.path());
        assert!(provider.exists("catalog/a.bin"));
        assert!(!provider.exists("catalog/missing.bin"));
        assert!(!provider.exists("catalog"));

        assert_eq!(provider.read_all("catalog/a.bin").unwrap(), b"hello");
        assert!(provider.read_all("catalog/empty.bin").unwrap().is_empty());
        assert_eq!(
            provider.list("catalog").unwrap(),
            vec!["a.bin".to_string(), "empty.bin".to_string()]
        );

        let err = provider.open("catalog/missing.bin").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_provider() {
        let provider = MemoryAssetProvider::new()
            .with_file("catalog/stars_v1.bin", vec![1, 2, 3])
            .with_file("catalog/const_v1.bin", vec![4])
            .with_file("readme.txt", vec![]);

        assert!(provider.exists("catalog/stars_v1.bin"));
        assert_eq!(provider.read_all("catalog/stars_v1.bin").unwrap(), vec![1, 2, 3]);
        assert_eq!(
            provider.list("catalog").unwrap(),
            vec!["const_v1.bin".to_string(), "stars_v1.bin".to_string()]
        );
        assert_eq!(
            provider.list("").unwrap(),
            vec!["catalog".to_string(), "readme.txt".to_string()]
        );
        assert!(provider.open("nope").is_err());
    }
}
