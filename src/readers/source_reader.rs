use crate::error::{ProcessingError, Result};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identity of a source file at the moment it was read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
    /// Hex SHA-256 of the raw file bytes
    pub digest: String,
}

impl SourceFingerprint {
    /// Size and mtime still match what is on disk
    pub fn matches_metadata(&self, metadata: &fs::Metadata) -> bool {
        self.modified.is_some()
            && self.len == metadata.len()
            && self.modified == metadata.modified().ok()
    }
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Bytes of a source file plus its fingerprint
#[derive(Debug, Clone)]
pub struct SourceBytes {
    pub fingerprint: SourceFingerprint,
    pub bytes: Vec<u8>,
}

pub struct SourceReader {
    use_mmap: bool,
}

impl SourceReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Stat the source, failing with `SourceNotFound` when it is absent
    pub fn metadata(path: &Path) -> Result<fs::Metadata> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => Ok(metadata),
            Ok(_) => Err(ProcessingError::SourceNotFound(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProcessingError::SourceNotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the whole source once
    pub fn read(&self, path: &Path) -> Result<SourceBytes> {
        let metadata = Self::metadata(path)?;

        let bytes = if self.use_mmap {
            self.read_mmap(path)?
        } else {
            self.read_buffered(path, metadata.len())?
        };

        let fingerprint = SourceFingerprint {
            path: path.to_path_buf(),
            len: metadata.len(),
            modified: metadata.modified().ok(),
            digest: digest_bytes(&bytes),
        };

        Ok(SourceBytes { fingerprint, bytes })
    }

    fn read_buffered(&self, path: &Path, len_hint: u64) -> Result<Vec<u8>> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut bytes = Vec::with_capacity(len_hint as usize);
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn read_mmap(&self, path: &Path) -> Result<Vec<u8>> {
        let file = File::open(path)?;
        // Zero-length files cannot be mapped on every platform
        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(mmap.to_vec())
    }
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new()
    }
}
