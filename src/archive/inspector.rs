use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    CSV_EXTENSION, DEFAULT_BUFFER_SIZE, ZIP_EMPTY_ARCHIVE, ZIP_LOCAL_HEADER,
};
use std::io::{Cursor, Read, Seek};
use tracing::debug;
use zip::ZipArchive;

pub struct ArchiveInspector;

impl ArchiveInspector {
    /// Check for a zip signature at the start of the payload
    pub fn is_zip(bytes: &[u8]) -> bool {
        bytes.starts_with(ZIP_LOCAL_HEADER) || bytes.starts_with(ZIP_EMPTY_ARCHIVE)
    }

    /// List CSV entries that are real data, in archive order
    pub fn data_entries<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        hidden_prefix: &str,
    ) -> Result<Vec<String>> {
        let mut entries = Vec::new();

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            let file_name = file.name();

            if file.is_dir() || file_name.ends_with('/') {
                continue;
            }

            if Self::is_hidden(file_name, hidden_prefix) {
                debug!(entry = file_name, "Skipping hidden archive entry");
                continue;
            }

            if file_name.to_lowercase().ends_with(CSV_EXTENSION) {
                entries.push(file_name.to_string());
            }
        }

        Ok(entries)
    }

    /// Platform metadata: the reserved prefix, or any dot-prefixed path component
    pub fn is_hidden(file_name: &str, hidden_prefix: &str) -> bool {
        (!hidden_prefix.is_empty() && file_name.starts_with(hidden_prefix))
            || file_name
                .split('/')
                .any(|component| component.starts_with('.'))
    }

    /// Extract the first data CSV from an in-memory archive
    pub fn extract_data_file(bytes: &[u8], hidden_prefix: &str) -> Result<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let entries = Self::data_entries(&mut archive, hidden_prefix)?;

        let entry_name = entries
            .into_iter()
            .next()
            .ok_or(ProcessingError::NoDataFileFound)?;

        let mut zip_file = archive.by_name(&entry_name).map_err(|_| {
            ProcessingError::InvalidFormat(format!("File '{}' not found in archive", entry_name))
        })?;

        let mut contents = Vec::with_capacity(capacity_hint(zip_file.size()));
        zip_file.read_to_end(&mut contents)?;

        Ok((entry_name, contents))
    }
}

// The declared size comes from the archive header and is not trusted
fn capacity_hint(declared_size: u64) -> usize {
    usize::try_from(declared_size)
        .unwrap_or(usize::MAX)
        .min(DEFAULT_BUFFER_SIZE)
}
