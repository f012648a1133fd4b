pub mod inspector;

pub use inspector::ArchiveInspector;

use crate::error::Result;
use std::borrow::Cow;
use tracing::debug;

/// The CSV bytes to parse, and the archive entry they came from
#[derive(Debug, Clone)]
pub struct SourcePayload<'a> {
    pub entry_name: Option<String>,
    pub bytes: Cow<'a, [u8]>,
}

/// Unwrap a zip container if there is one; bare CSV passes through untouched
pub fn resolve_payload<'a>(bytes: &'a [u8], hidden_prefix: &str) -> Result<SourcePayload<'a>> {
    if !ArchiveInspector::is_zip(bytes) {
        debug!(bytes = bytes.len(), "Treating source as bare CSV");
        return Ok(SourcePayload {
            entry_name: None,
            bytes: Cow::Borrowed(bytes),
        });
    }

    let (entry_name, contents) = ArchiveInspector::extract_data_file(bytes, hidden_prefix)?;
    debug!(entry = %entry_name, bytes = contents.len(), "Selected CSV entry from archive");

    Ok(SourcePayload {
        entry_name: Some(entry_name),
        bytes: Cow::Owned(contents),
    })
}
