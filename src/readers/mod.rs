pub mod csv_reader;
pub mod source_reader;

pub use csv_reader::{ColumnIndex, CsvTableReader, RawRow, RawTable};
pub use source_reader::{digest_bytes, SourceBytes, SourceFingerprint, SourceReader};
