//! CSV export — flat records in the column layout clerks expect.
//!
//! Output is UTF-8 with a BOM so spreadsheet applications detect the
//! encoding of the Korean headers; absent length/count cells stay empty.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::types::NormalizedRecord;

/// Clerk-facing header row. Column order matches the record field order.
pub const CSV_HEADERS: [&str; 6] = ["파일명", "반출내용", "구매방법", "구매품명", "길이", "개수"];

/// Byte-order mark so Excel and friends read the file as UTF-8.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no records to export")]
    NoRecords,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `records` as CSV (BOM + header row + one line per record).
pub fn write_csv<W: Write>(records: &[NormalizedRecord], mut out: W) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }

    out.write_all(UTF8_BOM)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Export to `path`, or to a timestamped file in the given directory when
/// `path` points at a directory. Returns the written path.
pub fn export_records(records: &[NormalizedRecord], path: &Path) -> Result<PathBuf, ExportError> {
    let target = if path.is_dir() {
        path.join(default_filename())
    } else {
        path.to_path_buf()
    };

    write_csv(records, File::create(&target)?)?;
    tracing::info!(path = %target.display(), records = records.len(), "CSV export written");
    Ok(target)
}

/// `extracted_data_<YYYYmmdd_HHMMSS>.csv`
fn default_filename() -> String {
    format!(
        "extracted_data_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}
