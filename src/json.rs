// JSON import/export file operations

use crate::error::{Error, Result};
use crate::models::TaskRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Record count above which a bulk import may take noticeably long.
/// Advisory only: front ends should confirm with the user before
/// importing a file this large.
pub const LARGE_IMPORT_THRESHOLD: usize = 500;

/// Read a UTF-8 JSON array of task records from a file.
///
/// Anything that is not a well-formed record array fails with
/// [`Error::Import`] wrapping the parse cause; identifiers present in the
/// file are ignored by the record shape itself.
pub fn read_tasks_file(path: &Path) -> Result<Vec<TaskRecord>> {
    let file = File::open(path)?;
    let records: Vec<TaskRecord> =
        serde_json::from_reader(BufReader::new(file)).map_err(Error::import)?;

    info!(file = ?path, count = records.len(), "read task records");
    Ok(records)
}

/// Write task records as a pretty-printed JSON array, 4-space indented.
pub fn write_tasks_file(path: &Path, records: &[TaskRecord]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    serde::Serialize::serialize(records, &mut ser).map_err(Error::import)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(file = ?path, count = records.len(), "wrote task records");
    Ok(())
}
