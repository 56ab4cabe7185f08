//! Delimited table output

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write serializable rows as CSV, header taken from the row's field names
///
/// Returns the number of data rows written. `None` fields become empty cells.
pub fn write_rows<T, I>(path: &Path, rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(count)
}

/// Write a value as pretty-printed JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|e| PipelineError::io(path, e))
}

/// Copy an input file verbatim into the output set
pub fn copy_into(source: &Path, destination: &Path) -> Result<u64> {
    ensure_parent(destination)?;
    fs::copy(source, destination).map_err(|e| PipelineError::io(source, e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
        }
        _ => Ok(()),
    }
}
