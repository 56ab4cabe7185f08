//! Zip archive of an output directory

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARCHIVE_SUFFIX: &str = "_data.zip";

/// Base name of the dated archive, e.g. `2025-12-09_data`
pub fn dated_archive_name(date: NaiveDate) -> String {
    format!("{}_data", date.format("%Y-%m-%d"))
}

/// Archive path for `date` inside `dir`
pub fn dated_archive_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.zip", dated_archive_name(date)))
}

/// Zip the regular files directly under `dir` into `archive_path`
///
/// Earlier archives (`*_data.zip`) and the target itself are skipped so the
/// archive can live inside the directory it packs. Entries are added in
/// file-name order. Returns the number of files archived.
pub fn archive_directory(dir: &Path, archive_path: &Path) -> Result<usize> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if !path.is_file() || path == archive_path {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if !name.ends_with(ARCHIVE_SUFFIX) => name.to_string(),
            _ => continue,
        };
        files.push((name, path));
    }
    files.sort();

    let file = File::create(archive_path).map_err(|e| PipelineError::io(archive_path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in &files {
        zip.start_file(name.as_str(), options)?;
        let mut source = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        io::copy(&mut source, &mut zip).map_err(|e| PipelineError::io(path, e))?;
    }
    zip.finish()?;

    log::info!("Archived {} files into {}", files.len(), archive_path.display());
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_dated_archive_name() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 9).unwrap();
        assert_eq!(dated_archive_name(date), "2025-12-09_data");
    }

    #[test]
    fn test_archive_skips_previous_archives_and_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("JEL.csv"), "iso3,JEL\nAAA,1\n").unwrap();
        fs::write(dir.join("2024-01-01_data.zip"), "old").unwrap();
        fs::create_dir(dir.join("maps")).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let archive = dated_archive_path(dir, date);
        let count = archive_directory(dir, &archive).unwrap();
        assert_eq!(count, 1);

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut contents = String::new();
        zip.by_name("JEL.csv").unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "iso3,JEL\nAAA,1\n");
    }
}
