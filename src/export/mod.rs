//! Result export: CSV tables, JSON summaries and the dated zip archive

mod archive;
mod tables;

pub use archive::{archive_directory, dated_archive_name, dated_archive_path};
pub use tables::{copy_into, write_json, write_rows};
