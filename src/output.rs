//! Stores report tables as delimited files in a caller-chosen directory,
//! optionally bundled into one zip archive.
//!
//! Every table is encoded before anything touches the filesystem. If a write
//! fails part way, the files already written by this call are removed again,
//! along with the directory when this call created it.

use std::{
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

use encoding_rs::Encoding;
use log::{info, warn};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{error::ReportError, io_utils, report::ReportTable};

pub const ARCHIVE_FILE: &str = "processed_files.zip";

#[derive(Debug, Clone)]
pub struct OutputOptions<'a> {
    pub directory: &'a Path,
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    /// Also write every table into [`ARCHIVE_FILE`].
    pub bundle: bool,
}

/// An encoded report ready to be stored or streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn encode_reports(
    tables: &[ReportTable],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<EncodedReport>, ReportError> {
    tables
        .iter()
        .map(|table| {
            Ok(EncodedReport {
                file_name: table.file_name.clone(),
                bytes: io_utils::write_csv_bytes(&table.headers, &table.rows, delimiter, encoding)?,
            })
        })
        .collect()
}

/// Packs encoded reports into an in-memory zip archive.
pub fn build_archive(reports: &[EncodedReport]) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for report in reports {
            zip.start_file(report.file_name.as_str(), options)?;
            zip.write_all(&report.bytes)
                .map_err(|err| ReportError::Archive(err.into()))?;
        }
        zip.finish()?;
    }
    Ok(buf)
}

/// Writes every table (and the archive when requested) and returns the paths
/// written, in order.
pub fn write_reports(
    tables: &[ReportTable],
    options: &OutputOptions<'_>,
) -> Result<Vec<PathBuf>, ReportError> {
    let encoded = encode_reports(tables, options.delimiter, options.encoding)?;
    let archive = if options.bundle {
        Some(build_archive(&encoded)?)
    } else {
        None
    };

    let created_directory = !options.directory.exists();
    fs::create_dir_all(options.directory).map_err(|source| ReportError::Output {
        path: options.directory.to_path_buf(),
        source,
    })?;
    let files = encoded
        .iter()
        .map(|report| (report.file_name.as_str(), report.bytes.as_slice()))
        .chain(archive.as_deref().map(|bytes| (ARCHIVE_FILE, bytes)));
    let mut written = Vec::with_capacity(encoded.len() + 1);
    for (file_name, bytes) in files {
        match store(options.directory, file_name, bytes) {
            Ok(path) => written.push(path),
            Err(err) => {
                roll_back(options.directory, &written, created_directory);
                return Err(err);
            }
        }
    }
    info!(
        "Wrote {} file(s) to {:?} ({})",
        written.len(),
        options.directory,
        options.encoding.name()
    );
    Ok(written)
}

fn roll_back(directory: &Path, written: &[PathBuf], created_directory: bool) {
    for path in written {
        if let Err(err) = fs::remove_file(path) {
            warn!("Could not remove partial report {path:?}: {err}");
        }
    }
    if created_directory && let Err(err) = fs::remove_dir(directory) {
        warn!("Could not remove output directory {directory:?}: {err}");
    }
}

fn store(directory: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
    let path = directory.join(file_name);
    fs::write(&path, bytes).map_err(|source| ReportError::Output {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
