use std::{fs, path::Path};

use encoding_rs::Encoding;
use log::info;

use crate::{data::RawTable, error::ReportError, io_utils};

/// A file handed over by the hosting layer: the client-supplied name plus its
/// bytes. Nothing is written to disk on its behalf.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads an upload from a path chosen by the caller.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_name.trim().is_empty() {
            return Err(ReportError::EmptyFileName);
        }
        if !path.exists() {
            return Err(ReportError::MissingUpload);
        }
        let bytes = fs::read(path)?;
        Ok(Self { file_name, bytes })
    }
}

/// Rejects a missing upload or one without a file name before any parsing.
pub fn validate_upload(upload: Option<&Upload>) -> Result<&Upload, ReportError> {
    let upload = upload.ok_or(ReportError::MissingUpload)?;
    if upload.file_name.trim().is_empty() {
        return Err(ReportError::EmptyFileName);
    }
    Ok(upload)
}

pub fn read_upload(
    upload: Option<&Upload>,
    encoding: &'static Encoding,
    delimiter: u8,
) -> Result<RawTable, ReportError> {
    let upload = validate_upload(upload)?;
    let table = io_utils::read_export(&upload.bytes, encoding, delimiter)?;
    info!(
        "Read {} row(s) across {} column(s) from '{}' ({})",
        table.rows.len(),
        table.headers.len(),
        upload.file_name,
        encoding.name()
    );
    Ok(table)
}
