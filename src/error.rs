//! Typed failures raised while turning an upload into reports.
//!
//! Callers branch on [`ReportError::category`] to tell a rejected upload apart
//! from a file that could not be parsed and from a file whose content breaks
//! the column contract.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Violations of the column contract described by a
/// [`ReportSchema`](crate::schema::ReportSchema).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Required column '{0}' is missing from the upload")]
    MissingColumn(String),
    #[error("Column '{column}' on data row {row} holds '{value}', which is not an integer")]
    NotInteger {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Invalid column descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("Column '{0}' appears more than once in the upload")]
    AmbiguousColumn(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No file was uploaded")]
    MissingUpload,
    #[error("The uploaded file has no name")]
    EmptyFileName,
    #[error("Reading upload failed: {0}")]
    Io(#[from] io::Error),
    #[error("Upload is not valid {encoding} text")]
    Decode { encoding: &'static str },
    #[error("Malformed CSV content: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row} has {found} field(s) but the header declares {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("No attendance rows remain after dropping rows without an id or name")]
    EmptyInput,
    #[error("Formatting report rows failed: {0}")]
    WriteCsv(#[source] csv::Error),
    #[error("Text cannot be represented in {encoding}: '{text}'")]
    Encode {
        encoding: &'static str,
        text: String,
    },
    #[error("Writing {path:?} failed: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Building the report archive failed: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Coarse classification used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before parsing (nothing uploaded, empty file name, unreadable file).
    Upload,
    /// The bytes could not be read as a CSV table in the declared encoding.
    Parse,
    /// The table parsed but breaks the column contract or holds no usable rows.
    Content,
    /// Reports were built but could not be encoded or stored.
    Output,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::MissingUpload | ReportError::EmptyFileName | ReportError::Io(_) => {
                ErrorCategory::Upload
            }
            ReportError::Decode { .. }
            | ReportError::Csv(_)
            | ReportError::RaggedRow { .. } => ErrorCategory::Parse,
            ReportError::Schema(_) | ReportError::EmptyInput => ErrorCategory::Content,
            ReportError::WriteCsv(_)
            | ReportError::Encode { .. }
            | ReportError::Output { .. }
            | ReportError::Archive(_) => ErrorCategory::Output,
        }
    }
}
