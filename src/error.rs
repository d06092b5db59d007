//! Error types for RFA Inspector.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when decoding the contents of a Revit file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The OLE2 compound file container is invalid or truncated.
    #[error("invalid compound file: {message}")]
    InvalidCompoundFile { message: String },

    /// A required stream is not present in the container.
    #[error("stream '{name}' not found")]
    MissingStream { name: String },

    /// The PartAtom XML could not be parsed.
    #[error("invalid PartAtom XML: {message}")]
    InvalidPartAtom { message: String },
}

/// Errors surfaced by an extractor or by the invoker driving it.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file does not exist or cannot be read.
    #[error("failed to read file '{path}': {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not a valid or recognized Revit file.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Writing category lines failed.
    #[error("failed to write output: {source}")]
    Output {
        #[from]
        source: std::io::Error,
    },

    /// Any other failure reported by an extractor implementation.
    ///
    /// The built-in extractor never returns this; it is the variant for
    /// custom [`Extractor`](crate::extractor::Extractor) implementations
    /// whose failures fit none of the others.
    #[error("extraction failed: {message}")]
    Unknown { message: String },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}
