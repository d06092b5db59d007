use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ExtractError;
use crate::model::ProblemData;
use crate::parser::parse_rfa;

/// Source of a problem database.
pub trait Extractor {
    fn read_problem_data(&self) -> Result<ProblemData, ExtractError>;
}

/// Extractor backed by a Revit file on disk.
#[derive(Debug)]
pub struct RevitExtractor {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl RevitExtractor {
    /// Reads the whole file into memory. Parsing is deferred to
    /// [`Extractor::read_problem_data`].
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::FileAccess`] if the file is missing or unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|source| ExtractError::FileAccess {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), size = bytes.len(), "opened Revit file");

        Ok(Self { path, bytes })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Extractor for RevitExtractor {
    fn read_problem_data(&self) -> Result<ProblemData, ExtractError> {
        let data = parse_rfa(&self.bytes, &self.path.to_string_lossy())?;
        info!(categories = data.categories.len(), "read problem data");
        Ok(data)
    }
}
