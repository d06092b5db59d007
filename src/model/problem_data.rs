use super::{CategoryMap, FileInfo, PartAtom};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamInfo {
    pub path: String,
    pub size: u64,
}

/// The "problem database" read from a Revit file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProblemData {
    pub file_path: String,
    pub file_info: FileInfo,
    pub part_atom: Option<PartAtom>,
    pub streams: Vec<StreamInfo>,
    pub categories: CategoryMap,
}

impl ProblemData {
    #[must_use]
    pub fn new(file_path: String) -> Self {
        Self {
            file_path,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    #[must_use]
    pub fn all_categories(&self) -> &CategoryMap {
        &self.categories
    }
}
