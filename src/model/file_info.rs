use indexmap::IndexMap;
use serde::Serialize;

/// Metadata decoded from the `BasicFileInfo` stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileInfo {
    pub entries: IndexMap<String, String>,
}

impl FileInfo {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Revit format year, e.g. `2021`.
    ///
    /// Newer files carry a `Format` line; older ones only have
    /// `Revit Build: Autodesk Revit 2017 (Build: ...)`.
    #[must_use]
    pub fn format(&self) -> Option<String> {
        if let Some(format) = self.get("Format") {
            return Some(format.to_string());
        }
        self.get("Revit Build").and_then(year_after_product_name)
    }

    #[must_use]
    pub fn build(&self) -> Option<String> {
        if let Some(build) = self.get("Build") {
            return Some(build.to_string());
        }
        let revit_build = self.get("Revit Build")?;
        let start = revit_build.find("(Build: ")? + "(Build: ".len();
        let rest = &revit_build[start..];
        // The build itself ends in "(x64)", so drop only the outer paren.
        let end = rest.rfind(')')?;
        Some(rest[..end].trim().to_string())
    }

    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.get("Locale when saved")
    }

    #[must_use]
    pub fn last_save_path(&self) -> Option<&str> {
        self.get("Last Save Path")
    }

    #[must_use]
    pub fn worksharing(&self) -> Option<&str> {
        self.get("Worksharing")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn year_after_product_name(value: &str) -> Option<String> {
    let start = value.find("Revit ")? + "Revit ".len();
    let year: String = value[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    (year.len() == 4).then_some(year)
}
