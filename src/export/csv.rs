use crate::error::ExportError;
use crate::model::{CategoryValue, ProblemData};
use std::fs::File;
use std::path::Path;

pub fn export_csv<P: AsRef<Path>>(data: &ProblemData, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(["Category", "Scheme", "Value"])?;

    for (key, value) in data.all_categories() {
        let scheme = match value {
            CategoryValue::Map(map) => map.get("scheme").map(ToString::to_string),
            _ => None,
        };
        let rendered = value.to_string();
        writer.write_record([
            key.as_str(),
            scheme.as_deref().unwrap_or(""),
            rendered.as_str(),
        ])?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}
