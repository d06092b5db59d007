use crate::error::ExportError;
use crate::model::{CategoryMap, FileInfo, PartAtom, ProblemData, StreamInfo};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Document written by [`export_json`]; derived fields first, raw data after.
#[derive(Serialize)]
struct JsonReport<'a> {
    file_path: &'a str,
    format: Option<String>,
    build: Option<String>,
    categories: &'a CategoryMap,
    file_info: &'a FileInfo,
    part_atom: Option<&'a PartAtom>,
    streams: &'a [StreamInfo],
}

impl<'a> From<&'a ProblemData> for JsonReport<'a> {
    fn from(data: &'a ProblemData) -> Self {
        Self {
            file_path: &data.file_path,
            format: data.file_info.format(),
            build: data.file_info.build(),
            categories: data.all_categories(),
            file_info: &data.file_info,
            part_atom: data.part_atom.as_ref(),
            streams: &data.streams,
        }
    }
}

pub fn export_json<P: AsRef<Path>>(data: &ProblemData, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &JsonReport::from(data))?;
    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}
