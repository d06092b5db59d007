use tracing::{debug, warn};

use crate::error::ParseError;
use crate::model::{CategoryMap, CategoryValue, PartAtom, ProblemData, StreamInfo};
use crate::parser::basic_info::parse_basic_file_info;
use crate::parser::cfb::CompoundFile;
use crate::parser::part_atom::parse_part_atom;

pub const BASIC_FILE_INFO: &str = "BasicFileInfo";
pub const PART_ATOM: &str = "PartAtom";

/// Taxonomy scheme Revit uses for the family category itself.
const REVIT_GROUPING: &str = "adsk:revit:grouping";

/// Decodes a Revit file held in memory into its problem database.
///
/// # Errors
///
/// Returns [`ParseError::InvalidCompoundFile`] if the container is malformed,
/// [`ParseError::MissingStream`] if there is no `BasicFileInfo` stream and
/// [`ParseError::InvalidPartAtom`] if the family metadata is not valid XML.
pub fn parse_rfa(bytes: &[u8], file_path: &str) -> Result<ProblemData, ParseError> {
    let file = CompoundFile::parse(bytes)?;

    let streams: Vec<StreamInfo> = file
        .streams()
        .map(|entry| StreamInfo {
            path: entry.path.clone(),
            size: entry.size,
        })
        .collect();
    debug!(streams = streams.len(), "read compound file directory");

    let file_info = parse_basic_file_info(&file.read_stream(BASIC_FILE_INFO)?);
    debug!(
        format = file_info.format().as_deref().unwrap_or("unknown"),
        entries = file_info.entries.len(),
        "decoded BasicFileInfo"
    );

    let part_atom = if file.has_stream(PART_ATOM) {
        let bytes = file.read_stream(PART_ATOM)?;
        Some(parse_part_atom(&String::from_utf8_lossy(&bytes))?)
    } else {
        warn!("no PartAtom stream, file carries no family categories");
        None
    };

    let categories = part_atom
        .as_ref()
        .map(build_categories)
        .unwrap_or_default();

    let mut data = ProblemData::new(file_path.to_string()).with_categories(categories);
    data.file_info = file_info;
    data.part_atom = part_atom;
    data.streams = streams;
    Ok(data)
}

/// One entry per PartAtom category, keyed by term, in document order.
fn build_categories(atom: &PartAtom) -> CategoryMap {
    let mut categories = CategoryMap::new();

    for category in &atom.categories {
        if category.term.is_empty() {
            continue;
        }
        if categories.contains_key(&category.term) {
            debug!(term = %category.term, "skipping duplicate category");
            continue;
        }

        let mut value = CategoryMap::new();
        value.insert("scheme".to_string(), category.scheme.as_str().into());
        if let Some(label) = atom.taxonomy_label(&category.scheme) {
            value.insert("label".to_string(), label.into());
        }

        if category.scheme == REVIT_GROUPING {
            if let Some(family) = &atom.family {
                let type_count = i64::try_from(family.type_count()).unwrap_or(i64::MAX);
                value.insert("types".to_string(), type_count.into());
                value.insert(
                    "parts".to_string(),
                    CategoryValue::List(
                        family
                            .parts
                            .iter()
                            .map(|p| p.name.as_str().into())
                            .collect(),
                    ),
                );
            }
        }

        categories.insert(category.term.clone(), CategoryValue::Map(value));
    }

    categories
}
