use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::error::ParseError;
use crate::model::{AtomCategory, FamilyInfo, FamilyPart, Parameter, PartAtom, Taxonomy};

/// Parses the Atom entry stored in the `PartAtom` stream of a family file.
///
/// Namespace prefixes (`A:`, `ds:`) are ignored; elements are matched on
/// their local names.
pub fn parse_part_atom(xml: &str) -> Result<PartAtom, ParseError> {
    let xml = xml.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(xml);

    let mut atom = PartAtom::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    let mut taxonomy = Taxonomy::default();
    let mut category = AtomCategory::default();
    let mut part = FamilyPart::default();
    let mut parameter: Option<Parameter> = None;
    let mut group: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| ParseError::InvalidPartAtom {
            message: format!("at byte {}: {e}", reader.buffer_position()),
        })?;

        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                stack.push(name);
                text.clear();
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();

                match path.as_slice() {
                    ["entry", "taxonomy"] => taxonomy = Taxonomy::default(),
                    ["entry", "category"] => category = AtomCategory::default(),
                    ["entry", "family"] => {
                        atom.family = Some(FamilyInfo {
                            kind: attribute(&e, "type")?,
                            ..FamilyInfo::default()
                        });
                    }
                    ["entry", "family", "part"] => {
                        part = FamilyPart {
                            kind: attribute(&e, "type")?,
                            ..FamilyPart::default()
                        };
                    }
                    ["entry", "features", "feature", "group"] => group = None,
                    ["entry", "family", "part", name] if *name != "title" => {
                        parameter = Some(read_parameter(&e, name, None)?);
                    }
                    ["entry", "features", "feature", "group", name] if *name != "title" => {
                        parameter = Some(read_parameter(&e, name, group.clone())?);
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();

                match path.as_slice() {
                    ["entry", "family", "part"] if name != "title" => {
                        let param = read_parameter(&e, &name, None)?;
                        part.parameters.insert(name, param);
                    }
                    ["entry", "features", "feature", "group"] if name != "title" => {
                        let param = read_parameter(&e, &name, group.clone())?;
                        atom.parameters.insert(name, param);
                    }
                    _ => {}
                }
            }
            Event::Text(t) => text.push_str(&String::from_utf8_lossy(&t)),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t)),
            Event::GeneralRef(r) => {
                let resolved = r.resolve_char_ref().map_err(|e| ParseError::InvalidPartAtom {
                    message: format!("bad character reference: {e}"),
                })?;
                if let Some(c) = resolved {
                    text.push(c);
                } else {
                    let name = String::from_utf8_lossy(&r);
                    match resolve_predefined_entity(&name) {
                        Some(entity) => text.push_str(entity),
                        None => warn!(reference = %name, "unknown entity reference in PartAtom"),
                    }
                }
            }
            Event::End(_) => {
                let value = text.trim().to_string();
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();

                match path.as_slice() {
                    ["entry", "title"] => atom.title = value,
                    ["entry", "id"] => atom.id = Some(value),
                    ["entry", "updated"] => atom.updated = Some(value),
                    ["entry", "taxonomy", "term"] => taxonomy.term = value,
                    ["entry", "taxonomy", "label"] => taxonomy.label = value,
                    ["entry", "taxonomy"] => atom.taxonomies.push(std::mem::take(&mut taxonomy)),
                    ["entry", "category", "term"] => category.term = value,
                    ["entry", "category", "scheme"] => category.scheme = value,
                    ["entry", "category"] => atom.categories.push(std::mem::take(&mut category)),
                    ["entry", "family", "variationCount"] => {
                        if let Some(family) = atom.family.as_mut() {
                            family.variation_count = value.parse().ok();
                        }
                    }
                    ["entry", "family", "part", "title"] => part.name = value,
                    ["entry", "family", "part"] => {
                        if let Some(family) = atom.family.as_mut() {
                            family.parts.push(std::mem::take(&mut part));
                        }
                    }
                    ["entry", "family", "part", name] => {
                        if let Some(mut param) = parameter.take() {
                            param.value = value;
                            part.parameters.insert((*name).to_string(), param);
                        }
                    }
                    ["entry", "features", "feature", "group", "title"] => group = Some(value),
                    ["entry", "features", "feature", "group", name] => {
                        if let Some(mut param) = parameter.take() {
                            param.value = value;
                            atom.parameters.insert((*name).to_string(), param);
                        }
                    }
                    _ => {}
                }

                stack.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::InvalidPartAtom {
            message: format!("unclosed element '{}'", stack.join("/")),
        });
    }

    Ok(atom)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::InvalidPartAtom {
            message: err.to_string(),
        })?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let raw = String::from_utf8_lossy(&attr.value);
            let value = quick_xml::escape::unescape(&raw).map_err(|err| {
                ParseError::InvalidPartAtom {
                    message: err.to_string(),
                }
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn read_parameter(
    e: &BytesStart<'_>,
    name: &str,
    group: Option<String>,
) -> Result<Parameter, ParseError> {
    Ok(Parameter {
        name: name.to_string(),
        display_name: attribute(e, "displayName")?,
        type_of_parameter: attribute(e, "typeOfParameter")?,
        units: attribute(e, "units")?,
        group,
        value: String::new(),
    })
}
