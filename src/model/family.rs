use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Taxonomy {
    pub term: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AtomCategory {
    pub term: String,
    pub scheme: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub display_name: Option<String>,
    pub type_of_parameter: Option<String>,
    pub units: Option<String>,
    pub group: Option<String>,
    pub value: String,
}

/// A family type (`A:part`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FamilyPart {
    pub name: String,
    pub kind: Option<String>,
    pub parameters: IndexMap<String, Parameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FamilyInfo {
    pub kind: Option<String>,
    pub variation_count: Option<u32>,
    pub parts: Vec<FamilyPart>,
}

impl FamilyInfo {
    /// Declared variation count, falling back to the parts actually listed.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.variation_count
            .map_or(self.parts.len(), |count| count as usize)
    }
}

/// Contents of the `PartAtom` stream of a family file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartAtom {
    pub title: String,
    pub id: Option<String>,
    pub updated: Option<String>,
    pub taxonomies: Vec<Taxonomy>,
    pub categories: Vec<AtomCategory>,
    pub family: Option<FamilyInfo>,
    pub parameters: IndexMap<String, Parameter>,
}

impl PartAtom {
    #[must_use]
    pub fn taxonomy_label(&self, term: &str) -> Option<&str> {
        self.taxonomies
            .iter()
            .find(|t| t.term == term)
            .map(|t| t.label.as_str())
    }
}
