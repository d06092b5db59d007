use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Category key → value, in the order the extractor produced them.
pub type CategoryMap = IndexMap<String, CategoryValue>;

/// Value attached to a category.
///
/// Formatting rule used by [`fmt::Display`]:
/// - top-level text prints as-is, nested text is double-quoted
/// - numbers and booleans use the default decimal / `true`/`false` form
/// - lists print as `[a, b]`, maps as `{key: value}` in insertion order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    List(Vec<CategoryValue>),
    Map(CategoryMap),
}

impl CategoryValue {
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Text(s) => write!(f, "{s:?}"),
            other => other.fmt_value(f),
        }
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Text(s) => f.write_str(s),
            CategoryValue::Integer(i) => write!(f, "{i}"),
            CategoryValue::Real(r) => write!(f, "{r}"),
            CategoryValue::Boolean(b) => write!(f, "{b}"),
            CategoryValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            CategoryValue::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: ")?;
                    value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_value(f)
    }
}

impl From<&str> for CategoryValue {
    fn from(value: &str) -> Self {
        CategoryValue::Text(value.to_string())
    }
}

impl From<String> for CategoryValue {
    fn from(value: String) -> Self {
        CategoryValue::Text(value)
    }
}

impl From<i64> for CategoryValue {
    fn from(value: i64) -> Self {
        CategoryValue::Integer(value)
    }
}

impl From<f64> for CategoryValue {
    fn from(value: f64) -> Self {
        CategoryValue::Real(value)
    }
}

impl From<bool> for CategoryValue {
    fn from(value: bool) -> Self {
        CategoryValue::Boolean(value)
    }
}

impl From<CategoryMap> for CategoryValue {
    fn from(value: CategoryMap) -> Self {
        CategoryValue::Map(value)
    }
}
