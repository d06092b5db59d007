//! # RFA Inspector
//!
//! Reads Revit family (`.rfa`) files and lists the categories they declare.
//!
//! ## Features
//!
//! - Read the OLE2 compound file container used by Revit files
//! - Decode `BasicFileInfo` (format year, build, locale, save path)
//! - Decode `PartAtom` (family categories, types and parameters)
//! - Print categories as `key value` lines, or export to CSV and JSON
//!
//! ## Example
//!
//! ```no_run
//! use rfa_inspector::extractor::{Extractor, RevitExtractor};
//!
//! let data = RevitExtractor::open("planter.rfa")?.read_problem_data()?;
//! for (key, value) in data.all_categories() {
//!     println!("{key} {value}");
//! }
//! # Ok::<(), rfa_inspector::error::ExtractError>(())
//! ```

pub mod error;
pub mod export;
pub mod extractor;
pub mod invoker;
pub mod model;
pub mod parser;
