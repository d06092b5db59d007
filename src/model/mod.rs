pub mod category;
pub mod family;
pub mod file_info;
pub mod problem_data;

pub use category::{CategoryMap, CategoryValue};
pub use family::{AtomCategory, FamilyInfo, FamilyPart, Parameter, PartAtom, Taxonomy};
pub use file_info::FileInfo;
pub use problem_data::{ProblemData, StreamInfo};
