pub mod basic_info;
pub mod cfb;
pub mod part_atom;
pub mod rfa;

pub use crate::error::ParseError;
pub use basic_info::parse_basic_file_info;
pub use cfb::{CompoundFile, DirEntry, EntryKind};
pub use part_atom::parse_part_atom;
pub use rfa::parse_rfa;
