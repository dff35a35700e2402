//! Core data structures: pages in, people and families out

mod family;
mod page;
mod pedigree;
mod person;
mod records;

pub use family::Family;
pub use page::{Anchor, ExtractedPage};
pub use pedigree::{LogEntry, Orientation, Pedigree};
pub use person::{DateFact, Person, PersonId, Sex};
pub use records::{read_records, ProfileRecord, SegmentIndex, SegmentRecord};
