//! Pedigraph: ASCII pedigree charts to GEDCOM
//!
//! Reconstructs a family tree from the text rendering of a pedigree chart
//! (person labels joined by `/`, `\` and `|` connector art) and writes it
//! out as GEDCOM 5.5.1.
//!
//! # Pipeline
//!
//! - **Tokenize**: split the snapshot into person rows and connector rows
//! - **Indent**: quantize label columns onto a small set of levels
//! - **Reconstruct**: trace connectors into parent/child edges and families
//! - **Export**: emit GEDCOM with optional kit metadata
//!
//! Around the core sit a capture [`Session`], a SQLite-backed
//! [`CaptureStore`] and the page automation contract in [`workflow`].
//!
//! # Example
//!
//! ```
//! use pedigraph::{parse_page, Anchor, ExtractedPage, ParseConfig};
//!
//! let page = ExtractedPage::new(
//!     "John      Jane\n/         \\\n     Mary",
//!     vec![
//!         Anchor::new("John").with_color("blue"),
//!         Anchor::new("Jane").with_color("red"),
//!         Anchor::new("Mary").with_color("red"),
//!     ],
//! );
//! let pedigree = parse_page(&page, &ParseConfig::default());
//! assert_eq!(pedigree.people.len(), 3);
//! assert_eq!(pedigree.families.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod gedcom;
pub mod indent;
pub mod label;
pub mod links;
pub mod model;
pub mod reconstruct;
pub mod session;
pub mod storage;
pub mod tokenize;
pub mod workflow;

pub use config::{AppConfig, ExportConfig, ParseConfig, SexLookup, ToleranceConfig};
pub use error::{PedigraphError, PedigraphResult};
pub use gedcom::{to_gedcom, ExportMeta, GedcomWriter};
pub use indent::IndentScale;
pub use links::LinkResolver;
pub use model::{
    Anchor, DateFact, ExtractedPage, Family, LogEntry, Pedigree, Person, PersonId, ProfileRecord, SegmentIndex,
    SegmentRecord, Sex,
};
pub use reconstruct::Reconstructor;
pub use session::{Bundle, BundleSource, Capture, CaptureStatus, CaptureSummary, Session};
pub use storage::{CaptureStore, OpenStore, SqliteStore, StorageError, StorageResult};
pub use tokenize::{tokenize, Tokenized};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tokenize and reconstruct one page snapshot
pub fn parse_page(page: &ExtractedPage, config: &ParseConfig) -> Pedigree {
    let tokenized = tokenize(page, config);
    Reconstructor::new(config.tolerance.clone()).run(tokenized)
}

/// Parse a page and render its GEDCOM as a storable capture
pub fn capture_page(kit: &str, page: &ExtractedPage, config: &ParseConfig, meta: &ExportMeta) -> Capture {
    let tokenized = tokenize(page, config);
    let stats = tokenized.stats.clone();
    let pedigree = Reconstructor::new(config.tolerance.clone()).run(tokenized);
    let gedcom = to_gedcom(&pedigree, meta);
    Capture::new(kit.trim(), pedigree, gedcom).with_stats(stats)
}
