//! Ingestion and schema normalization for facility-renovation progress
//! sheets: heterogeneous two-row-header CSV/XLSX inputs from many parks,
//! normalized into one canonical table of project records.

pub mod config;
pub mod dates;
pub mod error;
pub mod header;
pub mod loader;
pub mod location;
pub mod merge;
pub mod output;
pub mod reports;
pub mod sanitize;
pub mod types;
pub mod util;

pub use error::IngestError;
pub use loader::{load_csv_bytes, load_directory, load_path, LoadReport};
pub use location::LocationEnricher;
pub use merge::merge_tables;
pub use types::{Cell, ColumnMapping, Milestone, NormalizedTable, ProjectRecord, RawTableBlock};
