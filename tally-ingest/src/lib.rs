//! tally-ingest: statement page loading and format-specific transaction parsers.

pub mod normalize;
pub mod pages;
pub mod parsers;
pub mod types;

pub use pages::{find_documents, find_files_with_extension, load_pages};
pub use types::{SourceFormat, StatementFields, StatementParser};
