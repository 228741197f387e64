//! tally-core: categorized transaction records and category label handling

pub mod category;
pub mod record;

pub use category::{display_label, CategoryPath};
pub use record::{CategorizedRecord, TransactionType, INPUT_NEEDED};
