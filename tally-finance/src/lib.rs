//! tally-finance: memoized classification, categorization drivers, CSV exports,
//! category rollup and SankeyMATIC output.

pub mod categorize;
pub mod chain;
pub mod export;
pub mod memo;
pub mod review;
pub mod rollup;
pub mod sankey;

pub use categorize::{categorize_document, categorize_transactions};
pub use chain::{CategoryChain, CategoryPolicy, CompletionBackend};
pub use memo::{classify_memoized, ClassificationCache};
pub use review::ReviewReport;
pub use rollup::{CategoryTotals, MonthFilter, Rollup, RollupRules};
pub use sankey::{flow_lines, format_sankey, FlowLine};
