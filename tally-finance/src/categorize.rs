//! Per-source drivers: extract, normalize, classify and attach date/amount.

use anyhow::Result;
use tally_core::CategorizedRecord;
use tally_ingest::SourceFormat;
use tracing::{info, warn};

use crate::chain::CategoryChain;
use crate::memo::{classify_memoized, ClassificationCache};

/// Classify already extracted raw transactions of one source.
///
/// Date and amount come from the raw text; a record whose fields cannot be
/// read is kept without them.
pub fn categorize_transactions(
    format: SourceFormat,
    chain: &CategoryChain<'_>,
    cache: &mut ClassificationCache,
    transactions: &[String],
) -> Result<Vec<CategorizedRecord>> {
    let parser = format.parser();
    let identity = chain.identity();
    let mut records = Vec::with_capacity(transactions.len());

    for raw in transactions {
        let description = parser.normalize(raw);
        let category = classify_memoized(cache, &identity, &description, |d| chain.invoke(d))?;

        let mut record = CategorizedRecord::new(raw.as_str(), description, category);
        if let Some(kind) = parser.transaction_type(raw) {
            record = record.with_type(kind);
        }
        match parser.extract_fields(raw) {
            Some(fields) => record = record.with_fields(fields.date, fields.amount),
            None => warn!(source = %format, transaction = %raw.trim(), "could not extract date or amount"),
        }
        records.push(record);
    }

    Ok(records)
}

/// Extract and classify every transaction of one document.
pub fn categorize_document(
    format: SourceFormat,
    chain: &CategoryChain<'_>,
    cache: &mut ClassificationCache,
    pages: &[String],
) -> Result<Vec<CategorizedRecord>> {
    let transactions = format.parser().extract(pages);
    info!(source = %format, count = transactions.len(), "Extracted {} transactions", transactions.len());
    categorize_transactions(format, chain, cache, &transactions)
}
