//! CSV exports: one file per categorized document plus the rollup of all of them.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tally_core::{CategorizedRecord, TransactionType};
use tracing::info;

const CATEGORIZED_SUFFIX: &str = "_categorized.csv";

/// Export path for a statement document: `statement.pdf` -> `statement_categorized.csv`.
pub fn categorized_csv_path(document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    document.with_file_name(format!("{stem}{CATEGORIZED_SUFFIX}"))
}

pub fn is_categorized_csv(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().ends_with(CATEGORIZED_SUFFIX))
}

fn type_column(kind: Option<TransactionType>) -> &'static str {
    kind.map(|k| k.as_str()).unwrap_or("")
}

/// Write one document's records. The `transaction_type` column is only present
/// for sources that classify direction.
pub fn write_categorized_csv(
    path: impl AsRef<Path>,
    records: &[CategorizedRecord],
    with_transaction_type: bool,
) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;

    let mut header = vec!["raw_transaction", "description"];
    if with_transaction_type {
        header.push("transaction_type");
    }
    header.extend(["date", "amount", "category"]);
    wtr.write_record(&header)?;

    for r in records {
        let mut row = vec![r.raw_transaction.as_str(), r.description.as_str()];
        if with_transaction_type {
            row.push(type_column(r.transaction_type));
        }
        row.extend([
            r.date.as_deref().unwrap_or(""),
            r.amount.as_deref().unwrap_or(""),
            r.category.as_str(),
        ]);
        wtr.write_record(&row)?;
    }

    wtr.flush().with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "Data exported to {}", path.display());
    Ok(())
}

/// Read a per-document export. Columns are matched by name; a file without
/// rows (or without even a header) is an empty dataset.
pub fn read_categorized_csv(path: impl AsRef<Path>) -> Result<Vec<CategorizedRecord>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<CategorizedRecord>().enumerate() {
        let record = row.with_context(|| format!("{}: row {}", path.display(), i + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// A categorized record tagged with the export it came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RollupRow {
    pub raw_transaction: String,
    pub description: String,
    pub transaction_type: Option<TransactionType>,
    pub date: Option<String>,
    pub amount: Option<String>,
    pub category: String,
    pub source: String,
}

impl RollupRow {
    pub fn new(record: CategorizedRecord, source: impl Into<String>) -> Self {
        Self {
            raw_transaction: record.raw_transaction,
            description: record.description,
            transaction_type: record.transaction_type,
            date: record.date,
            amount: record.amount,
            category: record.category,
            source: source.into(),
        }
    }
}

pub fn write_rollup_csv(path: impl AsRef<Path>, rows: &[RollupRow]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;

    wtr.write_record([
        "raw_transaction",
        "description",
        "transaction_type",
        "date",
        "amount",
        "category",
        "source",
    ])?;
    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush().with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "Data exported to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> Vec<CategorizedRecord> {
        vec![
            CategorizedRecord::new("11/07 Withdrawal ATM $40.00", "Withdrawal ATM", "CASH")
                .with_fields("11/07", "40.00")
                .with_type(TransactionType::Expense),
            CategorizedRecord::new("garbled", "garbled", "INPUT NEEDED")
                .with_type(TransactionType::Unknown),
        ]
    }

    #[test]
    fn test_categorized_csv_path() {
        let p = categorized_csv_path(Path::new("data/schwab/Statement-2025-01.PDF"));
        assert_eq!(p, PathBuf::from("data/schwab/Statement-2025-01_categorized.csv"));
        assert!(is_categorized_csv(&p));
        assert!(!is_categorized_csv(Path::new("data/schwab/export.csv")));
    }

    #[test]
    fn test_schwab_export_has_type_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s_categorized.csv");
        write_categorized_csv(&path, &sample(), true).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, "raw_transaction,description,transaction_type,date,amount,category");

        let back = read_categorized_csv(&path).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_export_without_type_column_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b_categorized.csv");
        let records = vec![
            CategorizedRecord::new("Oct 07 Oct 09 SHELL OIL 123 $45.67", "SHELL OIL", "GAS")
                .with_fields("Oct 07", "45.67"),
        ];
        write_categorized_csv(&path, &records, false).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.lines().next().unwrap().contains("transaction_type"));
        assert_eq!(read_categorized_csv(&path).unwrap(), records);
    }

    #[test]
    fn test_empty_file_is_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty_categorized.csv");
        fs::write(&path, "").unwrap();
        assert!(read_categorized_csv(&path).unwrap().is_empty());
    }

    #[test]
    fn test_rollup_csv_has_source_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollup.csv");
        let rows: Vec<_> = sample()
            .into_iter()
            .map(|r| RollupRow::new(r, "data/schwab/s_categorized.csv"))
            .collect();
        write_rollup_csv(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "raw_transaction,description,transaction_type,date,amount,category,source"
        );
        assert_eq!(
            lines.next().unwrap(),
            "11/07 Withdrawal ATM $40.00,Withdrawal ATM,expense,11/07,40.00,CASH,data/schwab/s_categorized.csv"
        );
    }
}
