//! Categorized transaction records shared by the drivers, exports and rollup.

use serde::{Deserialize, Serialize};

/// Category returned when the classifier is not certain. Records carrying it
/// must be reviewed by a person before the rollup.
pub const INPUT_NEEDED: &str = "INPUT NEEDED";

/// Direction of money movement, only known for brokerage statements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionType {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
    #[serde(rename = "unknown")]
    Unknown,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Unknown => "unknown",
        }
    }
}

/// One statement transaction after classification.
///
/// `date` and `amount` are kept as the text found in the statement and are
/// absent when the statement line did not yield them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorizedRecord {
    pub raw_transaction: String,
    pub description: String,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    pub category: String,
}

impl CategorizedRecord {
    pub fn new(
        raw_transaction: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            raw_transaction: raw_transaction.into(),
            description: description.into(),
            transaction_type: None,
            date: None,
            amount: None,
            category: category.into(),
        }
    }

    pub fn with_fields(mut self, date: impl Into<String>, amount: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self.amount = Some(amount.into());
        self
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    /// True when the classifier asked for a human decision.
    pub fn needs_input(&self) -> bool {
        self.category == INPUT_NEEDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builders() {
        let r = CategorizedRecord::new("11/07 Deposit GUSTO $10.00", "Deposit GUSTO", "WAGES")
            .with_fields("11/07", "10.00")
            .with_type(TransactionType::Income);
        assert_eq!(r.date.as_deref(), Some("11/07"));
        assert_eq!(r.amount.as_deref(), Some("10.00"));
        assert_eq!(r.transaction_type, Some(TransactionType::Income));
        assert!(!r.needs_input());
    }

    #[test]
    fn test_input_needed_sentinel() {
        let r = CategorizedRecord::new("x", "x", INPUT_NEEDED);
        assert!(r.needs_input());
    }

    #[test]
    fn test_transaction_type_serde_names() {
        let json = serde_json::to_string(&TransactionType::Expense).unwrap();
        assert_eq!(json, "\"expense\"");
        assert_eq!(TransactionType::Unknown.as_str(), "unknown");
    }
}
