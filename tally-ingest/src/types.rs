use serde::{Deserialize, Serialize};
use tally_core::TransactionType;

use crate::parsers::{barclays::Barclays, boa::BankOfAmerica, paypal::Paypal, schwab::Schwab};

/// Date and amount recovered from a raw statement transaction, as printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFields {
    pub date: String,
    pub amount: String,
}

/// Capabilities every statement format provides.
pub trait StatementParser {
    /// Page texts in, raw transactions out, in the order they appear.
    fn extract(&self, pages: &[String]) -> Vec<String>;

    /// Reduce a raw transaction to the text handed to the classifier.
    /// Must be idempotent.
    fn normalize(&self, raw: &str) -> String;

    /// Date and amount from the raw transaction text.
    fn extract_fields(&self, raw: &str) -> Option<StatementFields>;

    /// Income/expense direction when the format exposes it.
    fn transaction_type(&self, _raw: &str) -> Option<TransactionType> {
        None
    }
}

/// Statement formats the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Bank of America credit card statements
    Boa,
    /// Charles Schwab brokerage/checking statements
    Schwab,
    /// Barclays credit card statements
    Barclays,
    /// PayPal activity statements
    Paypal,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 4] = [
        SourceFormat::Boa,
        SourceFormat::Schwab,
        SourceFormat::Barclays,
        SourceFormat::Paypal,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SourceFormat::Boa => "boa",
            SourceFormat::Schwab => "schwab",
            SourceFormat::Barclays => "barclays",
            SourceFormat::Paypal => "paypal",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Boa => "Bank of America",
            SourceFormat::Schwab => "Schwab",
            SourceFormat::Barclays => "Barclays",
            SourceFormat::Paypal => "PayPal",
        }
    }

    pub fn from_key(key: &str) -> Option<SourceFormat> {
        Self::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Folder under the data directory holding this format's documents.
    pub fn default_folder(&self) -> &'static str {
        match self {
            SourceFormat::Boa => "boa_cc",
            SourceFormat::Schwab => "schwab",
            SourceFormat::Barclays => "barclays",
            SourceFormat::Paypal => "paypal",
        }
    }

    /// Whether exports of this format carry a `transaction_type` column.
    pub fn has_transaction_type(&self) -> bool {
        matches!(self, SourceFormat::Schwab)
    }

    pub fn parser(&self) -> &'static dyn StatementParser {
        match self {
            SourceFormat::Boa => &BankOfAmerica,
            SourceFormat::Schwab => &Schwab,
            SourceFormat::Barclays => &Barclays,
            SourceFormat::Paypal => &Paypal,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key() {
        assert_eq!(SourceFormat::from_key("Schwab"), Some(SourceFormat::Schwab));
        assert_eq!(SourceFormat::from_key(" boa "), Some(SourceFormat::Boa));
        assert_eq!(SourceFormat::from_key("chase"), None);
    }

    #[test]
    fn test_only_schwab_has_transaction_type() {
        let with_type: Vec<_> = SourceFormat::ALL
            .into_iter()
            .filter(|f| f.has_transaction_type())
            .collect();
        assert_eq!(with_type, vec![SourceFormat::Schwab]);
    }
}
