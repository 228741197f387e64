//! Bank of America credit card statements.
//!
//! The activity table comes out of PDF-to-text as one long line per section:
//!   TransactionsTransactionDate PostingDate Description ReferenceNumber...
//!   Purchases and Adjustments10/02 10/03 STOP & SHOP 1234 5678 23.1010/04 ...
//! Row boundaries have to be put back before the rows can be read.

use regex::Regex;
use std::sync::OnceLock;

use crate::normalize::{collapse_whitespace, settle};
use crate::types::{StatementFields, StatementParser};

const TABLE_HEADER: &str = "TransactionsTransactionDate PostingDate Description ReferenceNumber";
const TABLE_CONTINUED_HEADER: &str =
    "Transactions ContinuedTransactionDate PostingDate Description ReferenceNumber";
const PAYMENTS_AND_OTHER_CREDITS: &str = "Payments and Other Credits";
const PURCHASES_AND_ADJUSTMENTS: &str = "Purchases and Adjustments";
const INTEREST_CHARGED: &str = "Interest Charged";
const TOTAL_PAYMENTS: &str = "TOTAL PAYMENTS AND OTHER CREDITS FOR THIS PERIOD";
const TOTAL_PURCHASES: &str = "TOTAL PURCHASES AND ADJUSTMENTS FOR THIS PERIOD";

/// Lines containing any of these are table furniture, not transactions.
const IGNORE_BLOCKS: &[&str] = &[
    TABLE_HEADER,
    TABLE_CONTINUED_HEADER,
    INTEREST_CHARGED,
    PAYMENTS_AND_OTHER_CREDITS,
    PURCHASES_AND_ADJUSTMENTS,
    TOTAL_PAYMENTS,
    TOTAL_PURCHASES,
];

fn arrival_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ARRIVAL DATE \d{2}/\d{2}/\d{2}").expect("arrival date regex"))
}

fn continued_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"continued on next page\.\.\.").expect("continued regex"))
}

fn merged_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2})(\d{2})/(\d{2})").expect("merged date regex"))
}

fn description_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{2}/\d{2} \d{2}/\d{2} |\s\d{4} \d{4} [\d,.-]+\.\d{2}$")
            .expect("boa description regex")
    })
}

/// Rewrite one table line so that every row sits on its own line.
fn split_table_line(line: &str) -> String {
    let text = arrival_date_re().replace_all(line, "");
    let text = continued_re().replace_all(&text, "");
    let text = text.replace(
        PURCHASES_AND_ADJUSTMENTS,
        &format!("\n{PURCHASES_AND_ADJUSTMENTS}\n"),
    );
    let text = text.replace(TOTAL_PURCHASES, &format!("\n{TOTAL_PURCHASES}\n"));
    let text = text.replace(TOTAL_PAYMENTS, &format!("\n{TOTAL_PAYMENTS}"));
    let text = text.replace(
        PAYMENTS_AND_OTHER_CREDITS,
        &format!("{PAYMENTS_AND_OTHER_CREDITS}\n"),
    );
    // "23.1010/04" -> "23.10\n10/04": the four digits before a slash belong to
    // the previous amount (two) and the next date (two).
    merged_date_re().replace_all(&text, "$1\n$2/$3").into_owned()
}

pub struct BankOfAmerica;

impl StatementParser for BankOfAmerica {
    fn extract(&self, pages: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        for page in pages {
            for line in page.lines() {
                if !(line.contains(TABLE_HEADER) || line.contains(TABLE_CONTINUED_HEADER)) {
                    continue;
                }
                for block in split_table_line(line).split('\n') {
                    if block.is_empty() || IGNORE_BLOCKS.iter().any(|b| block.contains(b)) {
                        continue;
                    }
                    out.push(block.to_string());
                }
            }
        }
        out
    }

    fn normalize(&self, raw: &str) -> String {
        settle(raw, |s| collapse_whitespace(&description_re().replace_all(s, "")))
    }

    fn extract_fields(&self, raw: &str) -> Option<StatementFields> {
        super::numeric_date_fields(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> String {
        concat!(
            "Account summary\n",
            "TransactionsTransactionDate PostingDate Description ReferenceNumber",
            "AccountNumber AmountTotalPayments and Other Credits",
            "09/28 09/28 BA ELECTRONIC PAYMENT 4411 2233 -1,200.00",
            "TOTAL PAYMENTS AND OTHER CREDITS FOR THIS PERIOD -$1,200.00",
            "Purchases and Adjustments",
            "10/02 10/03 STOP & SHOP 0012 1234 5678 23.10",
            "10/04 10/05 DELTA AIR ARRIVAL DATE 10/20/24 8765 4321 412.00",
            "TOTAL PURCHASES AND ADJUSTMENTS FOR THIS PERIOD",
            "continued on next page...\n",
            "Interest Charged\n",
        )
        .to_string()
    }

    #[test]
    fn test_extracts_rows_in_order() {
        let txns = BankOfAmerica.extract(&[page()]);
        assert_eq!(
            txns,
            vec![
                "09/28 09/28 BA ELECTRONIC PAYMENT 4411 2233 -1,200.00",
                "10/02 10/03 STOP & SHOP 0012 1234 5678 23.10",
                "10/04 10/05 DELTA AIR  8765 4321 412.00",
            ]
        );
    }

    #[test]
    fn test_ignores_pages_without_table() {
        let pages = vec!["10/02 10/03 STOP & SHOP 1234 5678 23.10".to_string()];
        assert!(BankOfAmerica.extract(&pages).is_empty());
    }

    #[test]
    fn test_normalize_strips_dates_and_reference() {
        let d = BankOfAmerica.normalize("10/02 10/03 STOP & SHOP 0012 1234 5678 23.10");
        assert_eq!(d, "STOP & SHOP 0012");
        let d = BankOfAmerica.normalize("10/04 10/05 DELTA AIR  8765 4321 412.00");
        assert_eq!(d, "DELTA AIR");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "09/28 09/28 BA ELECTRONIC PAYMENT 4411 2233 -1,200.00",
            "01/02 03/04 05/06 07/08 NESTED 1111 2222 3.00",
            "plain text",
        ] {
            let once = BankOfAmerica.normalize(raw);
            assert_eq!(BankOfAmerica.normalize(&once), once);
        }
    }

    #[test]
    fn test_extract_fields() {
        let f = BankOfAmerica
            .extract_fields("09/28 09/28 BA ELECTRONIC PAYMENT 4411 2233 -1,200.00")
            .unwrap();
        assert_eq!(f.date, "09/28");
        assert_eq!(f.amount, "-1,200.00");
    }
}
