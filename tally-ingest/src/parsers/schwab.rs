//! Charles Schwab statements.
//!
//! Activity rows carry a MM/DD date, free text, the amount and the running
//! balance:
//!   11/07 Withdrawal Zelle to J SMITH 123456 $23.10 $1,940.22
//! Some rows wrap over up to three lines with the amounts on the last line.

use regex::Regex;
use std::sync::OnceLock;
use tally_core::TransactionType;
use tracing::warn;

use crate::normalize::{collapse_whitespace, settle};
use crate::types::{StatementFields, StatementParser};

const BEGINNING_BALANCE: &str = "Beginning Balance";
const ENDING_BALANCE: &str = "Ending Balance";
const IGNORE_BLOCKS: &[&str] = &[BEGINNING_BALANCE, ENDING_BALANCE];

const DEPOSIT: &str = "Deposit";
const INTEREST_PAID: &str = "Interest Paid";
const WITHDRAWAL: &str = "Withdrawal";

fn full_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}/\d{2})\s+(.+?)\s+\$([\d,]+\.\d{2})").expect("full row regex")
    })
}

fn row_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}/\d{2})\s+(.+?)$").expect("row start regex"))
}

fn dollar_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$[\d,]+\.\d{2}").expect("dollar amount regex"))
}

/// Amount followed by the running balance at the end of a row.
fn running_balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\$[\d,]+\.\d{2})\s+\$[\d,]+\.\d{2}$").expect("running balance regex")
    })
}

fn date_and_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{2}/\d{2} |\s\$[\d,.-]+\.\d{2}$").expect("schwab description regex")
    })
}

fn reference_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{6}").expect("reference code regex"))
}

enum ScanState {
    Idle,
    AwaitingLine2(String),
    AwaitingLine3(String),
}

fn finish_row(row: &str) -> String {
    let row = collapse_whitespace(row);
    running_balance_re().replace(&row, "$1").trim().to_string()
}

pub struct Schwab;

impl StatementParser for Schwab {
    fn extract(&self, pages: &[String]) -> Vec<String> {
        let mut out = Vec::new();

        for page in pages {
            let mut state = ScanState::Idle;

            for line in page.lines() {
                if IGNORE_BLOCKS.iter().any(|b| line.contains(b)) {
                    continue;
                }

                state = match state {
                    ScanState::Idle => {
                        if full_row_re().is_match(line) {
                            out.push(finish_row(line));
                            ScanState::Idle
                        } else if row_start_re().is_match(line) {
                            ScanState::AwaitingLine2(line.to_string())
                        } else {
                            ScanState::Idle
                        }
                    }
                    ScanState::AwaitingLine2(mut row) => {
                        row.push(' ');
                        row.push_str(line);
                        if dollar_amount_re().is_match(line) {
                            out.push(finish_row(&row));
                            ScanState::Idle
                        } else {
                            ScanState::AwaitingLine3(row)
                        }
                    }
                    ScanState::AwaitingLine3(mut row) => {
                        row.push(' ');
                        row.push_str(line);
                        out.push(finish_row(&row));
                        ScanState::Idle
                    }
                };
            }

            match state {
                ScanState::Idle => {}
                ScanState::AwaitingLine2(row) | ScanState::AwaitingLine3(row) => {
                    warn!(transaction = %row, "unfinished Schwab transaction dropped at page end");
                }
            }
        }

        out
    }

    fn normalize(&self, raw: &str) -> String {
        settle(raw, |s| {
            let trimmed = date_and_amount_re().replace_all(s.trim(), "");
            collapse_whitespace(&reference_code_re().replace_all(&trimmed, ""))
        })
    }

    fn extract_fields(&self, raw: &str) -> Option<StatementFields> {
        super::numeric_date_fields(raw)
    }

    fn transaction_type(&self, raw: &str) -> Option<TransactionType> {
        let kind = if raw.contains(WITHDRAWAL) {
            TransactionType::Expense
        } else if raw.contains(DEPOSIT) || raw.contains(INTEREST_PAID) {
            TransactionType::Income
        } else {
            TransactionType::Unknown
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> Vec<String> {
        vec![text.to_string()]
    }

    #[test]
    fn test_two_line_row_merged() {
        let txns = Schwab.extract(&page("11/07 STOP & SHOP\n$23.10"));
        assert_eq!(txns, vec!["11/07 STOP & SHOP $23.10"]);
        let f = Schwab.extract_fields(&txns[0]).unwrap();
        assert_eq!(f.date, "11/07");
        assert_eq!(f.amount, "23.10");
    }

    #[test]
    fn test_single_line_row_drops_running_balance() {
        let txns = Schwab.extract(&page(
            "Date Description Amount Balance\n11/07 Withdrawal Zelle to J SMITH 123456 $23.10 $1,940.22",
        ));
        assert_eq!(txns, vec!["11/07 Withdrawal Zelle to J SMITH 123456 $23.10"]);
    }

    #[test]
    fn test_three_line_row() {
        let txns = Schwab.extract(&page(
            "11/15 Deposit\nATHENA DIRECT DEP 654321\n$2,000.00 $3,940.22\n11/16 Interest Paid $0.42 $3,940.64",
        ));
        assert_eq!(
            txns,
            vec![
                "11/15 Deposit ATHENA DIRECT DEP 654321 $2,000.00",
                "11/16 Interest Paid $0.42",
            ]
        );
    }

    #[test]
    fn test_balance_lines_and_noise_ignored() {
        let txns = Schwab.extract(&page(
            "11/01 Beginning Balance $1,000.00\nPage 2 of 4\n11/30 Ending Balance $1,200.00",
        ));
        assert!(txns.is_empty());
    }

    #[test]
    fn test_unfinished_row_dropped_at_page_end() {
        let txns = Schwab.extract(&vec![
            "11/20 Check Paid".to_string(),
            "11/21 Withdrawal ATM $40.00 $900.00".to_string(),
        ]);
        assert_eq!(txns, vec!["11/21 Withdrawal ATM $40.00"]);
    }

    #[test]
    fn test_normalize_removes_reference_codes() {
        assert_eq!(Schwab.normalize("11/07 STOP & SHOP $23.10"), "STOP & SHOP");
        assert_eq!(
            Schwab.normalize("11/15 Deposit ATHENA DIRECT DEP 654321 $2,000.00"),
            "Deposit ATHENA DIRECT DEP"
        );
        assert_eq!(
            Schwab.normalize("11/07 Withdrawal 123456Zelle to J SMITH $23.10"),
            "Withdrawal Zelle to J SMITH"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "11/15 Deposit ATHENA DIRECT DEP 654321 $2,000.00",
            "11/07 12/01 DOUBLE DATE $1.00 $2.00",
            "1234567890123",
        ] {
            let once = Schwab.normalize(raw);
            assert_eq!(Schwab.normalize(&once), once);
        }
    }

    #[test]
    fn test_transaction_type() {
        assert_eq!(
            Schwab.transaction_type("11/15 Deposit ATHENA $2,000.00"),
            Some(TransactionType::Income)
        );
        assert_eq!(
            Schwab.transaction_type("11/16 Interest Paid $0.42"),
            Some(TransactionType::Income)
        );
        assert_eq!(
            Schwab.transaction_type("11/07 Withdrawal Deposit Return $5.00"),
            Some(TransactionType::Expense)
        );
        assert_eq!(
            Schwab.transaction_type("11/20 Check Paid $80.00"),
            Some(TransactionType::Unknown)
        );
    }
}
