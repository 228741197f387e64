//! Barclays credit card statements.
//!
//! Rows start with transaction and posting dates and end with a dollar amount,
//! optionally preceded by the points earned:
//!   Oct 07 Oct 09 SHELL OIL 123 $45.67
//!   Jan 15 Jan 15 DELTA AIR LINES 1,234 $1,234.00
//! Long descriptions wrap, so a row may end several lines after it started.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::normalize::{collapse_whitespace, settle};
use crate::types::{StatementFields, StatementParser};

const PAYMENT_RECEIVED: &str = "Payment Received";
const IGNORE_BLOCKS: &[&str] = &[PAYMENT_RECEIVED];

fn row_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w{3} \d{2}) (\w{3} \d{2}) (.+?)$").expect("row start regex"))
}

/// Rows always end with a two-decimal dollar amount; negatives put `-` before `$`.
fn dollar_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\$([\d,]+\.\d{2})").expect("dollar amount regex"))
}

fn dates_and_points_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\w{3} \d{2}) (\w{3} \d{2})|\s\d+$").expect("dates and points regex")
    })
}

fn word_date_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\w{3} \d{2}).*?(-?)\$([\d,]+\.\d{2})$").expect("word date/amount regex")
    })
}

pub struct Barclays;

impl StatementParser for Barclays {
    fn extract(&self, pages: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        // A wrapped row may continue on the next page.
        let mut pending: Option<String> = None;

        for page in pages {
            for line in page.lines() {
                if IGNORE_BLOCKS.iter().any(|b| line.contains(b)) {
                    continue;
                }

                if let Some(mut txn) = pending.take() {
                    txn.push_str(line);
                    if dollar_amount_re().is_match(line) {
                        out.push(txn);
                    } else {
                        pending = Some(txn);
                    }
                    continue;
                }

                if row_start_re().is_match(line) {
                    if dollar_amount_re().is_match(line) {
                        out.push(line.to_string());
                    } else {
                        pending = Some(line.to_string());
                    }
                }
            }
        }

        if let Some(txn) = pending {
            warn!(transaction = %txn, "unfinished Barclays transaction dropped");
        }

        out.iter().map(|t| collapse_whitespace(t)).collect()
    }

    fn normalize(&self, raw: &str) -> String {
        settle(raw, |s| {
            let without_amount = dollar_amount_re().replace_all(s.trim(), "");
            collapse_whitespace(&dates_and_points_re().replace_all(without_amount.trim(), ""))
        })
    }

    fn extract_fields(&self, raw: &str) -> Option<StatementFields> {
        let caps = word_date_amount_re().captures(raw.trim())?;
        Some(StatementFields {
            date: caps[1].to_string(),
            amount: format!("{}{}", &caps[2], &caps[3]),
        })
    }
}
