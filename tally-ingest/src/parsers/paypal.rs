//! PayPal activity statements.
//!
//! Rows are narrative text where the description may wrap:
//!   01/05/2025 PreApproved Payment Bill User Payment: Spotify
//!   USA 10.99 USD
//! so the whole page is matched at once instead of line by line.

use regex::Regex;
use std::sync::OnceLock;

use crate::normalize::{collapse_whitespace, settle};
use crate::types::{StatementFields, StatementParser};

fn payment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)(\d{2}/\d{2}/\d{4})\s+(.+?)\s+([\d,]+\.\d{2})\s+USD").expect("payment regex")
    })
}

fn boilerplate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"PreApproved Payment Bill User Payment:\s*").expect("boilerplate regex")
    })
}

fn date_and_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{2}/\d{2}/\d{4}\s+|\s+[\d,]+\.\d{2}(\s+USD)?$").expect("paypal description regex")
    })
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)(\d{2}/\d{2}/\d{4})\s+(.+?)\s+([\d,]+\.\d{2})").expect("paypal row regex")
    })
}

pub struct Paypal;

impl StatementParser for Paypal {
    fn extract(&self, pages: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        for page in pages {
            for caps in payment_re().captures_iter(page) {
                let description = boilerplate_re().replace_all(&caps[2], "");
                out.push(format!(
                    "{} {} {}",
                    &caps[1],
                    collapse_whitespace(&description),
                    &caps[3]
                ));
            }
        }
        out
    }

    fn normalize(&self, raw: &str) -> String {
        settle(raw, |s| {
            let trimmed = date_and_amount_re().replace_all(s.trim(), "");
            collapse_whitespace(&boilerplate_re().replace_all(&trimmed, ""))
        })
    }

    fn extract_fields(&self, raw: &str) -> Option<StatementFields> {
        let caps = row_re().captures(raw)?;
        Some(StatementFields {
            date: caps[1].to_string(),
            amount: caps[3].to_string(),
        })
    }
}
