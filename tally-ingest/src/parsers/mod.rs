pub mod barclays;
pub mod boa;
pub mod paypal;
pub mod schwab;

use regex::Regex;
use std::sync::OnceLock;

use crate::types::StatementFields;

fn numeric_date_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}/\d{2}).*?(-?[\d,]+\.\d{2})$").expect("date/amount regex"))
}

/// `MM/DD ... -1,234.56` rows: leading date and trailing signed amount.
pub(crate) fn numeric_date_fields(raw: &str) -> Option<StatementFields> {
    let caps = numeric_date_amount_re().captures(raw.trim())?;
    Some(StatementFields {
        date: caps[1].to_string(),
        amount: caps[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_date_fields() {
        let f = numeric_date_fields("10/12 10/14 AMAZON 1234 5678 -1,020.00").unwrap();
        assert_eq!(f.date, "10/12");
        assert_eq!(f.amount, "-1,020.00");
    }

    #[test]
    fn test_numeric_date_fields_requires_trailing_amount() {
        assert!(numeric_date_fields("10/12 PENDING").is_none());
        assert!(numeric_date_fields("AMAZON 12.00").is_none());
    }
}
