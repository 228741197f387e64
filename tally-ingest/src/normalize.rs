//! Text helpers shared by the statement parsers.

use regex::Regex;
use std::sync::OnceLock;

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Collapse every whitespace run (line breaks included) to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    ws_re().replace_all(text, " ").trim().to_string()
}

/// Apply `pass` until the text stops changing.
///
/// Every pass either strips characters or rewrites whitespace runs, so the
/// loop ends after at most one step per stripped token.
pub fn settle(text: &str, pass: impl Fn(&str) -> String) -> String {
    let mut current = pass(text);
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
