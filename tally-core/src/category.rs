//! Compound category labels.
//!
//! Classifier labels may hold several words, most general first:
//! `"UTILITIES WATER"` is the `WATER` level below `UTILITIES`.

/// Labels whose display form is not plain title case.
const DISPLAY_OVERRIDES: &[(&str, &str)] = &[
    ("ATT", "AT&T"),
    ("AWS", "AWS"),
    ("CVS", "CVS"),
    ("DMV", "DMV"),
    ("HBO", "HBO"),
    ("HOA", "HOA"),
    ("IRS", "IRS"),
    ("TV", "TV"),
    ("USPS", "USPS"),
    ("1PASSWORD", "1Password"),
    ("EZPASS", "E-ZPass"),
    ("PAYPAL", "PayPal"),
    ("YOUTUBE", "YouTube"),
];

/// Hierarchy levels of a category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPath {
    levels: Vec<String>,
}

impl CategoryPath {
    /// Split on whitespace. A token seen earlier in the label is dropped, so
    /// `"FOOD FOOD"` is the single level `FOOD`.
    pub fn parse(label: &str) -> Self {
        let mut levels: Vec<String> = Vec::new();
        for token in label.split_whitespace() {
            if !levels.iter().any(|l| l == token) {
                levels.push(token.to_string());
            }
        }
        Self { levels }
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// `(child, parent)` for every adjacent pair of levels, general to specific.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.levels
            .windows(2)
            .map(|w| (w[1].as_str(), w[0].as_str()))
    }
}

/// Human-facing form of a category token or flow label.
pub fn display_label(label: &str) -> String {
    if let Some((_, shown)) = DISPLAY_OVERRIDES.iter().find(|(raw, _)| *raw == label) {
        return (*shown).to_string();
    }
    label
        .split('_')
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
