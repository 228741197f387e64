//! Records the classifier was unsure about.

use tally_core::CategorizedRecord;

pub struct ReviewReport<'a> {
    pub total: usize,
    pub needs_input: Vec<&'a CategorizedRecord>,
}

impl<'a> ReviewReport<'a> {
    pub fn new(records: &'a [CategorizedRecord]) -> Self {
        Self {
            total: records.len(),
            needs_input: records.iter().filter(|r| r.needs_input()).collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.needs_input.is_empty()
    }

    /// Operator-facing summary, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        if self.is_clean() {
            return vec![format!("Confidently categorized all {} transactions", self.total)];
        }
        let mut out = vec![format!("Input needed for {} transactions", self.needs_input.len())];
        for r in &self.needs_input {
            out.push(format!(
                "  {} | {} | {} | {}",
                r.date.as_deref().unwrap_or("-"),
                r.amount.as_deref().unwrap_or("-"),
                r.description,
                r.raw_transaction
            ));
        }
        out
    }
}
