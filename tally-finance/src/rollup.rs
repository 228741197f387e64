//! Category rollup across every categorized export.
//!
//! Each record adds its amount to every level of its category label, so
//! `"UTILITIES WATER"` counts toward both `UTILITIES` and `WATER`, and `WATER`
//! is remembered as a child of `UTILITIES`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tally_core::{CategorizedRecord, CategoryPath};
use tracing::{info, warn};

use crate::export::{read_categorized_csv, RollupRow};

/// Categories that move money between own accounts rather than earning or spending it.
pub const DEFAULT_IGNORED: &[&str] = &[
    "IGNORE",
    "BANKING",
    "INTEREST",
    "INVESTMENT",
    "VENMO_PAYMENT",
    "CASHOUT",
    "CREDIT_CARD_PAYMENT",
    "CREDIT CARD PAYMENT",
    "BANK_TRANSFER",
    "BANK TRANSFER",
];

#[derive(Debug, Clone)]
pub struct RollupRules {
    pub ignore: Vec<String>,
    /// Whole-label rewrites applied before the label is split into levels.
    pub aliases: BTreeMap<String, String>,
}

impl Default for RollupRules {
    fn default() -> Self {
        Self {
            ignore: DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect(),
            aliases: BTreeMap::new(),
        }
    }
}

impl RollupRules {
    pub fn is_ignored(&self, category: &str) -> bool {
        self.ignore.iter().any(|c| c == category)
    }

    pub fn resolve<'a>(&'a self, category: &'a str) -> &'a str {
        self.aliases.get(category).map(String::as_str).unwrap_or(category)
    }
}

/// Parse a statement amount such as `1,234.56`. `None` for missing or non-numeric text.
pub fn parse_amount(raw: Option<&str>) -> Option<f64> {
    let cleaned = raw?.trim().replace([',', '$'], "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accumulated amount per category level plus the child -> parent links.
///
/// Iteration follows first-seen order, which keeps the flow output stable
/// for a given set of exports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    totals: HashMap<String, i64>,
    order: Vec<String>,
    parents: HashMap<String, String>,
    children: Vec<String>,
}

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `token`, rounding the running total after the addition.
    ///
    /// Rounding happens on every call (ties to even), not once at the end, so
    /// totals can drift from the exact sum by up to half a unit per record.
    pub fn accumulate(&mut self, token: &str, amount: f64) {
        let current = match self.totals.get(token) {
            Some(v) => *v,
            None => {
                self.order.push(token.to_string());
                0
            }
        };
        let next = (current as f64 + amount).round_ties_even() as i64;
        self.totals.insert(token.to_string(), next);
    }

    /// Overwrite the total of `token`.
    #[cfg(test)]
    pub(crate) fn set_total(&mut self, token: &str, amount: i64) {
        if !self.totals.contains_key(token) {
            self.order.push(token.to_string());
        }
        self.totals.insert(token.to_string(), amount);
    }

    /// Record `parent` as the parent of `child`; a later call for the same child wins.
    pub fn set_parent(&mut self, child: &str, parent: &str) {
        if self
            .parents
            .insert(child.to_string(), parent.to_string())
            .is_none()
        {
            self.children.push(child.to_string());
        }
    }

    pub fn total(&self, token: &str) -> Option<i64> {
        self.totals.get(token).copied()
    }

    pub fn parent(&self, child: &str) -> Option<&str> {
        self.parents.get(child).map(String::as_str)
    }

    /// Follow parent links up to the most general level.
    pub fn root<'a>(&'a self, token: &'a str) -> &'a str {
        let mut current = token;
        // bounded walk: labels like "A B" and "B A" make a cycle
        for _ in 0..=self.children.len() {
            match self.parent(current) {
                Some(p) => current = p,
                None => break,
            }
        }
        current
    }

    /// Every category level and its total, first-seen order.
    pub fn totals(&self) -> impl Iterator<Item = (&str, i64)> {
        self.order
            .iter()
            .map(|t| (t.as_str(), self.totals.get(t).copied().unwrap_or(0)))
    }

    /// Levels that are nobody's child.
    pub fn top_level(&self) -> impl Iterator<Item = (&str, i64)> {
        self.totals().filter(|(t, _)| !self.parents.contains_key(*t))
    }

    /// `(child, parent)` links, in the order children were first seen.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.children
            .iter()
            .filter_map(|c| self.parent(c).map(|p| (c.as_str(), p)))
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Fold records into the totals. Ignored categories and records still
    /// marked `INPUT NEEDED` are skipped.
    pub fn count_categories<'r>(
        &mut self,
        records: impl IntoIterator<Item = &'r CategorizedRecord>,
        rules: &RollupRules,
    ) {
        for record in records {
            if rules.is_ignored(&record.category) {
                continue;
            }
            if record.needs_input() {
                warn!(transaction = %record.raw_transaction, "record still needs review, left out of totals");
                continue;
            }

            let amount = match parse_amount(record.amount.as_deref()) {
                Some(v) => v,
                None => {
                    warn!(
                        transaction = %record.raw_transaction,
                        amount = record.amount.as_deref().unwrap_or(""),
                        "amount could not be converted, counting zero"
                    );
                    0.0
                }
            };

            let path = CategoryPath::parse(rules.resolve(&record.category));
            for (child, parent) in path.edges() {
                self.set_parent(child, parent);
            }
            for level in path.levels() {
                self.accumulate(level, amount);
            }
        }
    }
}

/// Export selection for one month, matching `2025-01` or `Jan-2025` in file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthFilter {
    numeric: String,
    named: String,
}

impl MonthFilter {
    /// `month` is `YYYY-MM`.
    pub fn parse(month: &str) -> Result<Self> {
        let first = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
            .with_context(|| format!("invalid month '{month}', expected YYYY-MM"))?;
        Ok(Self {
            numeric: first.format("%Y-%m").to_string(),
            named: first.format("%b-%Y").to_string(),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        let name = path.to_string_lossy();
        name.contains(&self.numeric) || name.contains(&self.named)
    }
}

/// All exports merged into one dataset plus their category totals.
#[derive(Debug, Default)]
pub struct Rollup {
    pub rows: Vec<RollupRow>,
    pub totals: CategoryTotals,
}

impl Rollup {
    /// Read every export in order and fold it into the rollup.
    pub fn from_exports(paths: &[PathBuf], rules: &RollupRules) -> Result<Self> {
        let mut rollup = Rollup::default();
        for path in paths {
            let records = read_categorized_csv(path)?;
            info!(path = %path.display(), rows = records.len(), "Processing {}", path.display());
            rollup.totals.count_categories(&records, rules);
            let source = path.display().to_string();
            rollup
                .rows
                .extend(records.into_iter().map(|r| RollupRow::new(r, source.clone())));
        }
        Ok(rollup)
    }
}
