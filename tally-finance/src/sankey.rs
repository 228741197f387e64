//! SankeyMATIC flow text from category totals.

use std::fmt;
use tally_core::display_label;
use tracing::error;

use crate::rollup::CategoryTotals;

/// Top-level categories that flow into the budget instead of out of it.
pub const DEFAULT_INCOME: &[&str] = &["WAGES", "SALARY", "TAKE_HOME_PAY"];

const BUDGET: &str = "Budget";
const WAGES: &str = "Wages";
const SAVINGS: &str = "Savings";
const OVERSPENDING: &str = "Overspending";

/// One `Source [amount] Target` line, labels still in category form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLine {
    pub source: String,
    pub amount: i64,
    pub target: String,
}

impl FlowLine {
    fn new(source: &str, amount: i64, target: &str) -> Self {
        Self {
            source: source.to_string(),
            amount,
            target: target.to_string(),
        }
    }

    fn is_balance(&self) -> bool {
        [self.source.as_str(), self.target.as_str()]
            .iter()
            .any(|l| *l == SAVINGS || *l == OVERSPENDING)
    }
}

impl fmt::Display for FlowLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            display_label(&self.source),
            self.amount,
            display_label(&self.target)
        )
    }
}

/// Build the sorted flow lines for `totals`.
///
/// Lines are ordered by the display label of the target's parent, or by
/// `"<source> <amount>"` when the target has none. Savings and overspending
/// lines always come last.
pub fn flow_lines(totals: &CategoryTotals, income: &[String]) -> Vec<FlowLine> {
    let is_income = |token: &str| income.iter().any(|c| c == token);

    let mut lines = Vec::new();
    let mut wages_total = 0i64;
    let mut total_expenses = 0i64;

    for (category, amount) in totals.top_level() {
        if is_income(category) {
            wages_total += amount;
            continue;
        }
        total_expenses += amount;
        if amount == 0 {
            error!(category, "dropping zero amount category");
            continue;
        }
        lines.push(FlowLine::new(BUDGET, amount, category));
    }

    if total_expenses > wages_total {
        lines.push(FlowLine::new(OVERSPENDING, total_expenses - wages_total, BUDGET));
    } else if total_expenses < wages_total {
        lines.push(FlowLine::new(BUDGET, wages_total - total_expenses, SAVINGS));
    }
    lines.push(FlowLine::new(WAGES, wages_total, BUDGET));

    for (child, parent) in totals.edges() {
        let Some(amount) = totals.total(child) else {
            continue;
        };
        if amount == 0 {
            error!(category = child, parent, "dropping zero amount category");
            continue;
        }
        if is_income(totals.root(child)) {
            lines.push(FlowLine::new(child, amount, parent));
        } else {
            lines.push(FlowLine::new(parent, amount, child));
        }
    }

    let (mut flows, balance): (Vec<_>, Vec<_>) = lines.into_iter().partition(|l| !l.is_balance());
    flows.sort_by_cached_key(|line| match totals.parent(&line.target) {
        Some(parent) => display_label(parent),
        None => format!("{} {}", display_label(&line.source), line.amount),
    });
    flows.extend(balance);
    flows
}

/// Render flow lines in SankeyMATIC input format.
pub fn format_sankey(lines: &[FlowLine]) -> String {
    lines
        .iter()
        .map(FlowLine::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
