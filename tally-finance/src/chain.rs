//! Prompt policy per statement source and the chain that sends it to a model.

use anyhow::Result;
use tally_ingest::SourceFormat;

const CATEGORY_PROMPT: &str = "Categorize the following transaction, for example STOP & SHOP are Groceries and SHELL OIL is Gas.";
const CATEGORY_UPPERCASE: &str = "Categories must be in UPPERCASE.";
const UNCERTAINTY: &str = "If you are less than 100 percent certain of the category, return 'INPUT NEEDED'.";
const CATEGORY_SINGLE_WORD: &str = "Categories must be single words whenever possible and as short as possible ('HOTEL', not 'HOTEL ACCOMODATION').";
const ONLY_PRINT_CATEGORY: &str = "Print no other text than the category.";

const SUBSCRIPTION_HINT: &str = "1PASSWORD and APPLE.COM are each a SUBSCRIPTION category.";
const INSURANCE_BILL_HINT: &str = "BUNKERHILL and PLYMOUTH ROCK are INSURANCE BILL categories. UNIPAYFEE ONE FEE is a UTILITIES BILL.";
const WAGES_HINT: &str = "ATHENA DIRECT DEP and GUSTO are WAGES category. A.L. PRIME is a GAS category.";

/// Text-completion model behind the classifier.
pub trait CompletionBackend {
    /// Stable name of the model, e.g. `ollama/gemma2:27b`.
    fn identity(&self) -> String;

    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Category hints and answer rules for one statement source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPolicy {
    hints: Vec<String>,
}

impl CategoryPolicy {
    pub fn new(hints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            hints: hints.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in hints for the accounts each source usually carries.
    pub fn for_format(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Boa => Self::new([
                "BA ELECTRONIC PAYMENT is a CREDIT CARD PAYMENT.",
                "ATT is a PHONE BILL.",
                SUBSCRIPTION_HINT,
                "INTEREST CHARGED is a INTEREST category.",
                "DENTE ENTERPRISES LLC and TA WEST GREENWICH are each a FOOD category. A.L. PRIME is a GAS category.",
            ]),
            SourceFormat::Schwab => Self::new([
                "BARCLAYCARD US CREDITCARD is a CREDIT CARD PAYMENT.",
                "PAYPAL is a IGNORE category.",
                INSURANCE_BILL_HINT,
                SUBSCRIPTION_HINT,
                "Check Paid is a CHECK category.",
                WAGES_HINT,
            ]),
            SourceFormat::Barclays => Self::new([INSURANCE_BILL_HINT, SUBSCRIPTION_HINT]),
            SourceFormat::Paypal => Self::new([
                "Valve is a GAMES category.",
                "Spotify is a SUBSCRIPTION category.",
            ]),
        }
    }

    pub fn with_hints(mut self, extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hints.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Instruction text shared by every transaction of this policy.
    pub fn instructions(&self) -> String {
        let mut parts: Vec<&str> = vec![CATEGORY_PROMPT];
        parts.extend(self.hints.iter().map(|h| h.trim()));
        parts.extend([
            CATEGORY_UPPERCASE,
            UNCERTAINTY,
            CATEGORY_SINGLE_WORD,
            ONLY_PRINT_CATEGORY,
        ]);
        parts.join(" ")
    }

    pub fn prompt(&self, description: &str) -> String {
        format!("{}\n {}", self.instructions(), description)
    }
}

/// A policy bound to a backend.
pub struct CategoryChain<'a> {
    policy: CategoryPolicy,
    backend: &'a dyn CompletionBackend,
}

impl<'a> CategoryChain<'a> {
    pub fn new(policy: CategoryPolicy, backend: &'a dyn CompletionBackend) -> Self {
        Self { policy, backend }
    }

    /// Changes whenever the model or the instructions change.
    pub fn identity(&self) -> String {
        format!("{}|{}", self.backend.identity(), self.policy.instructions())
    }

    pub fn invoke(&self, description: &str) -> Result<String> {
        let raw = self.backend.complete(&self.policy.prompt(description))?;
        Ok(raw.trim().to_string())
    }
}
