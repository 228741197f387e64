//! Folder-level runs behind the `categorize`, `rollup` and `classify` commands.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tally_finance::export::{categorized_csv_path, is_categorized_csv, write_categorized_csv, write_rollup_csv};
use tally_finance::{
    categorize_document, classify_memoized, flow_lines, format_sankey, CategoryChain,
    ClassificationCache, CompletionBackend, MonthFilter, ReviewReport, Rollup,
};
use tally_ingest::{find_documents, find_files_with_extension, load_pages, SourceFormat};
use tracing::{info, warn};

use crate::config::Config;

/// Categorize one document and write `<stem>_categorized.csv` next to it.
pub fn categorize_file(
    format: SourceFormat,
    doc: &Path,
    chain: &CategoryChain<'_>,
    cache: &mut ClassificationCache,
) -> Result<PathBuf> {
    info!(source = %format, path = %doc.display(), "Processing {}", doc.display());
    let pages = load_pages(doc)?;
    let records = categorize_document(format, chain, cache, &pages)
        .with_context(|| format!("categorize {}", doc.display()))?;

    let out = categorized_csv_path(doc);
    write_categorized_csv(&out, &records, format.has_transaction_type())?;

    let report = ReviewReport::new(&records);
    println!("{} ({})", doc.display(), format.name());
    for line in report.lines() {
        println!("  {line}");
    }
    Ok(out)
}

/// Categorize the given files, or every document in the source folder.
pub fn categorize_source(
    cfg: &Config,
    format: SourceFormat,
    files: &[PathBuf],
    backend: &dyn CompletionBackend,
    cache: &mut ClassificationCache,
) -> Result<Vec<PathBuf>> {
    let docs = if files.is_empty() {
        let folder = cfg.source_folder(format);
        let docs = find_documents(&folder)?;
        if docs.is_empty() {
            info!(source = %format, folder = %folder.display(), "no documents found");
        }
        docs
    } else {
        files.to_vec()
    };

    let chain = CategoryChain::new(cfg.policy_for(format), backend);
    docs.iter()
        .map(|doc| categorize_file(format, doc, &chain, cache))
        .collect()
}

/// Every categorized export under the source folders, optionally for one month.
pub fn find_exports(cfg: &Config, month: Option<&MonthFilter>) -> Result<Vec<PathBuf>> {
    let mut exports = Vec::new();
    for format in SourceFormat::ALL {
        let found = find_files_with_extension(cfg.source_folder(format), "csv")?;
        exports.extend(
            found
                .into_iter()
                .filter(|p| is_categorized_csv(p))
                .filter(|p| month.is_none_or(|m| m.matches(p))),
        );
    }
    Ok(exports)
}

/// Merge the exports into the rollup file and return the SankeyMATIC text.
pub fn run_rollup(cfg: &Config, month: Option<&MonthFilter>) -> Result<String> {
    let exports = find_exports(cfg, month)?;
    let rollup = Rollup::from_exports(&exports, &cfg.rollup_rules())?;
    if rollup.totals.is_empty() {
        warn!(
            data_dir = %cfg.paths.data_dir.display(),
            exports = exports.len(),
            "no categorized amounts to roll up"
        );
    }
    write_rollup_csv(cfg.rollup_path(), &rollup.rows)?;
    Ok(format_sankey(&flow_lines(&rollup.totals, &cfg.rollup.income)))
}

/// Load the classification cache named by the config.
pub fn open_cache(cfg: &Config) -> Result<ClassificationCache> {
    let cache = ClassificationCache::load(cfg.cache_path()?)?;
    if let Some(path) = cache.path() {
        info!(path = %path.display(), entries = cache.len(), "loaded classification cache");
    }
    Ok(cache)
}

/// Classify a single description with the policy of `format`.
pub fn classify_one(
    cfg: &Config,
    format: SourceFormat,
    description: &str,
    backend: &dyn CompletionBackend,
    cache: &mut ClassificationCache,
) -> Result<String> {
    let chain = CategoryChain::new(cfg.policy_for(format), backend);
    classify_memoized(cache, &chain.identity(), description.trim(), |d| chain.invoke(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::fs;

    struct Fixed {
        label: &'static str,
        calls: Cell<usize>,
        last_prompt: RefCell<String>,
    }

    impl Fixed {
        fn new(label: &'static str) -> Self {
            Self {
                label,
                calls: Cell::new(0),
                last_prompt: RefCell::new(String::new()),
            }
        }
    }

    impl CompletionBackend for Fixed {
        fn identity(&self) -> String {
            "fixed/test".to_string()
        }

        fn complete(&self, prompt: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            *self.last_prompt.borrow_mut() = prompt.to_string();
            Ok(self.label.to_string())
        }
    }

    fn config_in(dir: &Path) -> Config {
        let mut cfg = Config::default();
        cfg.paths.data_dir = dir.to_path_buf();
        cfg.paths.cache_file = Some(dir.join("cache.json"));
        cfg
    }

    #[test]
    fn test_categorize_then_rollup_for_one_month() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let folder = cfg.source_folder(SourceFormat::Paypal);
        fs::create_dir_all(&folder).unwrap();
        fs::write(
            folder.join("statement-2025-01.txt"),
            "01/05/2025 Spotify USA PreApproved Payment Bill User Payment: 10.99 USD",
        )
        .unwrap();
        fs::write(
            folder.join("statement-2025-02.txt"),
            "02/05/2025 Valve Corporation 59.99 USD",
        )
        .unwrap();

        let backend = Fixed::new("SUBSCRIPTION");
        let mut cache = open_cache(&cfg).unwrap();
        assert_eq!(cache.path(), Some(dir.path().join("cache.json").as_path()));
        let exports = categorize_source(&cfg, SourceFormat::Paypal, &[], &backend, &mut cache).unwrap();
        assert_eq!(exports.len(), 2);
        assert!(exports[0].ends_with("paypal/statement-2025-01_categorized.csv"));
        assert_eq!(backend.calls.get(), 2);

        let january = MonthFilter::parse("2025-01").unwrap();
        assert_eq!(find_exports(&cfg, Some(&january)).unwrap().len(), 1);

        let sankey = run_rollup(&cfg, Some(&january)).unwrap();
        assert_eq!(
            sankey,
            "Budget [11] Subscription\nWages [0] Budget\nOverspending [11] Budget"
        );
        assert!(cfg.rollup_path().exists());
        // the rollup file itself is never picked up as an export
        assert_eq!(find_exports(&cfg, None).unwrap().len(), 2);
    }

    #[test]
    fn test_classify_one_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let backend = Fixed::new("GAS\n");
        let mut cache = open_cache(&cfg).unwrap();
        let first = classify_one(&cfg, SourceFormat::Barclays, " SHELL OIL ", &backend, &mut cache).unwrap();
        let second = classify_one(&cfg, SourceFormat::Barclays, "SHELL OIL", &backend, &mut cache).unwrap();
        assert_eq!(first, "GAS");
        assert_eq!(second, "GAS");
        assert_eq!(backend.calls.get(), 1);
    }

    #[test]
    fn test_configured_hints_reach_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.hints.insert(
            "barclays".to_string(),
            vec!["NETFLIX is a SUBSCRIPTION category.".to_string()],
        );
        let backend = Fixed::new("SUBSCRIPTION");
        let mut cache = open_cache(&cfg).unwrap();

        let label = classify_one(&cfg, SourceFormat::Barclays, "NETFLIX.COM", &backend, &mut cache).unwrap();
        assert_eq!(label, "SUBSCRIPTION");
        let prompt = backend.last_prompt.borrow();
        assert!(prompt.contains("NETFLIX is a SUBSCRIPTION category."));
        assert!(prompt.ends_with("\n NETFLIX.COM"));
    }

    #[test]
    fn test_rollup_without_exports_still_writes_flow() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let sankey = run_rollup(&cfg, None).unwrap();
        assert_eq!(sankey, "Wages [0] Budget");
        assert!(cfg.rollup_path().exists());
    }
}
