use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tally_finance::rollup::DEFAULT_IGNORED;
use tally_finance::sankey::DEFAULT_INCOME;
use tally_finance::{CategoryPolicy, RollupRules};
use tally_ingest::SourceFormat;

use crate::state::{default_cache_path, ensure_tally_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub paths: PathsSection,
    /// Folder name per source key (`boa`, `schwab`, `barclays`, `paypal`), relative to `data_dir`.
    pub sources: BTreeMap<String, String>,
    /// Extra category hint sentences per source key, added to the built-in ones.
    pub hints: BTreeMap<String, Vec<String>>,
    pub rollup: RollupSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSection {
    /// `ollama`, `openai` or `anthropic`
    pub provider: String,
    pub model: String,
    /// Provider default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "gemma2:27b".to_string(),
            base_url: None,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsSection {
    pub data_dir: PathBuf,
    /// `~/.tally/classifications.json` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
    /// Relative paths are resolved against `data_dir`.
    pub rollup_file: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_file: None,
            rollup_file: PathBuf::from("rollup.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RollupSection {
    pub ignore: Vec<String>,
    pub income: Vec<String>,
    /// Category label rewrites applied before a label is split into levels.
    pub aliases: BTreeMap<String, String>,
}

impl Default for RollupSection {
    fn default() -> Self {
        Self {
            ignore: DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect(),
            income: DEFAULT_INCOME.iter().map(|s| s.to_string()).collect(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn source_folder(&self, format: SourceFormat) -> PathBuf {
        let name = self
            .sources
            .get(format.key())
            .map(String::as_str)
            .unwrap_or(format.default_folder());
        self.paths.data_dir.join(name)
    }

    pub fn policy_for(&self, format: SourceFormat) -> CategoryPolicy {
        let extra = self.hints.get(format.key()).cloned().unwrap_or_default();
        CategoryPolicy::for_format(format).with_hints(extra)
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.paths.cache_file {
            Some(p) => Ok(p.clone()),
            None => default_cache_path(),
        }
    }

    pub fn rollup_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.rollup_file)
    }

    pub fn rollup_rules(&self) -> RollupRules {
        RollupRules {
            ignore: self.rollup.ignore.clone(),
            aliases: self.rollup.aliases.clone(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let mut cfg = Config::default();
    cfg.sources = SourceFormat::ALL
        .iter()
        .map(|f| (f.key().to_string(), f.default_folder().to_string()))
        .collect();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.llm.provider, "ollama");
        assert_eq!(cfg.llm.temperature, 0.0);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(
            &p,
            r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"

[sources]
boa = "bank_of_america"

[hints]
boa = ["NETFLIX is a SUBSCRIPTION category."]

[rollup.aliases]
UTILITIES_WATER = "UTILITIES WATER"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.timeout_secs, 120);
        assert_eq!(cfg.source_folder(SourceFormat::Boa), PathBuf::from("data/bank_of_america"));
        assert_eq!(cfg.source_folder(SourceFormat::Schwab), PathBuf::from("data/schwab"));
        assert_eq!(cfg.rollup_path(), PathBuf::from("data/rollup.csv"));

        let boa = cfg.policy_for(SourceFormat::Boa).instructions();
        assert!(boa.contains("NETFLIX is a SUBSCRIPTION category."));
        assert!(!cfg.policy_for(SourceFormat::Schwab).instructions().contains("NETFLIX"));

        let rules = cfg.rollup_rules();
        assert!(rules.is_ignored("CREDIT_CARD_PAYMENT"));
        assert_eq!(rules.resolve("UTILITIES_WATER"), "UTILITIES WATER");
    }

    #[test]
    fn test_default_config_survives_toml() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[llm\nprovider = 1").unwrap();
        assert!(load_config_from(&p).is_err());
    }
}
