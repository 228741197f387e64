use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_finance::MonthFilter;
use tally_ingest::SourceFormat;

mod auth;
mod config;
mod llm;
mod pipeline;
mod state;

use crate::llm::LlmBackend;

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Categorize bank statements and roll them up into a budget flow")]
struct Cli {
    /// Folder holding one sub-folder per statement source (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and categorize statements, writing <name>_categorized.csv next to each
    Categorize {
        /// boa, schwab, barclays or paypal (default: every source folder)
        #[arg(long)]
        source: Option<String>,

        /// Documents to process instead of the source folder
        files: Vec<PathBuf>,
    },

    /// Merge categorized exports into the rollup CSV and print SankeyMATIC lines
    Rollup {
        /// Only exports whose file name carries this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },

    /// Classify one description with a source's category policy
    Classify {
        description: String,

        #[arg(long)]
        source: String,
    },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API credentials in ~/.tally/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteOpenaiApiKey,
    PasteAnthropicToken,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn parse_source(key: &str) -> Result<SourceFormat> {
    match SourceFormat::from_key(key) {
        Some(f) => Ok(f),
        None => bail!("unknown source '{key}' (expected boa, schwab, barclays or paypal)"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = config::load_config()?;
    if let Some(dir) = cli.data_dir {
        cfg.paths.data_dir = dir;
    }

    match cli.command {
        Command::Categorize { source, files } => {
            let formats = match source.as_deref() {
                Some(key) => vec![parse_source(key)?],
                None if !files.is_empty() => bail!("--source is required when files are given"),
                None => SourceFormat::ALL.to_vec(),
            };

            let backend = LlmBackend::from_config(&cfg.llm)?;
            let mut cache = pipeline::open_cache(&cfg)?;
            for format in formats {
                pipeline::categorize_source(&cfg, format, &files, &backend, &mut cache)?;
            }
        }

        Command::Rollup { month } => {
            let filter = month.as_deref().map(MonthFilter::parse).transpose()?;
            let sankey = pipeline::run_rollup(&cfg, filter.as_ref())?;
            println!("{sankey}");
        }

        Command::Classify { description, source } => {
            let format = parse_source(&source)?;
            let backend = LlmBackend::from_config(&cfg.llm)?;
            let mut cache = pipeline::open_cache(&cfg)?;
            let label = pipeline::classify_one(&cfg, format, &description, &backend, &mut cache)?;
            println!("{label}");
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
            AuthCommand::PasteAnthropicToken => auth::anthropic_paste_token()?,
        },
    }

    Ok(())
}
