//! Command-line flags and environment configuration.

use crate::scrapers::types::{DEFAULT_INDEX_URL, PAGE_PLACEHOLDER};
use crate::scrapers::{BrowserOptions, CollectorOptions};
use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";
const DEFAULT_SCROLL_DELAY_MS: u64 = 700;

#[derive(Debug, Parser)]
#[command(name = "fotocasa-collector")]
#[command(about = "Collect fotocasa rental listings and track which ones are still published")]
#[command(version)]
pub struct Cli {
    /// Last index page to visit
    #[arg(long, default_value_t = 50)]
    pub max_pages: u32,

    /// Stored active listings to re-check after collecting (0 disables)
    #[arg(long, default_value_t = 50)]
    pub recheck_limit: u32,

    /// Keep results in memory instead of writing to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Write the listings extracted in this run to a JSON file
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default tracing filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Full run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Required unless running dry
    pub database_url: Option<String>,
    pub collector: CollectorOptions,
    pub browser: BrowserOptions,
    pub recheck_limit: i64,
    pub export: Option<PathBuf>,
}

impl Config {
    /// Read the environment (after loading `.env` if present) and layer the
    /// command-line flags on top.
    pub fn from_env(cli: &Cli) -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(cli, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = if cli.dry_run {
            None
        } else {
            Some(lookup("DATABASE_URL").ok_or_else(|| anyhow!("Missing DATABASE_URL in the environment"))?)
        };

        let index_url = lookup("LISTING_INDEX_URL").unwrap_or_else(|| DEFAULT_INDEX_URL.to_string());
        if !index_url.contains(PAGE_PLACEHOLDER) {
            bail!("LISTING_INDEX_URL must contain a {{page}} placeholder");
        }

        let scroll_delay_ms = match lookup("SCROLL_DELAY_MS") {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("Invalid SCROLL_DELAY_MS: {value}"))?,
            None => DEFAULT_SCROLL_DELAY_MS,
        };

        let collector = CollectorOptions {
            index_url,
            max_pages: cli.max_pages,
            max_scroll_delay: Duration::from_millis(scroll_delay_ms),
            debug_dir: lookup("DEBUG_DIR").map(PathBuf::from),
            ..CollectorOptions::default()
        };

        let browser = BrowserOptions {
            headless: !cli.headed,
            user_agent: lookup("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        Ok(Self {
            database_url,
            collector,
            browser,
            recheck_limit: i64::from(cli.recheck_limit),
            export: cli.export.clone(),
        })
    }
}
