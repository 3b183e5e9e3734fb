//! CLI interface for tagstat
//!
//! This module defines the command-line interface using clap and turns the
//! parsed arguments into a validated [`RunConfig`].
//!
//! # Example
//!
//! ```bash
//! # Daily counts for three tags, 6 to 2 months ago (the defaults)
//! tagstat --tags python javascript java
//!
//! # Weekly buckets over the last year, written elsewhere
//! tagstat --tags rust go --grain week --months-from 12 --months-to 0 --out out/weekly.csv
//! ```

use crate::error::{Result, TagstatError};
use crate::types::{Granularity, Tag};
use crate::window::QueryWindow;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tagstat_client::FetchOptions;
use tagstat_client::client::{DEFAULT_API_URL, DEFAULT_SITE};
use tracing::warn;

/// Default output path
pub const DEFAULT_OUTPUT: &str = "data/questions_by_date.csv";

/// Collect Stack Exchange question counts by date and tag
#[derive(Parser, Debug, Clone)]
#[command(name = "tagstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Tags to collect, e.g. `--tags python javascript java`
    #[arg(long, short = 't', required = true, num_args = 1..)]
    pub tags: Vec<String>,

    /// Output CSV path
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT, env = "TAGSTAT_OUT")]
    pub out: PathBuf,

    /// Maximum number of pages requested per tag
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// Questions per page (the API allows at most 100)
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: u32,

    /// How many months back the window starts
    #[arg(long, default_value_t = 6)]
    pub months_from: u32,

    /// How many months back the window ends (that day included)
    #[arg(long, default_value_t = 2)]
    pub months_to: u32,

    /// Bucket granularity: day or week (weeks start on Monday)
    #[arg(long, short = 'g', default_value = "day")]
    pub grain: Granularity,

    /// Stack Exchange site to query
    #[arg(long, default_value = DEFAULT_SITE, env = "TAGSTAT_SITE")]
    pub site: String,

    /// Stack Exchange application key (raises the daily request quota)
    #[arg(long, env = "STACKEXCHANGE_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Questions endpoint URL
    #[arg(long, default_value = DEFAULT_API_URL, env = "TAGSTAT_API_URL")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Fail a tag when a question without a usable creation_date is received
    /// instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Show debug output
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Everything a run needs, validated
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tags: Vec<Tag>,
    pub window: QueryWindow,
    pub granularity: Granularity,
    pub fetch: FetchOptions,
    pub api_url: String,
    pub timeout: Duration,
    pub output: PathBuf,
    pub strict: bool,
    pub json: bool,
}

impl Cli {
    /// Validate the arguments against the current time
    pub fn into_config(self, now: DateTime<Utc>) -> Result<RunConfig> {
        let tags = parse_tags(&self.tags)?;
        let window = QueryWindow::from_month_offsets(now, self.months_from, self.months_to)?;

        if self.site.trim().is_empty() {
            return Err(TagstatError::Config("--site must not be empty".to_string()));
        }

        Ok(RunConfig {
            tags,
            window,
            granularity: self.grain,
            fetch: FetchOptions {
                site: self.site,
                page_size: self.page_size,
                max_pages: self.max_pages,
                key: self.key.filter(|k| !k.is_empty()),
            },
            api_url: self.api_url,
            timeout: Duration::from_secs(self.timeout),
            output: self.out,
            strict: self.strict,
            json: self.json,
        })
    }

    /// Log filter directive for the requested verbosity
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "tagstat=debug,tagstat_client=debug,tagstat_core=debug"
        } else {
            "tagstat=info,tagstat_client=info,tagstat_core=info"
        }
    }
}

/// Validate tag names, dropping repeats so no tag is counted twice
pub fn parse_tags(raw: &[String]) -> Result<Vec<Tag>> {
    let mut tags: Vec<Tag> = Vec::with_capacity(raw.len());
    for name in raw {
        let tag = Tag::new(name.as_str())?;
        if tags.contains(&tag) {
            warn!("Tag {} given more than once, counting it once", tag);
            continue;
        }
        tags.push(tag);
    }

    if tags.is_empty() {
        return Err(TagstatError::InvalidArgument(
            "at least one tag is required".to_string(),
        ));
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["tagstat", "--tags", "python", "java"]);
        assert_eq!(cli.tags, vec!["python", "java"]);
        assert_eq!(cli.out, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cli.max_pages, 50);
        assert_eq!(cli.page_size, 100);
        assert_eq!(cli.months_from, 6);
        assert_eq!(cli.months_to, 2);
        assert_eq!(cli.grain, Granularity::Day);
        assert_eq!(cli.site, "stackoverflow");
        assert_eq!(cli.timeout, 30);
        assert!(!cli.strict);
        assert!(!cli.json);
    }

    #[test]
    fn test_tags_are_required() {
        assert!(Cli::try_parse_from(["tagstat"]).is_err());
        assert!(Cli::try_parse_from(["tagstat", "--tags"]).is_err());
    }

    #[test]
    fn test_grain_and_ranges() {
        let cli = Cli::parse_from(["tagstat", "-t", "go", "--grain", "week"]);
        assert_eq!(cli.grain, Granularity::Week);

        assert!(Cli::try_parse_from(["tagstat", "-t", "go", "--grain", "month"]).is_err());
        assert!(Cli::try_parse_from(["tagstat", "-t", "go", "--page-size", "101"]).is_err());
        assert!(Cli::try_parse_from(["tagstat", "-t", "go", "--max-pages", "0"]).is_err());
        assert!(Cli::try_parse_from(["tagstat", "-t", "go", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_into_config() {
        let cli = Cli::parse_from([
            "tagstat",
            "--tags",
            "rust",
            "go",
            "rust",
            "--max-pages",
            "3",
            "--page-size",
            "20",
            "--out",
            "out/counts.csv",
        ]);
        let config = cli.into_config(now()).unwrap();

        assert_eq!(
            config.tags.iter().map(Tag::as_str).collect::<Vec<_>>(),
            vec!["rust", "go"]
        );
        assert_eq!(config.window.first_day().to_string(), "2024-01-15");
        assert_eq!(config.window.last_day().to_string(), "2024-05-15");
        assert_eq!(config.fetch.max_pages, 3);
        assert_eq!(config.fetch.page_size, 20);
        assert_eq!(config.output, PathBuf::from("out/counts.csv"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_into_config_rejects_inverted_window() {
        let cli = Cli::parse_from([
            "tagstat",
            "--tags",
            "rust",
            "--months-from",
            "2",
            "--months-to",
            "6",
        ]);
        assert!(matches!(
            cli.into_config(now()),
            Err(TagstatError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_parse_tags_rejects_invalid_names() {
        assert!(parse_tags(&["python".to_string(), "a;b".to_string()]).is_err());
        assert!(parse_tags(&[]).is_err());
    }

    #[test]
    fn test_log_directive() {
        let cli = Cli::parse_from(["tagstat", "-t", "go", "-q"]);
        assert_eq!(cli.log_directive(), "warn");
        let cli = Cli::parse_from(["tagstat", "-t", "go", "-v"]);
        assert!(cli.log_directive().contains("debug"));
    }
}
