//! Command-line interface definitions for feedsnap.
//!
//! Paths can be given as flags, environment variables or in the YAML config
//! file; flags win over the file.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for feedsnap.
///
/// # Examples
///
/// ```sh
/// # Fetch every registered feed and rebuild the cache
/// feedsnap refresh
///
/// # Browse page 2 of IoT articles mentioning "gateway"
/// feedsnap list --domain IoT --query gateway --page 2
///
/// # Register a new feed
/// feedsnap sources add "Grid News" https://grid.example/rss --domains Energy --themes "Grid,Storage" --ranking 6 --author alice
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "FEEDSNAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Feed registry CSV (overrides the config file)
    #[arg(long, env = "FEEDSNAP_REGISTRY", global = true)]
    pub registry: Option<PathBuf>,

    /// Article snapshot CSV (overrides the config file)
    #[arg(long, env = "FEEDSNAP_SNAPSHOT", global = true)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch all registered feeds and replace the article snapshot
    Refresh,

    /// Show a page of cached articles, optionally filtered and searched
    List(ListArgs),

    /// List every domain used by the registry
    Domains,

    /// List every theme used by the registry
    Themes,

    /// Inspect or edit the feed registry
    #[command(subcommand)]
    Sources(SourcesCommand),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Keep articles tagged with any of these domains
    #[arg(short, long = "domain")]
    pub domains: Vec<String>,

    /// Keep articles tagged with any of these themes
    #[arg(short, long = "theme")]
    pub themes: Vec<String>,

    /// Case-insensitive text to look for in title, summary and full text
    #[arg(short, long)]
    pub query: Option<String>,

    /// 1-based page number
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Articles per page (defaults to the config value)
    #[arg(long)]
    pub per_page: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = Format::Markdown)]
    pub format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum SourcesCommand {
    /// Print the registry with row positions
    List,

    /// Append a feed to the registry
    Add(SourceArgs),

    /// Replace the feed at a 0-based position
    Update {
        index: usize,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Remove the feed at a 0-based position
    Remove { index: usize },
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    pub name: String,
    pub url: String,

    /// Comma-separated domains
    #[arg(long)]
    pub domains: String,

    /// Comma-separated themes
    #[arg(long)]
    pub themes: String,

    #[arg(long, default_value_t = 0)]
    pub ranking: i64,

    #[arg(long, default_value = "")]
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_with_paths() {
        let cli = Cli::parse_from([
            "feedsnap",
            "--registry",
            "/tmp/feeds.csv",
            "refresh",
            "--snapshot",
            "/tmp/articles.csv",
        ]);
        assert!(matches!(cli.command, Command::Refresh));
        assert_eq!(cli.registry, Some(PathBuf::from("/tmp/feeds.csv")));
        assert_eq!(cli.snapshot, Some(PathBuf::from("/tmp/articles.csv")));
    }

    #[test]
    fn test_list_repeated_facets() {
        let cli = Cli::parse_from([
            "feedsnap", "list", "-d", "IoT", "--domain", "Energy", "-t", "Grid", "-q", "meters", "-p", "3",
            "--format", "json",
        ]);
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.domains, vec!["IoT", "Energy"]);
        assert_eq!(args.themes, vec!["Grid"]);
        assert_eq!(args.query.as_deref(), Some("meters"));
        assert_eq!(args.page, 3);
        assert_eq!(args.per_page, None);
        assert_eq!(args.format, Format::Json);
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::parse_from(["feedsnap", "list"]);
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert!(args.domains.is_empty());
        assert_eq!(args.page, 1);
        assert_eq!(args.format, Format::Markdown);
    }

    #[test]
    fn test_sources_update() {
        let cli = Cli::parse_from([
            "feedsnap",
            "sources",
            "update",
            "2",
            "Grid News",
            "https://grid.example/rss",
            "--domains",
            "Energy",
            "--themes",
            "Grid, Storage",
            "--ranking",
            "6",
        ]);
        let Command::Sources(SourcesCommand::Update { index, source }) = cli.command else {
            panic!("expected sources update");
        };
        assert_eq!(index, 2);
        assert_eq!(source.name, "Grid News");
        assert_eq!(source.themes, "Grid, Storage");
        assert_eq!(source.ranking, 6);
        assert_eq!(source.author, "");
    }
}
