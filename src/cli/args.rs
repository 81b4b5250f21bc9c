//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use url::Url;

/// Precache - offline-first cache proxy tooling
///
/// Keeps asset version tags consistent across pages and the cache proxy,
/// generates the build-output proxy, and exercises the proxy against a
/// live origin.
#[derive(Parser, Debug)]
#[command(name = "precache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Site root (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub root: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PRECACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format (defaults to general.log_format)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retag every versioned asset reference, the proxy and the status document
    Bump(BumpArgs),

    /// Check version consistency and site hygiene before release
    Validate(ValidateArgs),

    /// Generate the offline proxy for the build output
    Generate(GenerateArgs),

    /// Install the proxy against a live origin and probe its offline fallbacks
    Warm(WarmArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the bump command
#[derive(Parser, Debug)]
pub struct BumpArgs {
    /// New version tag (YYYYMMDD.N, e.g. 20251218.4)
    pub tag: String,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Build output directory (default: dist.out_dir)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Cache prefix for the generated proxy (default: dist.cache_prefix)
    #[arg(short, long)]
    pub prefix: Option<String>,
}

/// Arguments for the warm command
#[derive(Parser, Debug)]
pub struct WarmArgs {
    /// Origin the site is served from, e.g. http://localhost:4173/
    #[arg(long)]
    pub origin: Url,

    /// Use the generated build-output proxy instead of the hand-authored one
    #[arg(long)]
    pub dist: bool,

    /// Per-request network timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse a configured format name, falling back to text
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// JSON report
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_bump() {
        let cli = Cli::parse_from(["precache", "bump", "20260113.2"]);
        match cli.command {
            Commands::Bump(args) => assert_eq!(args.tag, "20260113.2"),
            _ => panic!("expected Bump command"),
        }
    }

    #[test]
    fn cli_bump_requires_tag() {
        let err = Cli::try_parse_from(["precache", "bump"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "precache", "validate", "-vv", "-C", "site", "--log-format", "json",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        match cli.command {
            Commands::Validate(args) => assert_eq!(args.format, OutputFormat::Text),
            _ => panic!("expected Validate command"),
        }
    }

    #[test]
    fn cli_parses_generate() {
        let cli = Cli::parse_from(["precache", "generate", "--out-dir", "build", "--prefix", "shop-dist"]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.out_dir, Some(PathBuf::from("build")));
                assert_eq!(args.prefix.as_deref(), Some("shop-dist"));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn cli_parses_warm() {
        let cli = Cli::parse_from(["precache", "warm", "--origin", "http://localhost:4173/", "--dist"]);
        match cli.command {
            Commands::Warm(args) => {
                assert_eq!(args.origin.as_str(), "http://localhost:4173/");
                assert!(args.dist);
                assert_eq!(args.timeout, 30);
            }
            _ => panic!("expected Warm command"),
        }
    }

    #[test]
    fn cli_rejects_bad_origin() {
        assert!(Cli::try_parse_from(["precache", "warm", "--origin", "not a url"]).is_err());
    }

    #[test]
    fn cli_parses_config_path() {
        let cli = Cli::parse_from(["precache", "config", "path"]);
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.action, Some(ConfigAction::Path))),
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn log_format_from_config() {
        assert_eq!(LogFormat::from_config("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_config("text"), LogFormat::Text);
        assert_eq!(LogFormat::from_config("other"), LogFormat::Text);
    }
}
