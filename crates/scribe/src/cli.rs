//! Command-line interface definition using clap.
//!
//! Besides the fixed flags, every editor option gets a `--<option> <value>`
//! flag generated from the settings defaults table. Those values override
//! the settings file for the current run only.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::OnceLock;

use clap::{Arg, CommandFactory, FromArgMatches, Parser, Subcommand};

use scribe_core::config::CONFIG_HOME_ENV;
use scribe_core::settings::default_settings;

const COMMIT: &str = env!("SCRIBE_COMMIT");
const COMPILE_DATE: &str = env!("SCRIBE_COMPILE_DATE");

/// `--version` text, e.g. `0.1.0 (3f2a9c1, March 02, 2026)`.
fn version_string() -> &'static str {
    static LONG: OnceLock<String> = OnceLock::new();
    LONG.get_or_init(|| format!("{} ({}, {})", env!("CARGO_PKG_VERSION"), COMMIT, COMPILE_DATE))
}

/// Scribe - a terminal text editor
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version = version_string(), about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Clean the configuration directory and exit
    #[arg(long)]
    pub clean: bool,

    /// Use DIR as the configuration directory
    #[arg(long, value_name = "DIR", env = CONFIG_HOME_ENV)]
    pub config_dir: Option<String>,

    /// Write a debug log to log.txt in the configuration directory
    #[arg(long)]
    pub debug: bool,

    /// Files to open; a trailing +LINE or +LINE:COL positions the cursor
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Option overrides from the generated `--<option>` flags.
    #[arg(skip)]
    pub options: BTreeMap<String, String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show version and build information
    Version,

    /// List every option with its default value
    Options,
}

impl Cli {
    /// The clap command including one flag per editor option.
    pub fn full_command() -> clap::Command {
        default_settings()
            .into_iter()
            .fold(Cli::command(), |cmd, (name, default)| {
                cmd.arg(
                    Arg::new(name)
                        .long(name)
                        .value_name("VALUE")
                        .num_args(1)
                        .help(format!("Set the '{}' option (default: {})", name, default)),
                )
            })
    }

    /// Parses the process arguments, exiting on error or `--help`.
    pub fn parse_args() -> Self {
        match Self::try_parse_args_from(std::env::args_os()) {
            Ok(cli) => cli,
            Err(e) => e.exit(),
        }
    }

    pub fn try_parse_args_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::full_command().try_get_matches_from(args)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        for name in default_settings().into_keys() {
            if let Some(value) = matches.get_one::<String>(name) {
                cli.options.insert(name.to_string(), value.clone());
            }
        }
        Ok(cli)
    }
}

/// Text printed by the `version` subcommand.
pub fn version_info() -> String {
    format!(
        "Version: {}\nCommit hash: {}\nCompiled on {}\n",
        env!("CARGO_PKG_VERSION"),
        COMMIT,
        COMPILE_DATE,
    )
}

/// Text printed by the `options` subcommand.
pub fn options_listing() -> String {
    let mut out = String::from("Options:\n");
    for (name, default) in default_settings() {
        out.push_str(&format!("--{} <value>\n    \tDefault value: '{}'\n", name, default));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_files_and_positions() {
        let cli = Cli::try_parse_args_from(["scribe", "+10:5", "a.txt", "b.txt"]).unwrap();
        assert_eq!(cli.files, vec!["+10:5", "a.txt", "b.txt"]);
        assert!(cli.command.is_none());
        assert!(!cli.clean);
    }

    #[test]
    fn test_cli_option_flags() {
        let cli =
            Cli::try_parse_args_from(["scribe", "--tabsize", "8", "--ruler", "off", "f.txt"]).unwrap();
        assert_eq!(cli.options.get("tabsize").map(String::as_str), Some("8"));
        assert_eq!(cli.options.get("ruler").map(String::as_str), Some("off"));
        assert_eq!(cli.files, vec!["f.txt"]);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_args_from(["scribe", "--clean", "--config-dir", "/tmp/x"]).unwrap();
        assert!(cli.clean);
        assert_eq!(cli.config_dir.as_deref(), Some("/tmp/x"));
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::try_parse_args_from(["scribe", "options"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Options));

        let cli = Cli::try_parse_args_from(["scribe", "version"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Version));
    }

    #[test]
    fn test_unknown_option_flag_rejected() {
        assert!(Cli::try_parse_args_from(["scribe", "--nonsense", "1"]).is_err());
    }

    #[test]
    fn test_options_listing_has_every_option() {
        let listing = options_listing();
        for name in default_settings().keys() {
            assert!(listing.contains(&format!("--{} <value>", name)));
        }
        assert!(listing.contains("Default value: 'tab'"));
    }

    #[test]
    fn test_command_is_consistent() {
        Cli::full_command().debug_assert();
    }

    #[test]
    fn test_version_texts_agree() {
        let info = version_info();
        assert!(info.starts_with(&format!("Version: {}\n", env!("CARGO_PKG_VERSION"))));
        assert!(info.contains(&format!("Commit hash: {}\n", COMMIT)));
        assert!(version_string().contains(COMPILE_DATE));
    }
}
