//! Scribe entry point.

use std::io;

use tracing::info;

use scribe::cli::{options_listing, version_info, Cli, Commands};
use scribe::screen::TermPlatform;
use scribe::{bootstrap, logging};
use scribe_core::{ConfigDir, DeferredStdout};
use scribe_runtime::RuntimeConfig;

fn main() {
    let cli = Cli::parse_args();

    match cli.command {
        Some(Commands::Version) => {
            print!("{}", version_info());
            return;
        }
        Some(Commands::Options) => {
            print!("{}", options_listing());
            return;
        }
        None => {}
    }

    let (config, config_err) = ConfigDir::resolve(cli.config_dir.as_deref());
    if let Some(path) = logging::init(cli.debug, &config) {
        info!(log = %path.display(), version = env!("CARGO_PKG_VERSION"), "starting scribe");
    }

    let stdout = DeferredStdout::new();
    let mut platform = TermPlatform::new();
    let status = bootstrap::run(
        &cli,
        config,
        config_err,
        &mut platform,
        stdout.clone(),
        RuntimeConfig::default(),
    );

    // Piped-output buffers land here once the terminal is released.
    if let Err(e) = stdout.flush_to(io::stdout().lock()) {
        eprintln!("Error writing to stdout: {}", e);
    }
    std::process::exit(status);
}
