//! Bootstrap sequencer: ordered startup from parsed arguments to the
//! running event loop.
//!
//! Failures are classified per step. Configuration, plugins, bindings,
//! colorscheme and hooks only warn. Screen initialization is fatal. Once the
//! screen is up, everything runs inside the crash boundary.

use tracing::{debug, info, warn};

use scribe_core::buffer::clean_orphan_backups;
use scribe_core::clipboard::{Clipboard, ClipboardMethod};
use scribe_core::colorscheme::Colorscheme;
use scribe_core::commands::CommandRegistry;
use scribe_core::plugin::PluginHost;
use scribe_core::runtime_files::RuntimeFiles;
use scribe_core::tabs::TabList;
use scribe_core::{ConfigDir, CoreError, DeferredStdout, Session, Settings};
use scribe_runtime::{MutationLock, Runtime, RuntimeConfig, RuntimeError};

use crate::cli::Cli;
use crate::crash;
use crate::input;
use crate::platform::Platform;

/// Exit status when the terminal screen cannot be initialized.
pub const SCREEN_INIT_EXIT_CODE: i32 = 1;

/// Runs the editor and returns the process exit status.
///
/// `config_err` is the failure from resolving `--config-dir`, reported
/// through the warning surface like every other configuration problem.
pub fn run<P: Platform>(
    cli: &Cli,
    config: ConfigDir,
    config_err: Option<CoreError>,
    platform: &mut P,
    stdout: DeferredStdout,
    runtime_config: RuntimeConfig,
) -> i32 {
    if let Some(e) = config_err {
        platform.warn(&e.to_string());
    }
    if let Err(e) = config.ensure() {
        platform.warn(&e.to_string());
    }
    if cli.clean {
        return clean(&config);
    }

    let (runtime_files, files_err) = RuntimeFiles::discover(&config);
    if let Some(e) = files_err {
        platform.warn(&e.to_string());
    }
    let settings = load_settings(&config, cli, platform);

    if let Err(e) = platform.init_screen() {
        eprintln!("Failed to initialize the terminal screen: {}", e);
        return SCREEN_INIT_EXIT_CODE;
    }
    debug!("screen initialized");

    // Reported only once the loop is armed.
    let (clipboard, clipboard_err) = match ClipboardMethod::from_setting(settings.text("clipboard"))
    {
        Ok(method) => Clipboard::initialize(method),
        Err(e) => (Clipboard::default(), Some(e)),
    };

    let runtime = match Runtime::new(runtime_config) {
        Ok(runtime) => runtime,
        Err(e) => {
            platform.restore_screen();
            eprintln!("{}", crash::Fault::Error(e).report());
            return crash::CRASH_EXIT_CODE;
        }
    };

    let mut session = Session::new(
        config,
        settings,
        runtime.senders().session_handles(),
        stdout,
    );
    session.runtime_files = runtime_files;
    session.clipboard = clipboard;
    let (width, height) = platform.screen_size();
    session.set_size(width, height);

    let lock = MutationLock::new(session);
    let boundary = lock.clone();
    crash::guard(&boundary, platform, move |platform| {
        start(lock, runtime, &cli.files, clipboard_err, platform)
    })
}

/// `--clean`: drops invalid settings and orphaned backups.
fn clean(config: &ConfigDir) -> i32 {
    let settings_file = config.settings_file();
    match Settings::clean_file(&settings_file) {
        Ok(removed) => {
            for option in removed {
                println!("Removed '{}' from {}", option, settings_file.display());
            }
        }
        Err(e) => eprintln!("{}", e),
    }
    match clean_orphan_backups(&config.backups_dir()) {
        Ok(removed) if !removed.is_empty() => {
            println!("Removed {} orphaned backup(s)", removed.len());
        }
        Ok(_) => {}
        Err(e) => eprintln!("{}", e),
    }
    println!("Done cleaning {}", config.root().display());
    0
}

/// Settings file first, then the volatile `--<option>` overrides.
fn load_settings<P: Platform>(config: &ConfigDir, cli: &Cli, platform: &mut P) -> Settings {
    let mut settings = Settings::defaults();
    let applied = Settings::read_file(&config.settings_file())
        .and_then(|parsed| settings.apply_parsed(&parsed));
    if let Err(e) = applied {
        platform.warn(&format!("Error reading settings: {}", e));
    }

    for (option, value) in &cli.options {
        if let Err(e) = settings.set_volatile(option, value) {
            platform.warn(&e.to_string());
        }
    }
    settings
}

/// Everything after the screen is up; runs inside the crash boundary.
fn start<P: Platform>(
    session: MutationLock<Session>,
    runtime: Runtime,
    files: &[String],
    clipboard_err: Option<CoreError>,
    platform: &mut P,
) -> Result<i32, RuntimeError> {
    {
        let mut s = session.lock();

        let (plugins, plugin_err) = PluginHost::load(&s.runtime_files, &s.config);
        s.plugins = plugins;
        if let Some(e) = plugin_err {
            platform.warn(&e.to_string());
        }
        let bindings_file = s.config.bindings_file();
        if let Err(e) = s.bindings.load_file(&bindings_file) {
            platform.warn(&e.to_string());
        }
        s.commands = CommandRegistry::defaults();
        let scheme = s.settings.text("colorscheme").to_string();
        match Colorscheme::load(&scheme, &s.runtime_files) {
            Ok(colorscheme) => s.colorscheme = colorscheme,
            Err(e) => platform.warn(&e.to_string()),
        }

        if let Err(e) = s.plugins.run_hook("preinit") {
            platform.warn(&e.to_string());
        }

        let resolved = input::resolve(files, platform.stdin_is_tty());
        let ids = input::open_documents(&resolved, &mut s.buffers, platform);
        if ids.is_empty() {
            drop(s);
            info!("no documents to open");
            platform.restore_screen();
            return Ok(0);
        }

        let multiopen = s.settings.text("multiopen").to_string();
        s.tabs = TabList::from_buffers(&ids, &multiopen);
        s.adjust_scroll();

        for hook in ["init", "postinit"] {
            if let Err(e) = s.plugins.run_hook(hook) {
                platform.warn(&e.to_string());
            }
        }

        if let Some(e) = clipboard_err {
            warn!(error = %e, "clipboard fell back to the internal register");
            s.infobar
                .error(format!("{} or change 'clipboard' option", e));
        }
    }

    let frontend = platform.frontend().map_err(RuntimeError::Render)?;
    let events = platform.events();
    let screen = platform.screen_lock();
    let shutdown = runtime.run(session, frontend, events, screen)?;
    info!(reason = %shutdown.reason, "editor exited");
    Ok(shutdown.exit_code)
}
