//! Plugins and extension hooks.
//!
//! A plugin is a directory under `plug/`. Hooks are executables in its
//! `hooks/` subdirectory, named after the lifecycle point they handle
//! (`preinit`, `init`, `postinit`, `onsave`). Hooks run with `SCRIBE_HOOK`
//! and `SCRIBE_CONFIG_DIR` set; their output never reaches the terminal.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::config::ConfigDir;
use crate::error::{CoreError, Result};
use crate::jobs::{JobOrigin, JobSender};
use crate::runtime_files::RuntimeFiles;
use crate::session::Session;

const HOOKS_SUBDIR: &str = "hooks";

/// Panic payload for faults raised by extension-origin code.
///
/// The crash boundary only uses it to choose the diagnostic text.
#[derive(Debug, Clone)]
pub struct ExtensionFault {
    pub plugin: String,
    pub message: String,
}

impl fmt::Display for ExtensionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.plugin, self.message)
    }
}

#[derive(Debug, Clone)]
struct Plugin {
    name: String,
    hooks_dir: PathBuf,
}

impl Plugin {
    fn hook(&self, hook: &str) -> Option<PathBuf> {
        let path = self.hooks_dir.join(hook);
        path.is_file().then_some(path)
    }
}

/// Loaded plugins.
#[derive(Debug, Clone, Default)]
pub struct PluginHost {
    plugins: Vec<Plugin>,
    config_root: PathBuf,
}

impl PluginHost {
    /// Loads every registered plugin directory.
    ///
    /// A plugin without a `hooks/` directory is skipped and reported; the
    /// others still load.
    pub fn load(files: &RuntimeFiles, config: &ConfigDir) -> (Self, Option<CoreError>) {
        let mut host = Self {
            plugins: Vec::new(),
            config_root: config.root().to_path_buf(),
        };
        let mut err = None;

        for (name, dir) in files.plugins() {
            let hooks_dir = dir.join(HOOKS_SUBDIR);
            if !hooks_dir.is_dir() {
                err.get_or_insert(CoreError::Plugin {
                    plugin: name.to_string(),
                    reason: format!("missing {} directory", HOOKS_SUBDIR),
                });
                continue;
            }
            debug!(plugin = %name, "loaded plugin");
            host.plugins.push(Plugin {
                name: name.to_string(),
                hooks_dir,
            });
        }
        (host, err)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.name.as_str())
    }

    /// Runs the named hook of every plugin, in plugin name order.
    ///
    /// A failing hook does not stop the remaining plugins; the first failure
    /// is returned.
    pub fn run_hook(&self, hook: &str) -> Result<()> {
        let mut first_err = None;
        for plugin in &self.plugins {
            let Some(path) = plugin.hook(hook) else {
                continue;
            };
            if let Err(e) = self.run_one(plugin, hook, &path) {
                warn!(plugin = %plugin.name, hook = %hook, error = %e, "hook failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_one(&self, plugin: &Plugin, hook: &str, path: &Path) -> Result<()> {
        let hook_err = |reason: String| CoreError::Hook {
            hook: hook.to_string(),
            plugin: plugin.name.clone(),
            reason,
        };
        let output = Command::new(path)
            .env("SCRIBE_HOOK", hook)
            .env("SCRIBE_CONFIG_DIR", &self.config_root)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| hook_err(e.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(hook_err(if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        }))
    }

    /// Starts the named hook of every plugin as a background job.
    ///
    /// Non-empty hook output is shown in the info bar when the job completes.
    pub fn spawn_hook_jobs(&self, hook: &str, args: Vec<String>, jobs: &JobSender) {
        for plugin in &self.plugins {
            let Some(path) = plugin.hook(hook) else {
                continue;
            };
            let name = plugin.name.clone();
            let result = jobs.spawn(
                JobOrigin::Plugin(name.clone()),
                path,
                args.clone(),
                Box::new(move |session: &mut Session, output: String, _args: Vec<String>| {
                    let output = output.trim();
                    if !output.is_empty() {
                        session.infobar.message(format!("{}: {}", name, output));
                    }
                }),
            );
            if let Err(e) = result {
                warn!(plugin = %plugin.name, hook = %hook, error = %e, "failed to start hook job");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn write_hook(config: &ConfigDir, plugin: &str, hook: &str, script: &str) {
        let dir = config.plugins_dir().join(plugin).join(HOOKS_SUBDIR);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(hook);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn load(config: &ConfigDir) -> PluginHost {
        let (files, _) = RuntimeFiles::discover(config);
        let (host, err) = PluginHost::load(&files, config);
        assert!(err.is_none());
        host
    }

    #[test]
    fn test_missing_hook_is_ok() {
        let dir = tempdir().unwrap();
        let config = ConfigDir::new(dir.path());
        write_hook(&config, "alpha", "init", "#!/bin/sh\nexit 0\n");

        let host = load(&config);

        assert!(host.run_hook("preinit").is_ok());
        assert!(host.run_hook("init").is_ok());
    }

    #[test]
    fn test_failing_hook_does_not_stop_others() {
        let dir = tempdir().unwrap();
        let config = ConfigDir::new(dir.path());
        let marker = dir.path().join("ran");
        write_hook(&config, "alpha", "init", "#!/bin/sh\necho broken >&2\nexit 3\n");
        write_hook(
            &config,
            "beta",
            "init",
            &format!("#!/bin/sh\ntouch '{}'\n", marker.display()),
        );

        let host = load(&config);
        let result = host.run_hook("init");

        match result {
            Err(CoreError::Hook { plugin, reason, .. }) => {
                assert_eq!(plugin, "alpha");
                assert_eq!(reason, "broken");
            }
            other => panic!("expected hook error, got {:?}", other),
        }
        assert!(marker.exists());
    }

    #[test]
    fn test_plugin_without_hooks_dir_is_reported() {
        let dir = tempdir().unwrap();
        let config = ConfigDir::new(dir.path());
        fs::create_dir_all(config.plugins_dir().join("empty")).unwrap();
        write_hook(&config, "good", "init", "#!/bin/sh\n");

        let (files, _) = RuntimeFiles::discover(&config);
        let (host, err) = PluginHost::load(&files, &config);

        assert!(matches!(err, Some(CoreError::Plugin { plugin, .. }) if plugin == "empty"));
        assert_eq!(host.names().collect::<Vec<_>>(), vec!["good"]);
    }
}
