use std::fs;

use tempfile::TempDir;

use scribe_core::buffer::{clean_orphan_backups, BufferKind, Loc};
use scribe_core::{BufferRegistry, ConfigDir, DeferredStdout, Settings, Value};

fn config(dir: &TempDir) -> ConfigDir {
    let config = ConfigDir::new(dir.path().join("config"));
    config.ensure().unwrap();
    config
}

#[test]
fn test_crash_backups_survive_restart_until_finalized() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let file = dir.path().join("notes.txt");
    fs::write(&file, "first\n").unwrap();

    // First run: edit without saving, then crash.
    let mut registry = BufferRegistry::new(config.backups_dir(), DeferredStdout::new());
    let id = registry
        .open(&file, BufferKind::Default, Some(Loc::new(0, 5)))
        .unwrap();
    registry.get_mut(id).unwrap().insert_text(" draft");
    let report = registry.backup_all();
    assert_eq!(report.written.len(), 1);
    assert_eq!(fs::read_to_string(&report.written[0]).unwrap(), "first draft\n");

    // Cleaning keeps backups whose file still exists.
    assert!(clean_orphan_backups(&config.backups_dir()).unwrap().is_empty());
    assert!(report.written[0].exists());

    // Second run: the clean exit finalizes and drops the backup.
    let mut registry = BufferRegistry::new(config.backups_dir(), DeferredStdout::new());
    registry.open(&file, BufferKind::Default, None).unwrap();
    assert_eq!(registry.finalize_all(), 1);
    assert!(!report.written[0].exists());
}

#[test]
fn test_orphaned_backup_is_cleaned() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let file = dir.path().join("gone.txt");

    let mut registry = BufferRegistry::new(config.backups_dir(), DeferredStdout::new());
    registry.open(&file, BufferKind::Default, None).unwrap();
    registry.from_text("scratch", BufferKind::Default, None);
    assert_eq!(registry.backup_all().written.len(), 2);

    let removed = clean_orphan_backups(&config.backups_dir()).unwrap();

    assert_eq!(removed.len(), 2);
    assert_eq!(fs::read_dir(config.backups_dir()).unwrap().count(), 0);
}

#[test]
fn test_settings_persist_across_runs_except_volatile() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);

    let mut settings = Settings::defaults();
    settings.set_from_str("tabsize", "8").unwrap();
    settings.set_volatile("ruler", "off").unwrap();
    settings.write_file(&config.settings_file()).unwrap();

    let mut next = Settings::defaults();
    let parsed = Settings::read_file(&config.settings_file()).unwrap();
    next.apply_parsed(&parsed).unwrap();

    assert_eq!(next.get("tabsize"), Some(&Value::Number(8.0)));
    assert!(next.bool("ruler"));
}

#[test]
fn test_piped_output_buffers_emit_on_finalize() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let stdout = DeferredStdout::new();

    let mut registry = BufferRegistry::new(config.backups_dir(), stdout.clone());
    let piped = registry.from_text("piped", BufferKind::Stdout, None);
    registry.get_mut(piped).unwrap().insert_text("!");
    registry.from_text("plain", BufferKind::Default, None);

    assert_eq!(registry.finalize_unmodified(), 1);
    assert!(stdout.is_empty());

    registry.finalize_all();
    assert_eq!(stdout.take(), b"!piped".to_vec());
}
