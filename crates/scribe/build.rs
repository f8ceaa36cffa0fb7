//! Embeds the commit and compile date shown by `scribe version`.

use chrono::{DateTime, Utc};
use std::process::Command;

fn commit_hash() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let hash = String::from_utf8(out.stdout).ok()?;
    Some(hash.trim().to_string())
}

/// Honors `SOURCE_DATE_EPOCH` so packaged builds are reproducible.
fn compile_date() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

fn main() {
    let hash = commit_hash().unwrap_or_else(|| "unknown".to_string());
    let date = compile_date().format("%B %d, %Y");

    println!("cargo:rustc-env=SCRIBE_COMMIT={hash}");
    println!("cargo:rustc-env=SCRIBE_COMPILE_DATE={date}");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
