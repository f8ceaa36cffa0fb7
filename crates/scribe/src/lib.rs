//! Scribe - terminal text editor binary crate.
//!
//! - `cli` - argument parsing, including one flag per editor option
//! - `input` - turns positional arguments into documents
//! - `bootstrap` - ordered startup up to the running event loop
//! - `crash` - the recovery boundary around bootstrap and the loop
//! - `screen` / `ui` - crossterm terminal and ratatui rendering
//! - `platform` - the seam the bootstrap is tested through

pub mod bootstrap;
pub mod cli;
pub mod crash;
pub mod input;
pub mod logging;
pub mod platform;
pub mod screen;
pub mod ui;

pub use bootstrap::run;
pub use platform::{Platform, WarningSurface};
