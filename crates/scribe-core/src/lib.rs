//! Scribe Core - the collaborators the editor runtime sequences.
//!
//! The runtime crate owns the event loop; this crate owns the state that the
//! loop mutates and the narrow interfaces it needs:
//!
//! - **config**: configuration directory resolution and layout
//! - **settings**: option defaults, native-type conversion, settings file
//! - **runtime_files** / **colorscheme**: discoverable runtime assets
//! - **plugin**: plugin discovery and named extension hooks
//! - **clipboard**: clipboard backend selection
//! - **buffer** / **registry**: open documents and the registry that owns them
//! - **bindings** / **commands** / **actions**: turning input into mutations
//! - **tabs** / **infobar**: tab, pane and prompt state
//! - **jobs** / **notify**: background job results and redraw requests
//! - **session**: the single context object shared through the mutation lock

pub mod actions;
pub mod atomic;
pub mod bindings;
pub mod buffer;
pub mod clipboard;
pub mod colorscheme;
pub mod commands;
pub mod config;
pub mod error;
pub mod infobar;
pub mod jobs;
pub mod notify;
pub mod plugin;
pub mod registry;
pub mod runtime_files;
pub mod session;
pub mod settings;
pub mod stdout;
pub mod tabs;

pub use buffer::{Buffer, BufferId, BufferKind, Loc};
pub use config::ConfigDir;
pub use error::{CoreError, Result};
pub use jobs::{JobCallback, JobOrigin, JobResult, JobSender};
pub use notify::{CloseNotifier, RedrawHandle};
pub use plugin::ExtensionFault;
pub use registry::BufferRegistry;
pub use session::{Session, SessionHandles};
pub use settings::{Settings, Value};
pub use stdout::DeferredStdout;
