//! Event types emitted while provisioning dependencies.
//!
//! # Wire Format
//!
//! Events serialize with camelCase fields and a lowercase status so GUI
//! listeners can consume them directly:
//!
//! ```json
//! { "dependency": "ollama", "status": "downloading", "message": "Downloading Ollama", "progress": 42 }
//! ```

mod install;

pub use install::{InstallProgressEvent, InstallStatus, ProgressUpdate};
