//! Dependency descriptors.
//!
//! Descriptors detect their tool and delegate installation to the platform
//! strategy produced by the injected [`InstallerFactory`](depkit_core::InstallerFactory).

mod ollama;
mod probe;
mod python;

pub use ollama::OllamaDependency;
pub use probe::{VersionQuery, probe_version};
pub use python::PythonDependency;
