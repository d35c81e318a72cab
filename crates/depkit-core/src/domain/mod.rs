//! Domain types shared by every provisioning layer.

mod platform;
mod status;

pub use platform::Platform;
pub use status::{DependencyKind, DependencyStatus, SENTINEL_VERSION};
