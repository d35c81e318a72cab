//! Python 3 interpreter descriptor.

use std::sync::Arc;

use async_trait::async_trait;
use depkit_core::{
    CommandExecutor, Dependency, DependencyKind, DependencyStatus, InstallError, Installable,
    InstallerFactory, OnProgress, Platform,
};

use super::probe::{VersionQuery, probe_version};
use crate::platform::PYTHON;
use crate::version::major_minor;

const UNIX_QUERIES: &[VersionQuery] = &[
    VersionQuery::new("python3", "python3 --version"),
    VersionQuery::new("python", "python --version"),
];

const WINDOWS_QUERIES: &[VersionQuery] = &[
    VersionQuery::new("python3", "python3 --version"),
    VersionQuery::new("python", "python --version"),
    VersionQuery::new("py", "py -3 --version"),
];

const MIN_PYTHON: (u32, u32) = (3, 9);
const MAX_PYTHON: (u32, u32) = (3, 15);
const RECOMMENDED_PYTHON: &str = "3.11";

/// Whether `version` falls in the supported interpreter range.
fn is_supported_python(version: &str) -> bool {
    major_minor(version).is_some_and(|v| (MIN_PYTHON..=MAX_PYTHON).contains(&v))
}

/// The Python interpreter. Only 3.9 through 3.15 count.
pub struct PythonDependency {
    executor: Arc<dyn CommandExecutor>,
    installers: InstallerFactory,
    platform: Platform,
}

impl PythonDependency {
    pub fn new(executor: Arc<dyn CommandExecutor>, installers: InstallerFactory) -> Self {
        Self {
            executor,
            installers,
            platform: Platform::current(),
        }
    }

    /// Probe with the version queries of another platform.
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    fn queries(&self) -> &'static [VersionQuery] {
        if self.platform == Platform::Windows {
            WINDOWS_QUERIES
        } else {
            UNIX_QUERIES
        }
    }
}

#[async_trait]
impl Dependency for PythonDependency {
    fn name(&self) -> &str {
        PYTHON
    }

    fn display_name(&self) -> &str {
        "Python"
    }

    fn kind(&self) -> DependencyKind {
        DependencyKind::Interpreter
    }

    async fn check(&self) -> DependencyStatus {
        probe_version(
            self.executor.as_ref(),
            "python",
            self.queries(),
            is_supported_python,
        )
        .await
    }

    fn as_installable(&self) -> Option<&dyn Installable> {
        Some(self)
    }
}

#[async_trait]
impl Installable for PythonDependency {
    async fn install(
        &self,
        platform: Platform,
        on_progress: OnProgress<'_>,
    ) -> Result<(), InstallError> {
        (self.installers)(platform, self.executor.clone())
            .install(PYTHON, on_progress)
            .await
    }

    fn manual_instructions(&self, platform: Platform) -> String {
        let text = (self.installers)(platform, self.executor.clone()).manual_instructions(PYTHON);
        let ((min_major, min_minor), (max_major, max_minor)) = (MIN_PYTHON, MAX_PYTHON);
        format!(
            "{text}\nSupported: Python {min_major}.{min_minor} through {max_major}.{max_minor} \
             ({RECOMMENDED_PYTHON} recommended).\n"
        )
    }
}
