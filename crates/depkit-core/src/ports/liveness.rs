//! Liveness probe port for background services.

use async_trait::async_trait;

/// A lightweight health check confirming a service accepts requests.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Single probe. Any failure (refused, timeout, bad status, bad body)
    /// is `false`.
    async fn probe(&self) -> bool;

    /// Endpoint being probed, for messages.
    fn endpoint(&self) -> String;
}
