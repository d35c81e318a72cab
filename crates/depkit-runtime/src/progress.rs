//! Install progress publish/subscribe.
//!
//! The reporter is an explicit handle: the composition root creates one and
//! passes clones to whoever publishes or listens. There is no global
//! instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use depkit_core::{InstallProgressEvent, InstallStatus};
use tokio::sync::mpsc;
use tracing::debug;

/// Handle identifying a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback receiving every published event.
pub type ProgressListener = Arc<dyn Fn(&InstallProgressEvent) + Send + Sync>;

#[derive(Clone)]
enum Sink {
    Callback(ProgressListener),
    Channel(mpsc::UnboundedSender<InstallProgressEvent>),
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Sink)>>,
}

/// Fan-out of [`InstallProgressEvent`]s to every subscriber.
///
/// Subscribers receive events in publication order, and are served in
/// registration order. Late subscribers get no replay.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    inner: Arc<Inner>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&InstallProgressEvent) + Send + Sync + 'static,
    {
        self.add(Sink::Callback(Arc::new(listener)))
    }

    /// Register a channel receiver for async consumers.
    ///
    /// The subscription ends when the receiver is dropped.
    pub fn subscribe_channel(
        &self,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<InstallProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.add(Sink::Channel(tx)), rx)
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        before != subscribers.len()
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Publish an event to every subscriber.
    pub fn report(&self, event: InstallProgressEvent) {
        debug!(
            dependency = %event.dependency,
            status = ?event.status,
            "{}",
            event.message
        );

        // Callbacks run outside the lock so they may subscribe or unsubscribe.
        let sinks: Vec<(SubscriptionId, Sink)> = self.lock().clone();
        let mut closed = Vec::new();
        for (id, sink) in sinks {
            match sink {
                Sink::Callback(listener) => listener(&event),
                Sink::Channel(tx) => {
                    if tx.send(event.clone()).is_err() {
                        closed.push(id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            self.lock().retain(|(id, _)| !closed.contains(id));
        }
    }

    pub fn report_checking(&self, dependency: &str, message: impl Into<String>) {
        self.report(InstallProgressEvent::new(
            dependency,
            InstallStatus::Checking,
            message,
        ));
    }

    pub fn report_downloading(
        &self,
        dependency: &str,
        message: impl Into<String>,
        progress: Option<u8>,
    ) {
        self.report(
            InstallProgressEvent::new(dependency, InstallStatus::Downloading, message)
                .with_progress(progress),
        );
    }

    pub fn report_installing(&self, dependency: &str, message: impl Into<String>) {
        self.report(InstallProgressEvent::new(
            dependency,
            InstallStatus::Installing,
            message,
        ));
    }

    pub fn report_completed(&self, dependency: &str, message: impl Into<String>) {
        self.report(
            InstallProgressEvent::new(dependency, InstallStatus::Completed, message)
                .with_progress(Some(100)),
        );
    }

    pub fn report_error(
        &self,
        dependency: &str,
        message: impl Into<String>,
        error: impl Into<String>,
    ) {
        self.report(
            InstallProgressEvent::new(dependency, InstallStatus::Error, message).with_error(error),
        );
    }

    fn add(&self, sink: Sink) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, sink));
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Sink)>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
