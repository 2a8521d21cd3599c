//! Cooperative shutdown
//!
//! A shutdown request only sets a flag. The orchestrator checks it between pages
//! and finishes early with what it has collected; in-flight waits are never
//! interrupted. Registered cleanup actions run exactly once, whether shutdown came
//! from a signal or from normal completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type CleanupFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type CleanupAction = Box<dyn FnOnce() -> CleanupFuture + Send>;

#[derive(Default)]
struct Inner {
    requested: AtomicBool,
    cleaned_up: AtomicBool,
    actions: Mutex<Vec<(String, CleanupAction)>>,
}

/// Cloneable handle to the process-wide shutdown state
#[derive(Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("requested", &self.is_requested())
            .field("cleaned_up", &self.is_cleaned_up())
            .finish()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks running sessions to stop at their next page boundary
    pub fn request(&self) {
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            tracing::warn!("Shutdown requested, finishing current page");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.inner.cleaned_up.load(Ordering::SeqCst)
    }

    /// Registers an async action to run during [`ShutdownHandle::cleanup`]
    ///
    /// Actions run in registration order. Registering after cleanup has run has no
    /// effect.
    pub fn register_cleanup<F, Fut>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        if self.is_cleaned_up() {
            tracing::debug!("Cleanup already ran, ignoring '{}'", name);
            return;
        }

        let action: CleanupAction = Box::new(move || Box::pin(action()) as CleanupFuture);
        self.inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name, action));
    }

    /// Runs every registered cleanup action, once
    ///
    /// Also marks shutdown as requested.
    ///
    /// # Returns
    ///
    /// * `true` - This call ran the cleanup
    /// * `false` - Cleanup had already run
    pub async fn cleanup(&self) -> bool {
        if self.inner.cleaned_up.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.requested.store(true, Ordering::SeqCst);

        let actions: Vec<(String, CleanupAction)> = std::mem::take(
            &mut *self
                .inner
                .actions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        tracing::info!("Running {} cleanup action(s)", actions.len());
        for (name, action) in actions {
            tracing::debug!("Cleanup: {}", name);
            action().await;
        }
        tracing::info!("Cleanup complete");

        true
    }

    /// Requests shutdown when the process receives Ctrl+C
    pub fn listen_for_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::warn!("Received Ctrl+C");
                    handle.request();
                }
                Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_request_sets_flag() {
        let handle = ShutdownHandle::new();
        let other = handle.clone();
        assert!(!other.is_requested());

        handle.request();
        assert!(other.is_requested());
    }

    #[tokio::test]
    async fn test_cleanup_runs_once() {
        let handle = ShutdownHandle::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        handle.register_cleanup("count", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(handle.cleanup().await);
        assert!(!handle.cleanup().await);
        assert!(!handle.clone().cleanup().await);

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(handle.is_requested());
        assert!(handle.is_cleaned_up());
    }

    #[tokio::test]
    async fn test_cleanup_runs_in_order() {
        let handle = ShutdownHandle::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["close agent", "flush logs"] {
            let order = Arc::clone(&order);
            handle.register_cleanup(name, move || async move {
                order.lock().unwrap().push(name);
            });
        }

        handle.cleanup().await;
        assert_eq!(*order.lock().unwrap(), vec!["close agent", "flush logs"]);
    }

    #[tokio::test]
    async fn test_register_after_cleanup_is_ignored() {
        let handle = ShutdownHandle::new();
        handle.cleanup().await;

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        handle.register_cleanup("late", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!handle.cleanup().await);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
