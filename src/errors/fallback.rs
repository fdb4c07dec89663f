use axum::{http::StatusCode, response::Response};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info};

use super::response::ResponseContext;
use crate::metrics::FALLBACK_DISPATCHES_TOTAL;

/// Last-chance handler for uncaught errors that are not structured errors.
///
/// Receives the error and a tag naming the dispatcher that caught it.
pub type FallbackHandler = Arc<dyn Fn(&anyhow::Error, &str) -> Response + Send + Sync>;

/// Message sent by the default handler; the error text itself stays in logs
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred";

/// Holds the fallback handler for one application.
///
/// Starts unset. [`register`](Self::register) always replaces the handler;
/// [`install_default`](Self::install_default) only fills an empty slot.
#[derive(Default)]
pub struct FallbackRegistry {
    slot: RwLock<Option<FallbackHandler>>,
}

impl fmt::Debug for FallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackRegistry")
            .field("is_set", &self.is_set())
            .finish()
    }
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, replacing any previous one
    pub fn register(&self, handler: FallbackHandler) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = slot.replace(handler).is_some();
        info!(replaced, "Registered fallback error handler");
    }

    /// Install the logging default when no handler is set.
    ///
    /// Returns true when the default was installed by this call.
    pub fn install_default(&self) -> bool {
        self.install_default_with(default_handler)
    }

    /// Like [`install_default`](Self::install_default) with a caller-built
    /// default. `make` only runs when the slot is empty.
    pub fn install_default_with<F>(&self, make: F) -> bool
    where
        F: FnOnce() -> FallbackHandler,
    {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(make());
        true
    }

    pub fn is_set(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run the current handler, or the default one when unset
    pub fn handle(&self, err: &anyhow::Error, tag: &str) -> Response {
        FALLBACK_DISPATCHES_TOTAL.with_label_values(&[tag]).inc();

        // Cloned out so the handler runs without holding the lock
        let handler = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler(err, tag),
            None => default_handler()(err, tag),
        }
    }
}

/// Logs the error and answers with a generic 500
pub fn default_handler() -> FallbackHandler {
    Arc::new(|err: &anyhow::Error, tag: &str| {
        error!(dispatcher = %tag, error = ?err, "Unhandled error");

        ResponseContext::new()
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            .with_message(GENERIC_FAILURE_MESSAGE)
            .emit()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn teapot_handler(calls: Arc<AtomicUsize>) -> FallbackHandler {
        Arc::new(move |_err: &anyhow::Error, _tag: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            ResponseContext::new()
                .with_status(StatusCode::IM_A_TEAPOT)
                .emit()
        })
    }

    #[test]
    fn test_starts_unset() {
        let registry = FallbackRegistry::new();
        assert!(!registry.is_set());
    }

    #[test]
    fn test_install_default_only_when_unset() {
        let registry = FallbackRegistry::new();
        assert!(registry.install_default());
        assert!(registry.is_set());
        assert!(!registry.install_default());
    }

    #[test]
    fn test_install_default_with_is_lazy() {
        let registry = FallbackRegistry::new();
        registry.install_default();

        let built = AtomicUsize::new(0);
        let installed = registry.install_default_with(|| {
            built.fetch_add(1, Ordering::SeqCst);
            default_handler()
        });
        assert!(!installed);
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_implicit_install_never_replaces_registered_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = FallbackRegistry::new();
        registry.register(teapot_handler(calls.clone()));

        assert!(!registry.install_default());
        assert!(!registry.install_default());

        let response = registry.handle(&anyhow::anyhow!("boom"), "test");
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_register_always_replaces() {
        let registry = FallbackRegistry::new();
        registry.install_default();

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        registry.register(teapot_handler(first.clone()));
        registry.register(teapot_handler(second.clone()));

        registry.handle(&anyhow::anyhow!("boom"), "test");
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_receives_error_and_tag() {
        let seen = Arc::new(RwLock::new(None::<(String, String)>));
        let registry = FallbackRegistry::new();
        let sink = seen.clone();
        registry.register(Arc::new(move |err: &anyhow::Error, tag: &str| {
            *sink.write().unwrap() = Some((err.to_string(), tag.to_string()));
            ResponseContext::new().emit()
        }));

        registry.handle(&anyhow::anyhow!("disk full"), "dispatch_uncaught");
        assert_eq!(
            seen.read().unwrap().clone(),
            Some(("disk full".to_string(), "dispatch_uncaught".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unset_registry_uses_generic_default() {
        let registry = FallbackRegistry::new();
        let response = registry.handle(&anyhow::anyhow!("secret internals"), "test");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(GENERIC_FAILURE_MESSAGE));
        assert!(!text.contains("secret internals"));
    }
}
