//! # Span Lifecycle Notifier
//!
//! Fan-out of span transitions to registered observers. Listeners are
//! plain values registered on a [`Tracer`]; they are invoked synchronously,
//! in registration order, on the thread performing the transition.
//!
//! A failing listener must not take the others down with it: each call is
//! run inside its own panic boundary, and a panic is reported through the
//! internal logging side channel only. The transition that triggered the
//! notification always finishes.
//!
//! [`Tracer`]: crate::trace::Tracer

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::trace::span::Span;
use crate::tracelink_error;

/// Observer of span lifecycle transitions.
///
/// All hooks default to no-ops so implementations only override what they
/// care about. Implementations must tolerate being invoked from arbitrary
/// execution contexts and should return quickly: they run on the request
/// path.
pub trait SpanLifecycleListener: Send + Sync {
    /// Called when a span transitions to started.
    fn span_started(&self, span: &Span) {
        let _ = span;
    }

    /// Called once the span's sampling decision is fixed, for sampleable
    /// spans only.
    fn span_sampled(&self, span: &Span) {
        let _ = span;
    }

    /// Called after a span has completed. The span is immutable at this
    /// point; clone whatever data outlives the call.
    fn span_completed(&self, span: &Span) {
        let _ = span;
    }
}

/// Process-wide shared registry of lifecycle listeners.
///
/// Registration and notification may race from unrelated execution
/// contexts; the registry is the only piece of shared mutable state in the
/// core, guarded by an internal mutex. The lock is never held while a
/// listener runs.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn SpanLifecycleListener>>>,
}

impl ListenerRegistry {
    pub(crate) fn new(listeners: Vec<Arc<dyn SpanLifecycleListener>>) -> Self {
        ListenerRegistry {
            listeners: Mutex::new(listeners),
        }
    }

    pub(crate) fn register(&self, listener: Arc<dyn SpanLifecycleListener>) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }

    /// Remove a previously registered listener, matched by identity.
    /// Returns `true` if it was found.
    pub(crate) fn unregister(&self, listener: &Arc<dyn SpanLifecycleListener>) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|registered| !Arc::ptr_eq(registered, listener));
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    pub(crate) fn notify_started(&self, span: &Span) {
        self.dispatch("span_started", |listener| listener.span_started(span));
    }

    pub(crate) fn notify_sampled(&self, span: &Span) {
        self.dispatch("span_sampled", |listener| listener.span_sampled(span));
    }

    pub(crate) fn notify_completed(&self, span: &Span) {
        self.dispatch("span_completed", |listener| listener.span_completed(span));
    }

    fn dispatch<F>(&self, hook: &'static str, f: F)
    where
        F: Fn(&dyn SpanLifecycleListener),
    {
        // Snapshot under the lock, invoke outside it: a listener may itself
        // register or unregister listeners.
        let snapshot = match self.listeners.lock() {
            Ok(listeners) => listeners.clone(),
            Err(_) => return,
        };
        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))).is_err() {
                tracelink_error!(name: "ListenerRegistry.ListenerPanicked", hook = hook);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.listeners.lock().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("ListenerRegistry")
            .field("listeners", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::span::SpanPurpose;
    use crate::trace::span_context::{SpanId, TraceId};

    fn test_span() -> Span {
        Span::new(
            TraceId::from(1u128),
            SpanId::from(2u64),
            None,
            "listener-test".to_owned(),
            SpanPurpose::Root,
            true,
        )
    }

    struct Recording {
        log: Arc<Mutex<Vec<&'static str>>>,
        label: &'static str,
    }

    impl SpanLifecycleListener for Recording {
        fn span_completed(&self, _span: &Span) {
            self.log.lock().unwrap().push(self.label);
        }
    }

    struct Panicking;

    impl SpanLifecycleListener for Panicking {
        fn span_completed(&self, _span: &Span) {
            panic!("listener blew up");
        }
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = ListenerRegistry::default();
        registry.register(Arc::new(Recording {
            log: log.clone(),
            label: "first",
        }));
        registry.register(Arc::new(Recording {
            log: log.clone(),
            label: "second",
        }));

        registry.notify_completed(&test_span());

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn panicking_listener_does_not_stop_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = ListenerRegistry::default();
        registry.register(Arc::new(Panicking));
        registry.register(Arc::new(Recording {
            log: log.clone(),
            label: "survivor",
        }));

        registry.notify_completed(&test_span());

        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn unregister_removes_by_identity() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = ListenerRegistry::default();
        let keep: Arc<dyn SpanLifecycleListener> = Arc::new(Recording {
            log: log.clone(),
            label: "keep",
        });
        let removed: Arc<dyn SpanLifecycleListener> = Arc::new(Recording {
            log: log.clone(),
            label: "removed",
        });
        registry.register(keep.clone());
        registry.register(removed.clone());
        assert_eq!(registry.len(), 2);

        assert!(registry.unregister(&removed));
        assert!(!registry.unregister(&removed));
        assert_eq!(registry.len(), 1);

        registry.notify_completed(&test_span());
        assert_eq!(*log.lock().unwrap(), vec!["keep"]);
    }
}
