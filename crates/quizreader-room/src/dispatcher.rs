//! Inbound event dispatch
//!
//! Listeners register per event type, or for every event through the wildcard
//! hook. A listener that panics is reported to the error sink and logged; the
//! remaining listeners for that event still run.

use crate::error::RoomError;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Wildcard event type: listeners receive `(type, payload)` for every message.
pub const WILDCARD: &str = "*";

pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;
pub type WildcardHandler = Arc<dyn Fn(&str, &Value) + Send + Sync>;
pub type ErrorSink = Arc<dyn Fn(&RoomError) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    typed: HashMap<String, Vec<(u64, EventHandler)>>,
    wildcard: Vec<(u64, WildcardHandler)>,
    error_sink: Option<ErrorSink>,
}

impl Registry {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Typed,
    Wildcard,
}

/// Handle returned by a registration. Call [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    event_type: String,
    slot: Slot,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock();
        match self.slot {
            Slot::Wildcard => registry.wildcard.retain(|(id, _)| *id != self.id),
            Slot::Typed => {
                if let Some(handlers) = registry.typed.get_mut(&self.event_type) {
                    handlers.retain(|(id, _)| *id != self.id);
                    if handlers.is_empty() {
                        registry.typed.remove(&self.event_type);
                    }
                }
            }
        }
    }
}

/// Listener registry shared between a client and its reader task.
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: Arc<Mutex<Registry>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`. [`WILDCARD`] registers it for every
    /// event; the payload still carries the `type` field.
    pub fn on<F>(&self, event_type: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        if event_type == WILDCARD {
            return self.on_any(move |_, payload| handler(payload));
        }
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry
            .typed
            .entry(event_type.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription {
            id,
            event_type: event_type.to_string(),
            slot: Slot::Typed,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a wildcard handler receiving `(type, payload)` for every event.
    pub fn on_any<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry.wildcard.push((id, Arc::new(handler)));
        Subscription {
            id,
            event_type: WILDCARD.to_string(),
            slot: Slot::Wildcard,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Route handler panics and malformed messages to `sink`.
    pub fn set_error_sink<F>(&self, sink: F)
    where
        F: Fn(&RoomError) + Send + Sync + 'static,
    {
        self.registry.lock().error_sink = Some(Arc::new(sink));
    }

    /// Number of listeners for `event_type` (wildcard listeners not included).
    pub fn listener_count(&self, event_type: &str) -> usize {
        let registry = self.registry.lock();
        if event_type == WILDCARD {
            registry.wildcard.len()
        } else {
            registry.typed.get(event_type).map_or(0, Vec::len)
        }
    }

    /// Parse and dispatch one raw inbound message. Returns whether it was dispatched.
    pub fn dispatch_raw(&self, raw: &str) -> bool {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Dropping malformed room message");
                self.report(&RoomError::Json(e));
                return false;
            }
        };
        let Some(event_type) = value.get("type").and_then(Value::as_str).map(str::to_string) else {
            warn!("Dropping room message without a type");
            self.report(&RoomError::Malformed("missing 'type' field".to_string()));
            return false;
        };
        self.emit(&event_type, &value);
        true
    }

    /// Deliver `payload` to every listener of `event_type`, then to wildcard listeners.
    pub fn emit(&self, event_type: &str, payload: &Value) {
        // Snapshot so listeners may (un)subscribe while being called
        let (typed, wildcard) = {
            let registry = self.registry.lock();
            let typed: Vec<EventHandler> = registry
                .typed
                .get(event_type)
                .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default();
            let wildcard: Vec<WildcardHandler> =
                registry.wildcard.iter().map(|(_, h)| Arc::clone(h)).collect();
            (typed, wildcard)
        };

        debug!(
            event_type,
            listeners = typed.len(),
            wildcard = wildcard.len(),
            "Dispatching room event"
        );

        for handler in typed {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                self.handler_failed(event_type, panic);
            }
        }
        for handler in wildcard {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(event_type, payload))) {
                self.handler_failed(event_type, panic);
            }
        }
    }

    fn handler_failed(&self, event_type: &str, panic: Box<dyn std::any::Any + Send>) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic".to_string());
        warn!(event_type, %message, "Room event handler panicked");
        self.report(&RoomError::Handler {
            event_type: event_type.to_string(),
            message,
        });
    }

    fn report(&self, error: &RoomError) {
        let sink = self.registry.lock().error_sink.clone();
        if let Some(sink) = sink {
            sink(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn join_reaches_every_handler_once() {
        let dispatcher = Dispatcher::new();
        let a = counter();
        let b = counter();
        let any = Arc::new(Mutex::new(Vec::new()));

        let a2 = a.clone();
        dispatcher.on("join", move |payload| {
            assert_eq!(payload["username"], "Ann");
            a2.fetch_add(1, Ordering::SeqCst);
        });
        let b2 = b.clone();
        dispatcher.on("join", move |_| {
            b2.fetch_add(1, Ordering::SeqCst);
        });
        let any2 = any.clone();
        dispatcher.on_any(move |event_type, payload| {
            any2.lock().push((event_type.to_string(), payload.clone()));
        });

        assert!(dispatcher.dispatch_raw(r#"{"type":"join","userId":"u1","username":"Ann"}"#));

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        let seen = any.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "join");
        assert_eq!(seen[0].1, json!({"type":"join","userId":"u1","username":"Ann"}));
    }

    #[test]
    fn malformed_messages_reach_no_handler() {
        let dispatcher = Dispatcher::new();
        let calls = counter();
        let errors = counter();

        let c = calls.clone();
        dispatcher.on_any(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let e = errors.clone();
        dispatcher.set_error_sink(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!dispatcher.dispatch_raw("not json"));
        assert!(!dispatcher.dispatch_raw(r#"{"word":"x"}"#));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(errors.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_handler_does_not_block_others() {
        let dispatcher = Dispatcher::new();
        let after = counter();
        let reported = Arc::new(Mutex::new(None));

        dispatcher.on("buzz", |_| panic!("listener bug"));
        let a = after.clone();
        dispatcher.on("buzz", move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let r = reported.clone();
        dispatcher.set_error_sink(move |error| {
            *r.lock() = Some(error.to_string());
        });

        dispatcher.emit("buzz", &json!({"type": "buzz"}));
        dispatcher.emit("buzz", &json!({"type": "buzz"}));

        assert_eq!(after.load(Ordering::SeqCst), 2);
        assert_eq!(
            reported.lock().as_deref(),
            Some("Handler for 'buzz' panicked: listener bug")
        );
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let dispatcher = Dispatcher::new();
        let kept = counter();

        let gone = dispatcher.on("chat", |_| panic!("should be removed"));
        let k = kept.clone();
        dispatcher.on("chat", move |_| {
            k.fetch_add(1, Ordering::SeqCst);
        });
        let wildcard = dispatcher.on_any(|_, _| panic!("should be removed"));

        gone.unsubscribe();
        wildcard.unsubscribe();
        assert_eq!(dispatcher.listener_count("chat"), 1);
        assert_eq!(dispatcher.listener_count(WILDCARD), 0);

        dispatcher.emit("chat", &json!({"type": "chat"}));
        assert_eq!(kept.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wildcard_type_through_on_sees_every_event() {
        let dispatcher = Dispatcher::new();
        let calls = counter();

        let c = calls.clone();
        let sub = dispatcher.on(WILDCARD, move |payload| {
            assert!(payload.get("type").is_some());
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(dispatcher.listener_count(WILDCARD), 1);

        assert!(dispatcher.dispatch_raw(r#"{"type":"join","userId":"u1","username":"Ann"}"#));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        assert_eq!(dispatcher.listener_count(WILDCARD), 0);
        assert!(dispatcher.dispatch_raw(r#"{"type":"*"}"#));
        assert!(dispatcher.dispatch_raw(r#"{"type":"chat"}"#));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
