//! Event fan-out to registered observers
//!
//! `NotificationHub` delivers each published message synchronously, in
//! registration order, to every observer registered when `publish` was called.
//!
//! # Thread Safety
//!
//! Cashiers publish concurrently. The observer list sits behind an `RwLock`
//! and `publish` iterates a cloned snapshot of it with the lock released, so
//! an observer that subscribes another observer (or a concurrent `subscribe`)
//! can neither deadlock nor disturb the iteration in progress.

use crate::core::traits::Observer;
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Registry of observers
#[derive(Default)]
pub struct NotificationHub {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; it receives every later message
    pub fn subscribe(&self, observer: Arc<dyn Observer>) {
        self.observers.write().push(observer);
    }

    /// Deliver `message` to every registered observer
    pub fn publish(&self, message: &str) {
        let observers = self.observers.read().clone();
        for observer in &observers {
            observer.notify(message);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Prints every event as `Log: {message}`
///
/// Write errors are ignored; a closed console must not take cashiers down.
pub struct ConsoleLogger<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> Observer for ConsoleLogger<W> {
    fn notify(&self, message: &str) {
        let mut out = self.out.lock();
        let _ = writeln!(out, "Log: {}", message);
        let _ = out.flush();
    }
}

/// Forwards events to `tracing` under the `bank::events` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, message: &str) {
        info!(target: "bank::events", "{}", message);
    }
}

/// Keeps every event in memory, in delivery order
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<String>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Whether an event equal to `message` was received
    pub fn contains(&self, message: &str) -> bool {
        self.events.lock().iter().any(|event| event == message)
    }

    /// Number of received events starting with `prefix`
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.starts_with(prefix))
            .count()
    }
}

impl Observer for EventRecorder {
    fn notify(&self, message: &str) {
        self.events.lock().push(message.to_string());
    }
}
