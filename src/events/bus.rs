//! Publish/subscribe bus.
//!
//! Subscriptions are stored per [`EventKind`] as immutable slices that are
//! replaced on every change. [`EventBus::emit`] clones the slice for the
//! event's kind before delivering, so subscribing or unsubscribing during a
//! delivery (including a once-listener removing itself) never changes the
//! set of listeners that delivery reaches.
//!
//! Listeners subscribed with [`EventBus::on`] or [`EventBus::once`] are
//! awaited in subscription order before `emit` returns, so the pipeline's
//! next stage starts only after they finish and every listener sees the
//! events of one dispatch in order. Listeners that do slow work (replying
//! through the transport, for instance) should subscribe with
//! [`EventBus::on_detached`], which delivers on a spawned task.

use super::{Event, EventKind};
use crate::error::panic_message;
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, warn};

/// A subscriber.
///
/// Errors and panics are caught per listener and reported as
/// [`Event::ListenerError`]; they never reach the emitter.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Name used in logs and `ListenerError` payloads.
    fn name(&self) -> &str;

    async fn run(&self, event: &Event, bus: &EventBus) -> anyhow::Result<()>;
}

/// Handle returned by [`EventBus::on`] and [`EventBus::once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    listener: Arc<dyn Listener>,
    once: bool,
    detached: bool,
    fired: AtomicBool,
}

#[derive(Default)]
struct Inner {
    subscriptions: DashMap<EventKind, Arc<[Arc<Subscription>]>>,
    next_id: AtomicU64,
}

/// Cloneable handle to a shared bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to every event of `kind`.
    pub fn on(&self, kind: EventKind, listener: Arc<dyn Listener>) -> SubscriptionId {
        self.subscribe(kind, listener, false, false)
    }

    /// Subscribe `listener` to the next event of `kind` only.
    pub fn once(&self, kind: EventKind, listener: Arc<dyn Listener>) -> SubscriptionId {
        self.subscribe(kind, listener, true, false)
    }

    /// Subscribe `listener` to every event of `kind`, delivered on its own
    /// Tokio task.
    ///
    /// `emit` does not wait for it. Failures are still reported as
    /// [`Event::ListenerError`], from that task.
    pub fn on_detached(&self, kind: EventKind, listener: Arc<dyn Listener>) -> SubscriptionId {
        self.subscribe(kind, listener, false, true)
    }

    fn subscribe(&self, kind: EventKind, listener: Arc<dyn Listener>, once: bool, detached: bool) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(event = %kind, listener = listener.name(), once, detached, "Listener subscribed");

        let subscription = Arc::new(Subscription {
            id,
            listener,
            once,
            detached,
            fired: AtomicBool::new(false),
        });
        let mut entry = self.inner.subscriptions.entry(kind).or_insert_with(|| Arc::from(Vec::new()));
        let mut next: Vec<Arc<Subscription>> = entry.iter().cloned().collect();
        next.push(subscription);
        *entry = Arc::from(next);
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        for mut entry in self.inner.subscriptions.iter_mut() {
            if entry.iter().any(|s| s.id == id) {
                let next: Vec<Arc<Subscription>> = entry.iter().filter(|s| s.id != id).cloned().collect();
                *entry = Arc::from(next);
                return true;
            }
        }
        false
    }

    /// Number of live subscriptions for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.subscriptions.get(&kind).map_or(0, |s| s.len())
    }

    /// Deliver `event` to its subscribers, one after another.
    ///
    /// Returns once every awaited listener has finished; detached listeners
    /// are only started. A failing listener is reported as
    /// [`Event::ListenerError`]; a failure while handling that report is
    /// only logged.
    pub async fn emit(&self, event: Event) {
        let kind = event.kind();
        let failures = self.deliver(&event).await;
        self.report(kind, failures).await;
    }

    async fn report(&self, kind: EventKind, failures: Vec<(String, anyhow::Error)>) {
        if kind == EventKind::ListenerError {
            return;
        }

        for (listener, error) in failures {
            let report = Event::ListenerError {
                error: Arc::new(error),
                listener,
                event: kind,
            };
            for (name, error) in self.deliver(&report).await {
                warn!(listener = %name, error = %error, "ListenerError handler failed");
            }
        }
    }

    async fn deliver(&self, event: &Event) -> Vec<(String, anyhow::Error)> {
        let snapshot = match self.inner.subscriptions.get(&event.kind()) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Vec::new(),
        };

        let mut failures = Vec::new();
        for subscription in snapshot.iter() {
            if subscription.once {
                if subscription.fired.swap(true, Ordering::AcqRel) {
                    continue;
                }
                self.unsubscribe(subscription.id);
            }

            if subscription.detached {
                self.spawn_delivery(Arc::clone(&subscription.listener), event.clone());
                continue;
            }

            if let Some(error) = run_listener(subscription.listener.as_ref(), event, self).await {
                failures.push((subscription.listener.name().to_string(), error));
            }
        }
        failures
    }

    fn spawn_delivery(&self, listener: Arc<dyn Listener>, event: Event) {
        let bus = self.clone();
        tokio::spawn(async move {
            let kind = event.kind();
            if let Some(error) = run_listener(listener.as_ref(), &event, &bus).await {
                bus.report(kind, vec![(listener.name().to_string(), error)]).await;
            }
        });
    }
}

/// Run one listener, turning errors and panics into an `anyhow::Error`.
async fn run_listener(listener: &dyn Listener, event: &Event, bus: &EventBus) -> Option<anyhow::Error> {
    let outcome = AssertUnwindSafe(listener.run(event, bus)).catch_unwind().await;
    let error = match outcome {
        Ok(Ok(())) => return None,
        Ok(Err(error)) => error,
        Err(payload) => anyhow::anyhow!("listener panicked: {}", panic_message(payload.as_ref())),
    };
    warn!(listener = %listener.name(), event = %event.kind(), error = %error, "Listener failed");
    Some(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use parking_lot::Mutex;

    fn event() -> Event {
        Event::NonPrefixedMessage {
            message: Arc::new(Message::chat("chat", "user", "hi")),
        }
    }

    #[derive(Default)]
    struct Counter {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Listener for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        async fn run(&self, event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
            self.seen.lock().push(event.kind());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Listener for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
            anyhow::bail!("nope")
        }
    }

    struct Panicking;

    #[async_trait]
    impl Listener for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn run(&self, _event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
            panic!("kaboom")
        }
    }

    /// Re-emits the same kind from inside its own handler.
    struct Reentrant(Arc<Counter>);

    #[async_trait]
    impl Listener for Reentrant {
        fn name(&self) -> &str {
            "reentrant"
        }

        async fn run(&self, event: &Event, bus: &EventBus) -> anyhow::Result<()> {
            self.0.seen.lock().push(event.kind());
            bus.emit(event.clone()).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_to_matching_kind_only() {
        let bus = EventBus::new();
        let counter = Arc::new(Counter::default());
        bus.on(EventKind::NonPrefixedMessage, counter.clone());
        bus.on(EventKind::CommandRun, Arc::new(Failing));

        bus.emit(event()).await;
        assert_eq!(*counter.seen.lock(), [EventKind::NonPrefixedMessage]);
    }

    #[tokio::test]
    async fn once_fires_a_single_time_even_when_reentered() {
        let bus = EventBus::new();
        let counter = Arc::new(Counter::default());
        bus.once(EventKind::NonPrefixedMessage, Arc::new(Reentrant(counter.clone())));

        bus.emit(event()).await;
        bus.emit(event()).await;
        assert_eq!(counter.seen.lock().len(), 1);
        assert_eq!(bus.listener_count(EventKind::NonPrefixedMessage), 0);
    }

    #[tokio::test]
    async fn unsubscribe_during_delivery_keeps_snapshot() {
        struct Remover(Mutex<Option<SubscriptionId>>);

        #[async_trait]
        impl Listener for Remover {
            fn name(&self) -> &str {
                "remover"
            }

            async fn run(&self, _event: &Event, bus: &EventBus) -> anyhow::Result<()> {
                let id = self.0.lock().take();
                if let Some(id) = id {
                    bus.unsubscribe(id);
                }
                Ok(())
            }
        }

        let bus = EventBus::new();
        let remover = Arc::new(Remover(Mutex::new(None)));
        let counter = Arc::new(Counter::default());
        bus.on(EventKind::NonPrefixedMessage, remover.clone());
        let id = bus.on(EventKind::NonPrefixedMessage, counter.clone());
        *remover.0.lock() = Some(id);

        bus.emit(event()).await;
        assert_eq!(counter.seen.lock().len(), 1);

        bus.emit(event()).await;
        assert_eq!(counter.seen.lock().len(), 1);
    }

    /// Holds delivery until released.
    struct Gate {
        release: tokio::sync::Notify,
        done: Counter,
    }

    #[async_trait]
    impl Listener for Gate {
        fn name(&self) -> &str {
            "gate"
        }

        async fn run(&self, event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
            self.release.notified().await;
            self.done.seen.lock().push(event.kind());
            Ok(())
        }
    }

    #[tokio::test]
    async fn detached_listener_does_not_hold_up_emit() {
        let bus = EventBus::new();
        let gate = Arc::new(Gate {
            release: tokio::sync::Notify::new(),
            done: Counter::default(),
        });
        let after = Arc::new(Counter::default());
        bus.on_detached(EventKind::NonPrefixedMessage, gate.clone());
        bus.on(EventKind::NonPrefixedMessage, after.clone());

        tokio::time::timeout(std::time::Duration::from_secs(1), bus.emit(event()))
            .await
            .expect("emit returns while the detached listener waits");
        assert_eq!(after.seen.lock().len(), 1);
        assert!(gate.done.seen.lock().is_empty());

        gate.release.notify_one();
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while gate.done.seen.lock().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("detached listener finishes after release");
    }

    #[tokio::test]
    async fn detached_failures_become_listener_errors() {
        let bus = EventBus::new();
        let errors = Arc::new(Counter::default());
        bus.on_detached(EventKind::NonPrefixedMessage, Arc::new(Panicking));
        bus.on(EventKind::ListenerError, errors.clone());

        bus.emit(event()).await;

        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while errors.seen.lock().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("ListenerError reported from the detached task");
        assert_eq!(*errors.seen.lock(), [EventKind::ListenerError]);
    }

    #[tokio::test]
    async fn failures_and_panics_become_listener_errors() {
        let bus = EventBus::new();
        let errors = Arc::new(Counter::default());
        let after = Arc::new(Counter::default());
        bus.on(EventKind::NonPrefixedMessage, Arc::new(Failing));
        bus.on(EventKind::NonPrefixedMessage, Arc::new(Panicking));
        bus.on(EventKind::NonPrefixedMessage, after.clone());
        bus.on(EventKind::ListenerError, errors.clone());
        bus.on(EventKind::ListenerError, Arc::new(Failing));

        bus.emit(event()).await;

        assert_eq!(after.seen.lock().len(), 1);
        assert_eq!(*errors.seen.lock(), [EventKind::ListenerError, EventKind::ListenerError]);
        assert_eq!(bus.listener_count(EventKind::ListenerError), 2);
    }
}
