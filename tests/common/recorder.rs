//! Event recorder.

use async_trait::async_trait;
use jinsoul::events::{Event, EventBus, EventKind, Listener};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Listener that keeps every event it sees.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    seen: Notify,
}

#[allow(dead_code)]
impl Recorder {
    /// Subscribe a new recorder to every event kind.
    pub fn attach(bus: &EventBus) -> Arc<Self> {
        let recorder = Arc::new(Self::default());
        for kind in EventKind::ALL {
            bus.on(kind, recorder.clone());
        }
        recorder
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(Event::kind).collect()
    }

    /// Kinds recorded, without the ones every prefixed dispatch emits.
    pub fn command_kinds(&self) -> Vec<EventKind> {
        self.kinds()
            .into_iter()
            .filter(|k| {
                !matches!(
                    k,
                    EventKind::PreMessageParsed | EventKind::PrefixedMessage | EventKind::PreCommandRun
                )
            })
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn first(&self, kind: EventKind) -> Option<Event> {
        self.events.lock().iter().find(|e| e.kind() == kind).cloned()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Wait until an event of `kind` was recorded.
    pub async fn wait_for(&self, kind: EventKind) -> Option<Event> {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let notified = self.seen.notified();
                if let Some(event) = self.first(kind) {
                    return event;
                }
                notified.await;
            }
        })
        .await
        .ok()
    }
}

#[async_trait]
impl Listener for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn run(&self, event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
        self.events.lock().push(event.clone());
        self.seen.notify_waiters();
        Ok(())
    }
}
