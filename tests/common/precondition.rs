//! Scriptable precondition.

use async_trait::async_trait;
use jinsoul::commands::Command;
use jinsoul::preconditions::{Precondition, PreconditionContext, PreconditionResult};
use jinsoul::{Identifier, Message, UserError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Passes or fails as told, optionally after a delay.
///
/// Failures carry the precondition's name as their identifier.
pub struct Scripted {
    name: String,
    passes: AtomicBool,
    delay: Duration,
    position: Option<i32>,
    calls: AtomicUsize,
    /// Entry contexts seen, in call order.
    contexts: Mutex<Vec<Option<serde_json::Value>>>,
}

#[allow(dead_code)]
impl Scripted {
    pub fn new(name: &str, passes: bool) -> Arc<Self> {
        Self::build(name, passes, Duration::ZERO, None)
    }

    pub fn delayed(name: &str, passes: bool, delay: Duration) -> Arc<Self> {
        Self::build(name, passes, delay, None)
    }

    pub fn global(name: &str, passes: bool, position: i32) -> Arc<Self> {
        Self::build(name, passes, Duration::ZERO, Some(position))
    }

    fn build(name: &str, passes: bool, delay: Duration, position: Option<i32>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            passes: AtomicBool::new(passes),
            delay,
            position,
            calls: AtomicUsize::new(0),
            contexts: Mutex::new(Vec::new()),
        })
    }

    pub fn set_passes(&self, passes: bool) {
        self.passes.store(passes, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contexts(&self) -> Vec<Option<serde_json::Value>> {
        self.contexts.lock().clone()
    }
}

#[async_trait]
impl Precondition for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Option<i32> {
        self.position
    }

    async fn run(&self, _message: &Message, _command: &Command, ctx: &PreconditionContext<'_>) -> PreconditionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().push(ctx.entry.cloned());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.passes.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(UserError::new(Identifier::custom(self.name.clone()), format!("{} failed", self.name)))
        }
    }
}
