//! Integration tests for precondition containers and the global list.

mod common;

use async_trait::async_trait;
use common::{MockTransport, PRIVATE_CHAT, Scripted};
use jinsoul::args::Args;
use jinsoul::commands::{Command, CommandHandler, CommandOptions, CommandOutput, CommandResult, Context, MatchedPrefix, RunContext};
use jinsoul::preconditions::{
    Mode, Precondition, PreconditionContainer, PreconditionContext, PreconditionEntry, PreconditionResult,
    PreconditionStore, RunStrategy,
};
use jinsoul::{Identifier, Message};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

struct Noop;

#[async_trait]
impl CommandHandler for Noop {
    async fn message_run(&self, _ctx: &Context<'_>, _args: &mut Args) -> CommandResult {
        Ok(CommandOutput::Null)
    }
}

struct Fixture {
    transport: MockTransport,
    run: RunContext,
    message: Message,
    command: Command,
}

impl Fixture {
    fn new() -> Self {
        Self {
            transport: MockTransport::new(),
            run: RunContext {
                prefix: MatchedPrefix::Literal("!".into()),
                command_prefix: "!".into(),
                command_name: "test".into(),
                extras: serde_json::Map::new(),
            },
            message: Message::chat(PRIVATE_CHAT, "alice", "!test"),
            command: Command::new(CommandOptions::new("test"), Noop).unwrap(),
        }
    }

    fn ctx(&self) -> PreconditionContext<'_> {
        PreconditionContext {
            transport: &self.transport,
            run: &self.run,
            entry: None,
        }
    }

    async fn run(&self, container: &PreconditionContainer, store: &PreconditionStore) -> PreconditionResult {
        let ctx = self.ctx();
        container.run(store, &self.message, &self.command, &ctx).await
    }
}

#[tokio::test]
async fn test_nested_container_truth_table() {
    let fixture = Fixture::new();
    let container = PreconditionContainer::from_entries(vec![
        "A".into(),
        PreconditionEntry::Group(vec!["B".into(), "C".into()]),
    ]);

    for bits in 0..8u8 {
        let (a, b, c) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
        let store = PreconditionStore::new();
        store.register(Scripted::new("A", a));
        store.register(Scripted::new("B", b));
        store.register(Scripted::new("C", c));

        let result = fixture.run(&container, &store).await;
        assert_eq!(result.is_ok(), a && (b || c), "A={a} B={b} C={c}");

        if let Err(error) = result {
            // A fails first; otherwise OR reports its last failure.
            let expected = if !a { "A" } else { "C" };
            assert_eq!(error.identifier.as_str(), expected, "A={a} B={b} C={c}");
        }
    }
}

#[tokio::test]
async fn test_sequential_and_short_circuits() {
    let fixture = Fixture::new();
    let store = PreconditionStore::new();
    let first = Scripted::new("First", false);
    let second = Scripted::new("Second", true);
    store.register(first.clone());
    store.register(second.clone());

    let container = PreconditionContainer::from_entries(vec!["First".into(), "Second".into()]);
    let error = fixture.run(&container, &store).await.unwrap_err();

    assert_eq!(error.identifier.as_str(), "First");
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn test_sequential_or_stops_at_first_success() {
    let fixture = Fixture::new();
    let store = PreconditionStore::new();
    let first = Scripted::new("First", true);
    let second = Scripted::new("Second", false);
    store.register(first.clone());
    store.register(second.clone());

    let container = PreconditionContainer::composite(
        Mode::Or,
        RunStrategy::Sequential,
        vec!["First".into(), "Second".into()],
    );
    assert!(fixture.run(&container, &store).await.is_ok());
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn test_parallel_and_picks_declared_order() {
    let fixture = Fixture::new();
    let store = PreconditionStore::new();
    store.register(Scripted::delayed("X", false, Duration::from_millis(50)));
    store.register(Scripted::delayed("Y", false, Duration::from_millis(10)));

    let container = PreconditionContainer::composite(
        Mode::And,
        RunStrategy::Parallel,
        vec!["X".into(), "Y".into()],
    );
    let started = Instant::now();
    let error = fixture.run(&container, &store).await.unwrap_err();

    assert_eq!(error.identifier.as_str(), "X");
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn test_parallel_or_picks_last_declared_failure() {
    let fixture = Fixture::new();
    let store = PreconditionStore::new();
    store.register(Scripted::delayed("X", false, Duration::from_millis(10)));
    store.register(Scripted::delayed("Y", false, Duration::from_millis(50)));
    store.register(Scripted::delayed("Z", false, Duration::from_millis(1)));

    let container = PreconditionContainer::composite(
        Mode::Or,
        RunStrategy::Parallel,
        vec!["X".into(), "Y".into(), "Z".into()],
    );
    let error = fixture.run(&container, &store).await.unwrap_err();
    assert_eq!(error.identifier.as_str(), "Z");

    store.register(Scripted::delayed("Y", true, Duration::from_millis(50)));
    assert!(fixture.run(&container, &store).await.is_ok());
}

#[tokio::test]
async fn test_parallel_matches_sequential() {
    let fixture = Fixture::new();
    let entries = || vec!["P".into(), "Q".into(), PreconditionEntry::Group(vec!["R".into(), "S".into()])];

    for bits in 0..16u8 {
        let store = PreconditionStore::new();
        for (i, name) in ["P", "Q", "R", "S"].into_iter().enumerate() {
            store.register(Scripted::delayed(name, bits & (1 << i) != 0, Duration::from_millis(4 - i as u64)));
        }

        let sequential = PreconditionContainer::composite(Mode::And, RunStrategy::Sequential, entries());
        let parallel = PreconditionContainer::composite(Mode::And, RunStrategy::Parallel, entries());
        let s = fixture.run(&sequential, &store).await;
        let p = fixture.run(&parallel, &store).await;
        assert_eq!(s, p, "bits={bits:04b}");
    }
}

#[tokio::test]
async fn test_unregistered_leaf_is_unavailable() {
    let fixture = Fixture::new();
    let container = PreconditionContainer::from_entries(vec!["Ghost".into()]);
    let error = fixture.run(&container, &PreconditionStore::new()).await.unwrap_err();
    assert!(error.is(&Identifier::PreconditionUnavailable));
}

#[tokio::test]
async fn test_leaf_context_reaches_precondition() {
    let fixture = Fixture::new();
    let store = PreconditionStore::new();
    let cooldown = Scripted::new("Cooldown", true);
    store.register(cooldown.clone());

    let container = PreconditionContainer::from_entries(vec![
        PreconditionEntry::WithContext {
            name: "Cooldown".into(),
            context: serde_json::json!({ "delay": 5000 }),
        },
        "Cooldown".into(),
    ]);
    fixture.run(&container, &store).await.unwrap();

    assert_eq!(cooldown.contexts(), [Some(serde_json::json!({ "delay": 5000 })), None]);
}

/// Records the order global preconditions ran in.
struct Ordered {
    name: &'static str,
    position: i32,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Precondition for Ordered {
    fn name(&self) -> &str {
        self.name
    }

    fn position(&self) -> Option<i32> {
        Some(self.position)
    }

    async fn run(&self, _message: &Message, _command: &Command, _ctx: &PreconditionContext<'_>) -> PreconditionResult {
        self.log.lock().push(self.name);
        Ok(())
    }
}

#[tokio::test]
async fn test_globals_run_in_position_order() {
    let fixture = Fixture::new();
    let store = PreconditionStore::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    for (name, position) in [("c", 30), ("a", 10), ("d", 30), ("b", 20), ("first", -5)] {
        store.register(Arc::new(Ordered {
            name,
            position,
            log: log.clone(),
        }));
    }

    store.run_globals(&fixture.message, &fixture.command, &fixture.ctx()).await.unwrap();
    assert_eq!(*log.lock(), ["first", "a", "b", "c", "d"]);
}

/// Registers a failing position-0 global the first time it runs.
struct Registering {
    store: Arc<PreconditionStore>,
    done: AtomicBool,
}

#[async_trait]
impl Precondition for Registering {
    fn name(&self) -> &str {
        "Registering"
    }

    fn position(&self) -> Option<i32> {
        Some(5)
    }

    async fn run(&self, _message: &Message, _command: &Command, _ctx: &PreconditionContext<'_>) -> PreconditionResult {
        if !self.done.swap(true, Ordering::SeqCst) {
            self.store.register(Scripted::global("Latecomer", false, 0));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_global_snapshot_isolation() {
    let fixture = Fixture::new();
    let store = Arc::new(PreconditionStore::new());
    store.register(Arc::new(Registering {
        store: store.clone(),
        done: AtomicBool::new(false),
    }));

    // The in-flight evaluation does not see the precondition registered during it.
    assert!(store.run_globals(&fixture.message, &fixture.command, &fixture.ctx()).await.is_ok());
    assert_eq!(store.global_names(), ["Latecomer", "Registering"]);

    // The next one does.
    let error = store
        .run_globals(&fixture.message, &fixture.command, &fixture.ctx())
        .await
        .unwrap_err();
    assert_eq!(error.identifier.as_str(), "Latecomer");
}

#[tokio::test]
async fn test_appended_precondition_applies_to_later_dispatches() {
    let (client, _transport, _recorder) = common::client(common::config_with_prefix("!"));
    let gate = Scripted::new("Gate", false);
    client.register_precondition(gate.clone());

    let ping = client.commands().get("ping").unwrap();
    ping.append_precondition("Gate");

    let outcome = client.dispatch(Message::chat(PRIVATE_CHAT, "alice", "!ping")).await;
    assert!(matches!(outcome, jinsoul::dispatch::Outcome::Denied(ref e) if e.identifier.as_str() == "Gate"));
    assert_eq!(gate.calls(), 1);
}
