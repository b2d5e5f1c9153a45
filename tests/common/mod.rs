//! Integration test common infrastructure.
//!
//! Provides a recording transport, an event recorder, scriptable
//! preconditions, and a helper that wires them into a client.

pub mod precondition;
pub mod recorder;
pub mod transport;

#[allow(unused_imports)]
pub use precondition::Scripted;
#[allow(unused_imports)]
pub use recorder::Recorder;
#[allow(unused_imports)]
pub use transport::MockTransport;

use jinsoul::Client;
use jinsoul::commands::misc;
use jinsoul::config::Config;
use std::sync::Arc;

/// Chat ids the mock transport knows about.
#[allow(dead_code)]
pub const PRIVATE_CHAT: &str = "private-chat";
#[allow(dead_code)]
pub const GROUP_CHAT: &str = "group-chat";

/// A client with the stock commands, a mock transport and a recorder on every event.
#[allow(dead_code)]
pub fn client(config: Config) -> (Client, Arc<MockTransport>, Arc<Recorder>) {
    let transport = Arc::new(MockTransport::new());
    let client = Client::new(config, transport.clone()).expect("valid config");
    for (options, handler) in misc::all() {
        client.register(options, handler).expect("stock command registers");
    }
    let recorder = Recorder::attach(client.bus());
    (client, transport, recorder)
}

/// Config with a single literal prefix.
#[allow(dead_code)]
pub fn config_with_prefix(prefix: &str) -> Config {
    let mut config = Config::default();
    config.client.default_prefix = prefix.into();
    config
}
