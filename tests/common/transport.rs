//! Recording transport.

use async_trait::async_trait;
use jinsoul::{ChatKind, Message, Transport, TransportError};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Transport that records replies and typing calls.
pub struct MockTransport {
    chats: Mutex<HashMap<String, ChatKind>>,
    read_only: Mutex<HashSet<String>>,
    replies: Mutex<Vec<(String, String)>>,
    typing: Mutex<Vec<String>>,
    fail_typing: AtomicBool,
    typing_seen: Notify,
}

#[allow(dead_code)]
impl MockTransport {
    /// Knows [`super::PRIVATE_CHAT`] and [`super::GROUP_CHAT`].
    pub fn new() -> Self {
        let chats = HashMap::from([
            (super::PRIVATE_CHAT.to_string(), ChatKind::Private),
            (super::GROUP_CHAT.to_string(), ChatKind::Group),
        ]);
        Self {
            chats: Mutex::new(chats),
            read_only: Mutex::new(HashSet::new()),
            replies: Mutex::new(Vec::new()),
            typing: Mutex::new(Vec::new()),
            fail_typing: AtomicBool::new(false),
            typing_seen: Notify::new(),
        }
    }

    pub fn add_chat(&self, chat_id: &str, kind: ChatKind) {
        self.chats.lock().insert(chat_id.to_string(), kind);
    }

    /// Add a group chat the bot cannot post in.
    pub fn add_read_only_chat(&self, chat_id: &str) {
        self.add_chat(chat_id, ChatKind::Group);
        self.read_only.lock().insert(chat_id.to_string());
    }

    pub fn fail_typing(&self, fail: bool) {
        self.fail_typing.store(fail, Ordering::SeqCst);
    }

    /// `(chat_id, text)` pairs, in order.
    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().clone()
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies.lock().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn typing_calls(&self) -> Vec<String> {
        self.typing.lock().clone()
    }

    /// Wait until at least `count` typing calls were made.
    pub async fn wait_for_typing(&self, count: usize) -> bool {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let notified = self.typing_seen.notified();
                if self.typing.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn chat_kind(&self, message: &Message) -> Result<ChatKind, TransportError> {
        self.chats
            .lock()
            .get(&message.chat_id)
            .copied()
            .ok_or_else(|| TransportError::ChatNotFound(message.chat_id.clone()))
    }

    async fn is_read_only(&self, message: &Message) -> Result<bool, TransportError> {
        Ok(self.read_only.lock().contains(&message.chat_id))
    }

    async fn reply(&self, message: &Message, text: &str) -> Result<(), TransportError> {
        self.replies
            .lock()
            .push((message.chat_id.clone(), text.to_string()));
        Ok(())
    }

    async fn set_typing(&self, message: &Message) -> Result<(), TransportError> {
        self.typing.lock().push(message.chat_id.clone());
        self.typing_seen.notify_waiters();
        if self.fail_typing.load(Ordering::SeqCst) {
            Err(TransportError::Other("typing unavailable".into()))
        } else {
            Ok(())
        }
    }
}
