pub mod gateway;
pub mod local;

use std::sync::Arc;

use thiserror::Error;

use crate::event::AppEvent;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("send failed: {0}")]
    Send(String),
}

pub trait User: Send + Sync {
    fn id(&self) -> String;
    fn display_name(&self) -> String;
}

pub trait Message: Send + Sync {
    fn speaker(&self) -> &dyn User;
    fn text(&self) -> String;
    fn created(&self) -> u64;
}

/// A joined room or direct conversation on the chat service.
pub trait Room: Send + Sync {
    fn id(&self) -> String;
    fn alias(&self) -> Option<String>;
    fn name(&self) -> Option<String>;
    fn for_each_message(&self, visitor: &mut dyn FnMut(&dyn Message));
    fn send_message(&self, text: &str) -> Result<(), BackendError>;
    fn members(&self) -> Vec<String>;
}

/// Adapter contract. Implementations resolve rooms synchronously on the
/// gateway worker thread and post asynchronous events (connected, incoming
/// messages) onto the app event bus they were constructed with.
pub trait Backend: Send {
    fn get_room_by_name(&self, name: &str) -> Option<Arc<dyn Room>>;
    fn get_direct_by_name(&self, user: &str) -> Option<Arc<dyn Room>>;
}

/// Completion events posted by the gateway worker and by adapters.
#[derive(Debug)]
pub enum BackendEvent {
    Connected { user: String },
    Reconnected,
    RoomOpened(RoomSummary),
    RoomNotFound { name: String, direct: bool },
    MessageReceived { room_id: String, message: ChatMessage },
    SendFailed { room_id: String, preview: String },
}

#[derive(Debug)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub backlog: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub speaker: String,
    pub text: String,
    pub created_ms: u64,
}

/// Constructs the adapter selected by the account config.
pub fn connect(
    protocol: &str,
    auth: &serde_json::Value,
    event_tx: flume::Sender<AppEvent>,
) -> Result<Box<dyn Backend>, BackendError> {
    match protocol {
        "local" => Ok(Box::new(local::LocalBackend::new(auth, event_tx))),
        other => Err(BackendError::UnsupportedProtocol(other.to_string())),
    }
}

pub fn known_protocols() -> &'static [&'static str] {
    &["local"]
}

/// Preview used in send-failure log lines: long messages are cut to 15
/// characters plus an ellipsis.
pub fn message_preview(text: &str) -> String {
    let count = text.chars().count();
    if count <= 18 {
        return text.to_string();
    }
    let head: String = text.chars().take(15).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::message_preview;

    #[test]
    fn short_messages_should_pass_through_unchanged() {
        assert_eq!(message_preview("hello"), "hello");
        assert_eq!(message_preview("exactly eighteen!!"), "exactly eighteen!!");
    }

    #[test]
    fn long_messages_should_truncate_to_fifteen_plus_ellipsis() {
        let preview = message_preview("this is a rather long message");
        assert_eq!(preview, "this is a rathe...");
    }
}
