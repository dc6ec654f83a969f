use std::sync::Arc;

use tracing::info;

use crate::backend::{Backend, BackendError, BackendEvent, ChatMessage, Message, Room, User};
use crate::event::AppEvent;

/// Loopback adapter. Every room exists, holds the local user and an `echo`
/// peer that repeats whatever is sent. Keeps the client fully functional
/// without a network account, and gives the tests a deterministic backend.
pub struct LocalBackend {
    user: String,
    event_tx: flume::Sender<AppEvent>,
}

impl LocalBackend {
    pub fn new(auth: &serde_json::Value, event_tx: flume::Sender<AppEvent>) -> Self {
        let user = auth
            .get("user")
            .and_then(|value| value.as_str())
            .unwrap_or("me")
            .to_string();
        info!("local backend ready: user={}", user);
        let _ = event_tx.send(AppEvent::Backend(BackendEvent::Connected {
            user: user.clone(),
        }));
        Self { user, event_tx }
    }

    fn room(&self, id: String, name: String) -> Arc<dyn Room> {
        Arc::new(EchoRoom {
            id,
            name,
            user: self.user.clone(),
            event_tx: self.event_tx.clone(),
        })
    }
}

impl Backend for LocalBackend {
    fn get_room_by_name(&self, name: &str) -> Option<Arc<dyn Room>> {
        Some(self.room(format!("!{name}"), name.to_string()))
    }

    fn get_direct_by_name(&self, user: &str) -> Option<Arc<dyn Room>> {
        Some(self.room(format!("@{user}"), user.to_string()))
    }
}

struct EchoRoom {
    id: String,
    name: String,
    user: String,
    event_tx: flume::Sender<AppEvent>,
}

impl Room for EchoRoom {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn alias(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn for_each_message(&self, visitor: &mut dyn FnMut(&dyn Message)) {
        let greeting = EchoMessage {
            speaker: EchoUser {
                name: "echo".to_string(),
            },
            text: format!("joined {}", self.name),
            created_ms: 0,
        };
        visitor(&greeting);
    }

    fn send_message(&self, text: &str) -> Result<(), BackendError> {
        for speaker in [self.user.as_str(), "echo"] {
            let event = BackendEvent::MessageReceived {
                room_id: self.id.clone(),
                message: ChatMessage {
                    speaker: speaker.to_string(),
                    text: text.to_string(),
                    created_ms: 0,
                },
            };
            self.event_tx
                .send(AppEvent::Backend(event))
                .map_err(|err| BackendError::Send(err.to_string()))?;
        }
        Ok(())
    }

    fn members(&self) -> Vec<String> {
        vec![self.user.clone(), "echo".to_string()]
    }
}

struct EchoUser {
    name: String,
}

impl User for EchoUser {
    fn id(&self) -> String {
        format!("@{}", self.name)
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

struct EchoMessage {
    speaker: EchoUser,
    text: String,
    created_ms: u64,
}

impl Message for EchoMessage {
    fn speaker(&self) -> &dyn User {
        &self.speaker
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn created(&self) -> u64 {
        self.created_ms
    }
}
