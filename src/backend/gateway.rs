use std::collections::HashMap;
use std::io;
use std::io::ErrorKind;
use std::sync::Arc;
use std::thread;

use tracing::error;

use crate::backend::{Backend, BackendEvent, ChatMessage, Room, RoomSummary, message_preview};
use crate::event::AppEvent;

/// Requests the event loop hands to the backend worker. Resolution and
/// sending happen off-thread; completions come back as `BackendEvent`s on
/// the app event bus.
enum BackendRequest {
    OpenRoom { name: String, direct: bool },
    SendMessage { room_id: String, text: String },
}

pub struct BackendGateway {
    request_tx: flume::Sender<BackendRequest>,
}

impl BackendGateway {
    pub fn start(backend: Box<dyn Backend>, event_tx: flume::Sender<AppEvent>) -> Self {
        let (request_tx, request_rx) = flume::unbounded();

        thread::spawn(move || BackendWorker::run(backend, request_rx, event_tx));

        Self { request_tx }
    }

    pub fn open_room(&self, name: String, direct: bool) -> io::Result<()> {
        self.request_tx
            .send(BackendRequest::OpenRoom { name, direct })
            .map_err(|err| {
                error!(
                    "open_room failed: backend request channel is disconnected: {}",
                    err
                );
                io::Error::from(ErrorKind::BrokenPipe)
            })
    }

    pub fn send_message(&self, room_id: String, text: String) -> io::Result<()> {
        self.request_tx
            .send(BackendRequest::SendMessage { room_id, text })
            .map_err(|err| {
                error!(
                    "send_message failed: backend request channel is disconnected: {}",
                    err
                );
                io::Error::from(ErrorKind::BrokenPipe)
            })
    }
}

struct BackendWorker;

impl BackendWorker {
    fn run(
        backend: Box<dyn Backend>,
        request_rx: flume::Receiver<BackendRequest>,
        event_tx: flume::Sender<AppEvent>,
    ) {
        let mut open_rooms: HashMap<String, Arc<dyn Room>> = HashMap::new();

        while let Ok(request) = request_rx.recv() {
            let event = match request {
                BackendRequest::OpenRoom { name, direct } => {
                    let room = if direct {
                        backend.get_direct_by_name(&name)
                    } else {
                        backend.get_room_by_name(&name)
                    };
                    match room {
                        Some(room) => {
                            let summary = summarize(room.as_ref());
                            open_rooms.insert(summary.id.clone(), room);
                            BackendEvent::RoomOpened(summary)
                        }
                        None => BackendEvent::RoomNotFound { name, direct },
                    }
                }
                BackendRequest::SendMessage { room_id, text } => {
                    let result = match open_rooms.get(&room_id) {
                        Some(room) => room.send_message(&text),
                        None => {
                            error!("send requested for unopened room: {}", room_id);
                            continue;
                        }
                    };
                    match result {
                        Ok(()) => continue,
                        Err(err) => {
                            error!("message send failed: room={} error={}", room_id, err);
                            BackendEvent::SendFailed {
                                room_id,
                                preview: message_preview(&text),
                            }
                        }
                    }
                }
            };

            if event_tx.send(AppEvent::Backend(event)).is_err() {
                return;
            }
        }
    }
}

fn summarize(room: &dyn Room) -> RoomSummary {
    let id = room.id();
    let name = room.alias().or_else(|| room.name()).unwrap_or_else(|| id.clone());
    let mut backlog = Vec::new();
    room.for_each_message(&mut |message| {
        backlog.push(ChatMessage {
            speaker: message.speaker().display_name(),
            text: message.text(),
            created_ms: message.created(),
        });
    });
    RoomSummary {
        id,
        name,
        members: room.members(),
        backlog,
    }
}
