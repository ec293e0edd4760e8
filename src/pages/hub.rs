//! Rooms hub: create or join a room through a modal.

use tracing::info;

use crate::api::{ApiClient, Room};
use crate::error::{Result, SstError};
use crate::modal::{Modal, ModalInput};
use crate::router::{normalize_code, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubModal {
    Create,
    Join,
}

impl HubModal {
    pub fn title(self) -> &'static str {
        match self {
            HubModal::Create => "Create Room",
            HubModal::Join => "Join Room",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            HubModal::Create => "Room name:",
            HubModal::Join => "Room code:",
        }
    }
}

/// Hub view state. Remembers rooms created or joined during this run.
#[derive(Debug, Default)]
pub struct RoomsHub {
    modal: Modal,
    kind: Option<HubModal>,
    rooms: Vec<Room>,
    created_code: Option<String>,
    error: Option<String>,
}

impl RoomsHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, kind: HubModal) {
        self.kind = Some(kind);
        self.error = None;
        self.modal.open();
    }

    pub fn handle_modal(&mut self, input: ModalInput) {
        if self.modal.handle(input) {
            self.kind = None;
        }
    }

    /// The modal currently open, if any.
    pub fn active_modal(&self) -> Option<HubModal> {
        if self.modal.is_open() {
            self.kind
        } else {
            None
        }
    }

    /// Submit the open modal's input. On success the modal closes and the
    /// room's dashboard route is returned; on failure the modal stays open
    /// with the error recorded.
    pub async fn submit(&mut self, api: &ApiClient, input: &str) -> Option<Route> {
        let kind = self.active_modal()?;
        let result = match kind {
            HubModal::Create => create_room(api, input).await,
            HubModal::Join => join_room(api, input).await,
        };
        match result {
            Ok(room) => {
                if kind == HubModal::Create {
                    self.created_code = Some(room.code.clone());
                }
                let route = Route::Dashboard {
                    code: room.code.clone(),
                };
                self.remember(room);
                self.modal.close();
                self.kind = None;
                self.error = None;
                Some(route)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    fn remember(&mut self, room: Room) {
        self.rooms.retain(|r| r.code != room.code);
        self.rooms.push(room);
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Join code of the most recently created room, for sharing.
    pub fn created_code(&self) -> Option<&str> {
        self.created_code.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub async fn create_room(api: &ApiClient, name: &str) -> Result<Room> {
    let room = api.create_room(name.trim()).await?;
    info!(code = %room.code, name = %room.name, "room created");
    Ok(room)
}

/// Join by code. The code is trimmed and upper-cased first; an empty code is
/// rejected without a request.
pub async fn join_room(api: &ApiClient, code: &str) -> Result<Room> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(SstError::Validation("Room code is required".to_string()));
    }
    let room = api.join_room(&code).await?;
    info!(code = %room.code, "room joined");
    Ok(room)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_open_and_escape() {
        let mut hub = RoomsHub::new();
        assert_eq!(hub.active_modal(), None);
        hub.open(HubModal::Join);
        assert_eq!(hub.active_modal(), Some(HubModal::Join));
        hub.handle_modal(ModalInput::ContentClick);
        assert_eq!(hub.active_modal(), Some(HubModal::Join));
        hub.handle_modal(ModalInput::Escape);
        assert_eq!(hub.active_modal(), None);
    }

    #[test]
    fn remember_dedupes_by_code() {
        let mut hub = RoomsHub::new();
        hub.remember(Room { code: "A".into(), name: "one".into() });
        hub.remember(Room { code: "B".into(), name: "two".into() });
        hub.remember(Room { code: "A".into(), name: "one again".into() });
        let codes: Vec<_> = hub.rooms().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn submit_without_modal_does_nothing() {
        let api = ApiClient::new(&crate::config::ClientConfig::default().base_url("http://127.0.0.1:9"));
        let mut hub = RoomsHub::new();
        assert_eq!(hub.submit(&api, "ABC").await, None);
        assert_eq!(hub.error(), None);
    }

    #[tokio::test]
    async fn empty_join_code_is_rejected_locally() {
        let api = ApiClient::new(&crate::config::ClientConfig::default().base_url("http://127.0.0.1:9"));
        let err = join_room(&api, "   ").await.unwrap_err();
        assert!(matches!(err, SstError::Validation(_)));
    }
}
