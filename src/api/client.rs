//! HTTP client for the room service.
//!
//! One method per endpoint. Each call is a single request translated into a
//! typed value or an [`SstError`]; there is no retry and no caching. The
//! session cookie issued by `temp-login` is kept in the client's cookie store
//! and sent on every later call.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::types::*;
use crate::config::ClientConfig;
use crate::error::{Result, SstError};

/// Status the backend uses for "message blocked by moderation".
pub const MODERATION_BLOCKED: u16 = 422;

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        // Builder failure falls back to a default client (no cookie store)
        // rather than panicking.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            base_url: config.base_url.clone(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// `POST /api/temp-login/`: create an ephemeral account for this session.
    pub async fn temp_login(&self, display_name: &str, role: Role) -> Result<Identity> {
        let url = self.url("/api/temp-login/");
        let req = self.http.post(&url).json(&TempLoginRequest { display_name, role });
        self.send_json(req, &url, "Failed to create temporary account").await
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// `GET /api/messages/?room=<code>`: transcript plus activity snapshot.
    pub async fn fetch_messages(&self, room_code: &str) -> Result<MessagesSnapshot> {
        let url = self.url("/api/messages/");
        let req = self.http.get(&url).query(&[("room", room_code)]);
        self.send_json(req, &url, "Failed to load messages").await
    }

    /// `POST /api/messages/?room=<code>`.
    ///
    /// A 422 is not an error: its body is the intervention that blocked the
    /// message and comes back as [`PostOutcome::Blocked`].
    pub async fn post_message(&self, room_code: &str, content: &str) -> Result<PostOutcome> {
        let url = self.url("/api/messages/");
        let resp = self
            .http
            .post(&url)
            .query(&[("room", room_code)])
            .json(&PostMessageRequest { content })
            .send()
            .await
            .map_err(|e| transport(&url, e))?;

        let status = resp.status();
        debug!(%url, status = status.as_u16(), "POST message");

        if status.as_u16() == MODERATION_BLOCKED {
            let bytes = resp.bytes().await.map_err(|e| transport(&url, e))?;
            let intervention = serde_json::from_slice::<Intervention>(&bytes).map_err(|e| {
                SstError::Decode {
                    what: "moderation rejection".into(),
                    detail: e.to_string(),
                }
            })?;
            return Ok(PostOutcome::Blocked(intervention));
        }

        if !status.is_success() {
            return Err(error_from_response(resp, "Failed to send").await);
        }

        let bytes = resp.bytes().await.map_err(|e| transport(&url, e))?;
        // The created message is informational only; an empty or odd body
        // still counts as accepted.
        let created = serde_json::from_slice::<CreatedMessage>(&bytes).unwrap_or_default();
        Ok(PostOutcome::Accepted(created))
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    /// `POST /api/rooms/` with `{action: "create", name}`.
    pub async fn create_room(&self, name: &str) -> Result<Room> {
        let url = self.url("/api/rooms/");
        let req = self.http.post(&url).json(&RoomAction::Create { name });
        self.send_json(req, &url, "Failed to create room").await
    }

    /// `POST /api/rooms/` with `{action: "join", code}`.
    pub async fn join_room(&self, code: &str) -> Result<Room> {
        let url = self.url("/api/rooms/");
        let req = self.http.post(&url).json(&RoomAction::Join { code });
        self.send_json(req, &url, "Failed to join room").await
    }

    /// `GET /api/rooms/<code>/`.
    pub async fn fetch_room(&self, code: &str) -> Result<RoomDetail> {
        let url = self.url(&format!("/api/rooms/{}/", encode_segment(code)));
        let req = self.http.get(&url);
        self.send_json(req, &url, "Failed to load room").await
    }

    /// `GET /api/rooms/<code>/members/`.
    pub async fn fetch_members(&self, code: &str) -> Result<Vec<Member>> {
        let url = self.url(&format!("/api/rooms/{}/members/", encode_segment(code)));
        let req = self.http.get(&url);
        self.send_json(req, &url, "Failed to load members").await
    }

    /// `POST /api/rooms/<code>/start-activity/`: move the room into the
    /// running state with the given template.
    pub async fn start_activity(&self, code: &str, activity_id: Option<u64>) -> Result<()> {
        let url = self.url(&format!("/api/rooms/{}/start-activity/", encode_segment(code)));
        let resp = self
            .http
            .post(&url)
            .json(&StartActivityRequest { activity_id })
            .send()
            .await
            .map_err(|e| transport(&url, e))?;
        debug!(%url, status = resp.status().as_u16(), "POST start-activity");
        if !resp.status().is_success() {
            return Err(error_from_response(resp, "Failed to start activity").await);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Activity catalogue
    // -----------------------------------------------------------------------

    /// `GET /api/activities/`.
    pub async fn list_activities(&self) -> Result<Vec<Activity>> {
        let url = self.url("/api/activities/");
        let req = self.http.get(&url);
        self.send_json(req, &url, "Failed to load activities").await
    }

    /// `GET /api/activities/<id>/`.
    pub async fn fetch_activity(&self, id: u64) -> Result<Activity> {
        let url = self.url(&format!("/api/activities/{id}/"));
        let req = self.http.get(&url);
        self.send_json(req, &url, "Failed to load activity").await
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
        context: &str,
    ) -> Result<T> {
        let resp = req.send().await.map_err(|e| transport(url, e))?;
        debug!(%url, status = resp.status().as_u16(), "response");

        if !resp.status().is_success() {
            return Err(error_from_response(resp, context).await);
        }

        let bytes = resp.bytes().await.map_err(|e| transport(url, e))?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| SstError::Decode {
            what: url.to_string(),
            detail: e.to_string(),
        })
    }
}

fn transport(url: &str, e: reqwest::Error) -> SstError {
    SstError::Transport {
        url: url.to_string(),
        detail: e.to_string(),
    }
}

/// Map a non-success response: a JSON `{detail}` body is surfaced verbatim,
/// anything else becomes "<context> (<status>)".
async fn error_from_response(resp: reqwest::Response, context: &str) -> SstError {
    #[derive(Deserialize)]
    struct Detail {
        detail: String,
    }

    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();

    match serde_json::from_str::<Detail>(&body) {
        Ok(d) if !d.detail.trim().is_empty() => SstError::Api {
            status,
            detail: d.detail,
        },
        _ => SstError::Status {
            status,
            context: context.to_string(),
            body,
        },
    }
}

/// Percent-encode a value for use as one URL path segment.
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
