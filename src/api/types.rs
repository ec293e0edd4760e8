//! Wire types for the Social Study Teammates REST API.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Explicit `null` decodes the same as a missing field.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn null_as_now<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DateTime<Utc>>::deserialize(d)?.unwrap_or_else(Utc::now))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Facilitator,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Learner => write!(f, "learner"),
            Role::Facilitator => write!(f, "facilitator"),
        }
    }
}

/// Ephemeral account returned by `POST /api/temp-login/`.
///
/// `created_at` is not part of the server response; login stamps it before
/// the identity is persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TempLoginRequest<'a> {
    pub display_name: &'a str,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// `GET /api/rooms/<code>/`: the room plus its embedded activity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDetail {
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub activity: Option<ActivityState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub(crate) enum RoomAction<'a> {
    Create { name: &'a str },
    Join { code: &'a str },
}

#[derive(Debug, Serialize)]
pub(crate) struct StartActivityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Activity run state
// ---------------------------------------------------------------------------

/// Server-owned snapshot of a room's activity run. Replaced wholesale on
/// every poll, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_running: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub finished: bool,
    #[serde(default)]
    pub activity_id: Option<u64>,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub phase_index: Option<u32>,
    #[serde(default)]
    pub phase_name: Option<String>,
    #[serde(default)]
    pub phase_prompt: Option<String>,
    /// Absolute RFC 3339 deadline of the current phase. Kept as the raw
    /// string so that "deadline changed" compares exactly what the server sent.
    #[serde(default)]
    pub phase_ends_at: Option<String>,
    #[serde(default)]
    pub total_phases: Option<u32>,
    #[serde(default)]
    pub activity_run_id: Option<String>,
}

impl ActivityState {
    /// Header label: "Finished", the phase name, or "Lobby" before the first phase.
    pub fn phase_label(&self) -> &str {
        if self.finished {
            "Finished"
        } else {
            self.phase_name.as_deref().unwrap_or("Lobby")
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub phase_index: Option<u32>,
    /// Non-blocking annotation: the post makes a claim without evidence.
    #[serde(default, deserialize_with = "null_as_default")]
    pub lacks_evidence: bool,
}

/// A moderation event. Polled interventions carry every field; the body of a
/// 422 rejection may omit `author` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: u64,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rule_name: String,
    #[serde(default = "Utc::now", deserialize_with = "null_as_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub phase_index: Option<u32>,
}

/// One transcript entry, tagged on `type`. Ids are only unique per variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageItem {
    Post(Post),
    Intervention(Intervention),
}

impl MessageItem {
    pub fn id(&self) -> u64 {
        match self {
            MessageItem::Post(p) => p.id,
            MessageItem::Intervention(i) => i.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            MessageItem::Post(p) => p.created_at,
            MessageItem::Intervention(i) => i.created_at,
        }
    }
}

/// `GET /api/messages/?room=<code>`: transcript plus activity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub room: String,
    #[serde(default)]
    pub phase_index: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activity: ActivityState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<MessageItem>,
}

impl MessagesSnapshot {
    /// Split the transcript into posts and interventions, preserving order.
    pub fn partition(self) -> (Vec<Post>, Vec<Intervention>) {
        let mut posts = Vec::new();
        let mut interventions = Vec::new();
        for item in self.messages {
            match item {
                MessageItem::Post(p) => posts.push(p),
                MessageItem::Intervention(i) => interventions.push(i),
            }
        }
        (posts, interventions)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PostMessageRequest<'a> {
    pub content: &'a str,
}

/// Body of a successful `POST /api/messages/`. Only the id is relied on; the
/// transcript itself is refreshed by the follow-up poll.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreatedMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Result of submitting a chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    Accepted(CreatedMessage),
    /// HTTP 422: moderation blocked the message; the body is the intervention.
    Blocked(Intervention),
}

// ---------------------------------------------------------------------------
// Activity catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_limit_minutes: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub turn_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    ProblemSolving,
    Discussion,
    DesignCritique,
    Other(String),
}

impl From<String> for ActivityType {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "problem-solving" | "problem solving" => ActivityType::ProblemSolving,
            "discussion" => ActivityType::Discussion,
            "design critique" | "design-critique" => ActivityType::DesignCritique,
            _ => ActivityType::Other(s),
        }
    }
}

impl From<ActivityType> for String {
    fn from(t: ActivityType) -> Self {
        t.as_str().to_string()
    }
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::ProblemSolving => "problem-solving",
            ActivityType::Discussion => "discussion",
            ActivityType::DesignCritique => "design critique",
            ActivityType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An activity template: ordered phases a facilitator attaches to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub activity_type: ActivityType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_item_decodes_both_variants() {
        let items: Vec<MessageItem> = serde_json::from_value(json!([
            {"type": "post", "id": 1, "content": "hi", "author": "ana",
             "created_at": "2026-03-01T10:00:00Z", "phase_index": 0},
            {"type": "intervention", "id": 1, "content": "slow down", "author": "Socratic Agent",
             "explanation": "why", "rule_name": "tone",
             "created_at": "2026-03-01T10:00:05+00:00", "phase_index": null}
        ]))
        .unwrap();
        assert!(matches!(&items[0], MessageItem::Post(p) if !p.lacks_evidence));
        assert!(matches!(&items[1], MessageItem::Intervention(i) if i.rule_name == "tone"));
        assert_eq!(items[0].id(), items[1].id());
    }

    #[test]
    fn post_lacks_evidence_flag() {
        let item: MessageItem = serde_json::from_value(json!({
            "type": "post", "id": 4, "content": "cats are best", "author": "bo",
            "created_at": "2026-03-01T10:00:00Z", "lacks_evidence": true
        }))
        .unwrap();
        match item {
            MessageItem::Post(p) => assert!(p.lacks_evidence),
            other => panic!("expected post, got {other:?}"),
        }
    }

    #[test]
    fn rejection_body_without_author_or_timestamp_decodes() {
        let i: Intervention = serde_json::from_value(json!({
            "id": 9, "content": "Please rephrase", "explanation": "harsh language",
            "rule_name": "tone"
        }))
        .unwrap();
        assert_eq!(i.id, 9);
        assert!(i.author.is_empty());
    }

    #[test]
    fn snapshot_tolerates_missing_activity_fields() {
        let snap: MessagesSnapshot = serde_json::from_value(json!({
            "room": "ABC123",
            "phase_index": null,
            "activity": {"is_running": false, "finished": false,
                         "activity_id": null, "activity_name": null},
            "messages": []
        }))
        .unwrap();
        assert_eq!(snap.activity.phase_ends_at, None);
        assert_eq!(snap.activity.phase_label(), "Lobby");
    }

    #[test]
    fn explicit_nulls_decode_as_defaults() {
        let snap: MessagesSnapshot = serde_json::from_value(json!({
            "room": "ABC123",
            "phase_index": null,
            "activity": {"is_running": null, "finished": null, "phase_name": null},
            "messages": [
                {"type": "post", "id": 1, "content": "hi", "author": "ana",
                 "created_at": "2026-03-01T10:00:00Z", "lacks_evidence": null},
                {"type": "intervention", "id": 2, "content": "evidence?", "author": null,
                 "explanation": null, "rule_name": null, "created_at": null}
            ]
        }))
        .unwrap();
        assert!(!snap.activity.is_running);
        assert!(!snap.activity.finished);
        let (posts, interventions) = snap.partition();
        assert!(!posts[0].lacks_evidence);
        assert!(interventions[0].author.is_empty());
        assert!(interventions[0].explanation.is_empty());
        assert!(interventions[0].rule_name.is_empty());
    }

    #[test]
    fn null_activity_and_messages_decode_as_empty() {
        let snap: MessagesSnapshot =
            serde_json::from_value(json!({"room": null, "activity": null, "messages": null})).unwrap();
        assert_eq!(snap.room, "");
        assert_eq!(snap.activity, ActivityState::default());
        assert!(snap.messages.is_empty());
    }

    #[test]
    fn phase_label_prefers_finished() {
        let state = ActivityState {
            finished: true,
            phase_name: Some("Debate".into()),
            ..Default::default()
        };
        assert_eq!(state.phase_label(), "Finished");
    }

    #[test]
    fn partition_keeps_arrival_order() {
        let snap: MessagesSnapshot = serde_json::from_value(json!({
            "room": "R",
            "messages": [
                {"type": "intervention", "id": 2, "content": "b", "author": "x",
                 "explanation": "", "rule_name": "r", "created_at": "2026-03-01T10:00:01Z"},
                {"type": "post", "id": 1, "content": "a", "author": "y",
                 "created_at": "2026-03-01T10:00:00Z"},
                {"type": "intervention", "id": 1, "content": "c", "author": "x",
                 "explanation": "", "rule_name": "r", "created_at": "2026-03-01T10:00:02Z"}
            ]
        }))
        .unwrap();
        let (posts, interventions) = snap.partition();
        assert_eq!(posts.len(), 1);
        assert_eq!(interventions.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn activity_type_known_and_other() {
        assert_eq!(ActivityType::from("problem-solving".to_string()), ActivityType::ProblemSolving);
        assert_eq!(ActivityType::from("Design Critique".to_string()), ActivityType::DesignCritique);
        assert_eq!(
            ActivityType::from("jigsaw".to_string()),
            ActivityType::Other("jigsaw".to_string())
        );
        assert_eq!(serde_json::to_string(&ActivityType::DesignCritique).unwrap(), "\"design critique\"");
    }

    #[test]
    fn room_action_serializes_with_action_tag() {
        let create = serde_json::to_value(RoomAction::Create { name: "Bio 101" }).unwrap();
        assert_eq!(create, json!({"action": "create", "name": "Bio 101"}));
        let join = serde_json::to_value(RoomAction::Join { code: "AB12CD" }).unwrap();
        assert_eq!(join, json!({"action": "join", "code": "AB12CD"}));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Facilitator).unwrap(), "\"facilitator\"");
        assert_eq!(Role::Learner.to_string(), "learner");
    }
}
