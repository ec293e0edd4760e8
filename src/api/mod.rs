//! REST API client and wire types.
//!
//! The polling views only need a slice of the API, expressed by the
//! [`MessageApi`] and [`RoomApi`] traits so they can be driven by in-memory
//! fakes in tests.

use std::future::Future;

pub mod client;
pub mod types;

pub use client::{ApiClient, MODERATION_BLOCKED};
pub use types::*;

use crate::error::Result;

/// Endpoints the activity workspace polls and posts to.
pub trait MessageApi {
    fn fetch_messages(&self, room_code: &str)
        -> impl Future<Output = Result<MessagesSnapshot>> + Send;

    fn post_message(
        &self,
        room_code: &str,
        content: &str,
    ) -> impl Future<Output = Result<PostOutcome>> + Send;
}

/// Endpoints the room dashboard polls and drives.
pub trait RoomApi {
    fn fetch_room(&self, code: &str) -> impl Future<Output = Result<RoomDetail>> + Send;

    fn fetch_members(&self, code: &str) -> impl Future<Output = Result<Vec<Member>>> + Send;

    fn start_activity(
        &self,
        code: &str,
        activity_id: Option<u64>,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl MessageApi for ApiClient {
    async fn fetch_messages(&self, room_code: &str) -> Result<MessagesSnapshot> {
        ApiClient::fetch_messages(self, room_code).await
    }

    async fn post_message(&self, room_code: &str, content: &str) -> Result<PostOutcome> {
        ApiClient::post_message(self, room_code, content).await
    }
}

impl RoomApi for ApiClient {
    async fn fetch_room(&self, code: &str) -> Result<RoomDetail> {
        ApiClient::fetch_room(self, code).await
    }

    async fn fetch_members(&self, code: &str) -> Result<Vec<Member>> {
        ApiClient::fetch_members(self, code).await
    }

    async fn start_activity(&self, code: &str, activity_id: Option<u64>) -> Result<()> {
        ApiClient::start_activity(self, code, activity_id).await
    }
}
