//! Room dashboard: members, activity status, and the matching call to action.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::api::{Member, Role, RoomApi, RoomDetail};
use crate::config::ClientConfig;
use crate::error::{Result, SstError};
use crate::router::Route;

/// What the dashboard offers next, derived from the room's activity snapshot
/// and the locally stored template choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cta {
    NoActivitySelected,
    SelectedNotStarted { activity_id: u64 },
    Running,
    Finished,
}

impl Cta {
    pub fn derive(room: Option<&RoomDetail>, selected: Option<u64>) -> Cta {
        let activity = room.and_then(|r| r.activity.as_ref());
        match (activity, selected) {
            (Some(a), _) if a.finished => Cta::Finished,
            (Some(a), _) if a.is_running => Cta::Running,
            (_, Some(activity_id)) => Cta::SelectedNotStarted { activity_id },
            _ => Cta::NoActivitySelected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    code: String,
    room: Option<RoomDetail>,
    members: Vec<Member>,
    selected_activity: Option<u64>,
    error: Option<String>,
}

impl DashboardState {
    pub fn new(code: impl Into<String>, selected_activity: Option<u64>) -> Self {
        Self {
            code: code.into(),
            room: None,
            members: Vec::new(),
            selected_activity,
            error: None,
        }
    }

    pub fn apply_room(&mut self, room: RoomDetail) {
        self.room = Some(room);
    }

    pub fn apply_members(&mut self, members: Vec<Member>) {
        self.members = members;
    }

    pub fn record_error(&mut self, err: &SstError) {
        self.error = Some(err.to_string());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn cta(&self) -> Cta {
        Cta::derive(self.room.as_ref(), self.selected_activity)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn room(&self) -> Option<&RoomDetail> {
        self.room.as_ref()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn selected_activity(&self) -> Option<u64> {
        self.selected_activity
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardCommand {
    /// Go to the activity catalogue.
    SelectActivity,
    /// Facilitator only: start the selected activity.
    Start,
    OpenWorkspace,
    Refresh,
    Back,
    Quit,
}

/// Start `activity_id` in room `code` on behalf of a user with `role`.
///
/// Only facilitators may start, and only once a template is selected; both
/// checks run before any request is made.
pub async fn start_activity<A: RoomApi>(
    api: &A,
    role: Option<Role>,
    code: &str,
    activity_id: Option<u64>,
) -> Result<u64> {
    if role != Some(Role::Facilitator) {
        return Err(SstError::Validation(
            "Only facilitators can start an activity".to_string(),
        ));
    }
    let Some(activity_id) = activity_id else {
        return Err(SstError::Validation("Select an activity first".to_string()));
    };
    api.start_activity(code, Some(activity_id)).await?;
    info!(room = %code, activity_id, "activity started");
    Ok(activity_id)
}

pub struct DashboardSession<A> {
    api: A,
    state: DashboardState,
    role: Option<Role>,
    poll_interval: Duration,
}

impl<A: RoomApi> DashboardSession<A> {
    pub fn new(
        api: A,
        code: impl Into<String>,
        selected_activity: Option<u64>,
        role: Option<Role>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            api,
            state: DashboardState::new(code, selected_activity),
            role,
            poll_interval: config.poll_interval,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Poll until a command navigates away. Returns the next route, or
    /// `None` on quit / closed channel.
    pub async fn run<F>(mut self, mut commands: mpsc::Receiver<DashboardCommand>, mut on_update: F) -> Option<Route>
    where
        F: FnMut(&DashboardState),
    {
        self.poll().await;
        on_update(&self.state);

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll().await,
                cmd = commands.recv() => {
                    let code = self.state.code().to_string();
                    match cmd {
                        None | Some(DashboardCommand::Quit) => return None,
                        Some(DashboardCommand::Back) => return Some(Route::RoomsHub),
                        Some(DashboardCommand::SelectActivity) => return Some(Route::Catalogue { code }),
                        Some(DashboardCommand::OpenWorkspace) => return Some(Route::Workspace { code }),
                        Some(DashboardCommand::Start) => self.start().await,
                        Some(DashboardCommand::Refresh) => self.poll().await,
                    }
                }
            }
            on_update(&self.state);
        }
    }

    /// Fetch room detail and members. Each half fails independently.
    pub async fn poll(&mut self) {
        let code = self.state.code().to_string();
        let mut failed = false;

        match self.api.fetch_room(&code).await {
            Ok(room) => self.state.apply_room(room),
            Err(e) => {
                warn!(error = %e, room = %code, "room poll failed");
                self.state.record_error(&e);
                failed = true;
            }
        }
        match self.api.fetch_members(&code).await {
            Ok(members) => self.state.apply_members(members),
            Err(e) => {
                warn!(error = %e, room = %code, "member poll failed");
                self.state.record_error(&e);
                failed = true;
            }
        }
        if !failed {
            self.state.clear_error();
        }
    }

    /// Start the selected activity, then refresh so the CTA moves to Running.
    pub async fn start(&mut self) {
        let code = self.state.code().to_string();
        match start_activity(&self.api, self.role, &code, self.state.selected_activity()).await {
            Ok(_) => self.poll().await,
            Err(e) => {
                warn!(error = %e, room = %code, "start activity failed");
                self.state.record_error(&e);
            }
        }
    }
}
