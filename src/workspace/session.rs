//! Async driver for one workspace visit.
//!
//! One tokio task multiplexes three sources with `select!`: the reconciliation
//! poll, the countdown ticker, and user commands. Handlers run to completion
//! before the next event is taken, so state needs no locking. Dropping the
//! `run` future (or sending [`Command::Quit`]) tears everything down,
//! including any request still in flight.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::countdown::CountdownTimer;
use super::state::WorkspaceState;
use crate::api::{MessageApi, PostOutcome};
use crate::config::ClientConfig;
use crate::error::{Result, SstError};
use crate::modal::ModalInput;

/// Poll failures in a row after which logging escalates to `error!`.
const FAILURE_ESCALATION: u32 = 5;

/// User intents fed to a running workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the draft and submit it.
    Send(String),
    /// Resubmit the preserved draft after a failed send.
    Retry,
    /// "OK" on the intervention overlay.
    Dismiss,
    /// "Next (n)" on the intervention overlay.
    Next,
    /// "Why am I seeing this?" / "Back".
    ToggleWhy,
    Modal(ModalInput),
    /// Poll now instead of waiting for the next tick.
    Refresh,
    Quit,
}

/// Send one message outside a running workspace.
///
/// The room's current snapshot is fetched first so the same rules apply as in
/// the workspace: a blank draft or a finished activity is refused without a
/// post request.
pub async fn send_message<A: MessageApi>(api: &A, room_code: &str, content: &str) -> Result<PostOutcome> {
    let snapshot = api.fetch_messages(room_code).await?;
    let mut state = WorkspaceState::new(room_code, Utc::now());
    state.apply_snapshot(snapshot, Utc::now());
    state.set_input(content);
    if !state.can_submit() {
        return Err(SstError::Validation(
            "Activity has finished; the transcript is read-only".to_string(),
        ));
    }
    let Some(content) = state.pending_submission() else {
        return Err(SstError::Validation("Message is empty".to_string()));
    };
    let outcome = api.post_message(room_code, &content).await?;
    if let PostOutcome::Blocked(intervention) = &outcome {
        info!(room = %room_code, rule = %intervention.rule_name, "message blocked by moderation");
    }
    Ok(outcome)
}

pub struct WorkspaceSession<A> {
    api: A,
    state: WorkspaceState,
    poll_interval: Duration,
    countdown: CountdownTimer,
    clock: fn() -> DateTime<Utc>,
    consecutive_failures: u32,
}

impl<A: MessageApi> WorkspaceSession<A> {
    /// Open the workspace for `room_code`. The opening instant is taken now
    /// and bounds which interventions count as fresh.
    pub fn new(api: A, room_code: impl Into<String>, config: &ClientConfig) -> Self {
        Self::with_clock(api, room_code, config, Utc::now)
    }

    pub fn with_clock(
        api: A,
        room_code: impl Into<String>,
        config: &ClientConfig,
        clock: fn() -> DateTime<Utc>,
    ) -> Self {
        Self {
            api,
            state: WorkspaceState::new(room_code, clock()),
            poll_interval: config.poll_interval,
            countdown: CountdownTimer::new(config.tick_interval),
            clock,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    /// Run until `Quit` or until the command channel closes. `on_update` is
    /// called after the initial load and after every event that may have
    /// changed the view. Returns the final state.
    pub async fn run<F>(mut self, mut commands: mpsc::Receiver<Command>, mut on_update: F) -> WorkspaceState
    where
        F: FnMut(&WorkspaceState),
    {
        info!(room = %self.state.room_code(), "workspace opened");

        self.poll().await;
        on_update(&self.state);

        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll().await;
                }
                _ = self.countdown.tick() => {
                    let now = (self.clock)();
                    self.state.refresh_countdown(now);
                }
                cmd = commands.recv() => {
                    match cmd {
                        None | Some(Command::Quit) => break,
                        Some(cmd) => self.handle(cmd).await,
                    }
                }
            }
            on_update(&self.state);
        }

        info!(room = %self.state.room_code(), "workspace closed");
        self.state
    }

    /// Apply one command. `Quit` is a no-op here; `run` handles it.
    pub async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Send(text) => {
                self.state.set_input(text);
                self.submit().await;
            }
            Command::Retry => self.submit().await,
            Command::Dismiss => self.state.dismiss(),
            Command::Next => self.state.next(),
            Command::ToggleWhy => self.state.toggle_why(),
            Command::Modal(input) => self.state.handle_modal_input(input),
            Command::Refresh => self.poll().await,
            Command::Quit => {}
        }
    }

    /// One reconciliation pass. Failures are recorded on the state and the
    /// caller's loop simply tries again on the next tick.
    pub async fn poll(&mut self) {
        let room = self.state.room_code().to_string();
        match self.api.fetch_messages(&room).await {
            Ok(snapshot) => {
                self.consecutive_failures = 0;
                let now = (self.clock)();
                let report = self.state.apply_snapshot(snapshot, now);
                if self.countdown.sync(self.state.phase_ends_at()) {
                    debug!(room = %room, deadline = ?self.state.phase_ends_at(), "countdown re-armed");
                }
                if report.queued > 0 || report.phase_changed {
                    debug!(
                        room = %room,
                        queued = report.queued,
                        stale = report.stale,
                        phase = ?self.state.phase_index(),
                        "snapshot applied"
                    );
                }
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= FAILURE_ESCALATION {
                    error!(
                        error = %e,
                        room = %room,
                        consecutive_failures = self.consecutive_failures,
                        "workspace poll failed repeatedly, will retry next tick"
                    );
                } else {
                    warn!(error = %e, room = %room, "workspace poll failed, will retry next tick");
                }
                self.state.record_error(&e);
            }
        }
    }

    /// Submit the current draft. On acceptance an extra poll runs straight
    /// away so the new message shows without waiting for the ticker.
    pub async fn submit(&mut self) {
        let Some(content) = self.state.pending_submission() else {
            return;
        };
        let room = self.state.room_code().to_string();
        match self.api.post_message(&room, &content).await {
            Ok(PostOutcome::Accepted(created)) => {
                debug!(room = %room, id = ?created.id, "message accepted");
                self.state.on_submit_accepted();
                self.poll().await;
            }
            Ok(PostOutcome::Blocked(intervention)) => {
                info!(room = %room, rule = %intervention.rule_name, "message blocked by moderation");
                self.state.on_submit_blocked(intervention);
            }
            Err(e) => {
                warn!(error = %e, room = %room, "message send failed");
                self.state.on_submit_failed(&e);
            }
        }
    }
}
