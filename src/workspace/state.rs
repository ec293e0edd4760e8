//! Workspace view state and the snapshot reconciliation rules.
//!
//! Everything here is synchronous and clock-explicit: callers pass `now`, so
//! the rules can be exercised without a runtime or a server.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};

use super::countdown::countdown_for;
use crate::api::{ActivityState, Intervention, MessagesSnapshot, Post};
use crate::error::SstError;
use crate::modal::ModalInput;

/// What one snapshot application changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Interventions appended to the queue by this snapshot.
    pub queued: usize,
    /// Interventions skipped because they predate the workspace opening.
    pub stale: usize,
    pub phase_changed: bool,
}

/// State of one workspace visit for one room.
///
/// The seen-intervention set lives and dies with this value: opening the
/// workspace again (or for another room) starts from an empty set and a new
/// `opened_at`.
#[derive(Debug, Clone)]
pub struct WorkspaceState {
    room_code: String,
    opened_at: DateTime<Utc>,
    activity: Option<ActivityState>,
    phase_index: Option<u32>,
    posts: Vec<Post>,
    seen: HashSet<u64>,
    queue: VecDeque<Intervention>,
    active: Option<Intervention>,
    show_why: bool,
    seconds_left: Option<u64>,
    input: String,
    loading: bool,
    error: Option<String>,
}

impl WorkspaceState {
    pub fn new(room_code: impl Into<String>, opened_at: DateTime<Utc>) -> Self {
        Self {
            room_code: room_code.into(),
            opened_at,
            activity: None,
            phase_index: None,
            posts: Vec::new(),
            seen: HashSet::new(),
            queue: VecDeque::new(),
            active: None,
            show_why: false,
            seconds_left: None,
            input: String::new(),
            loading: true,
            error: None,
        }
    }

    // -----------------------------------------------------------------------
    // Poll reconciliation
    // -----------------------------------------------------------------------

    /// Apply one polled snapshot.
    ///
    /// Activity and posts are replaced wholesale. Interventions created at or
    /// after `opened_at` whose id has not been seen are appended to the queue
    /// in arrival order and marked seen; everything else is ignored.
    pub fn apply_snapshot(&mut self, snapshot: MessagesSnapshot, now: DateTime<Utc>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let phase_index = snapshot.phase_index;
        let activity = snapshot.activity.clone();
        let (posts, interventions) = snapshot.partition();

        self.activity = Some(activity);
        self.posts = posts;

        for intervention in interventions {
            if intervention.created_at < self.opened_at {
                report.stale += 1;
                continue;
            }
            if self.seen.insert(intervention.id) {
                self.queue.push_back(intervention);
                report.queued += 1;
            }
        }

        if phase_index != self.phase_index {
            self.phase_index = phase_index;
            report.phase_changed = true;
        }

        self.refresh_countdown(now);
        self.loading = false;
        self.error = None;
        self.promote();
        report
    }

    /// Record a failed poll. State from the last good snapshot is kept.
    pub fn record_error(&mut self, err: &SstError) {
        self.loading = false;
        self.error = Some(err.to_string());
    }

    /// Recompute `seconds_left` from the current deadline.
    pub fn refresh_countdown(&mut self, now: DateTime<Utc>) {
        self.seconds_left = countdown_for(self.phase_ends_at(), now);
    }

    // -----------------------------------------------------------------------
    // Intervention presentation
    // -----------------------------------------------------------------------

    /// Queue an intervention delivered synchronously by a rejected post.
    ///
    /// Freshness and seen checks are skipped, but the id is recorded as seen
    /// so the same intervention is not shown again if a later poll includes it.
    pub fn enqueue_direct(&mut self, intervention: Intervention) {
        self.seen.insert(intervention.id);
        self.queue.push_back(intervention);
        self.promote();
    }

    /// The single idle → showing rule: with nothing displayed and a non-empty
    /// queue, show the queue head with its explanation collapsed.
    fn promote(&mut self) {
        if self.active.is_some() {
            return;
        }
        if let Some(next) = self.queue.pop_front() {
            self.show_why = false;
            self.active = Some(next);
        }
    }

    /// Close the displayed intervention ("OK", close button, Escape). The next
    /// queued one, if any, is shown straight away.
    pub fn dismiss(&mut self) {
        self.active = None;
        self.show_why = false;
        self.promote();
    }

    /// "Next (n)": same transition as dismissal, offered while more are queued.
    pub fn next(&mut self) {
        self.dismiss();
    }

    /// Switch between the message body and the rule explanation.
    pub fn toggle_why(&mut self) {
        if self.active.is_some() {
            self.show_why = !self.show_why;
        }
    }

    /// Route a modal input to the intervention overlay.
    pub fn handle_modal_input(&mut self, input: ModalInput) {
        if self.active.is_some() && input.dismisses() {
            self.dismiss();
        }
    }

    // -----------------------------------------------------------------------
    // Composer
    // -----------------------------------------------------------------------

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Submission is refused once the activity has finished.
    pub fn can_submit(&self) -> bool {
        !self.activity.as_ref().is_some_and(|a| a.finished)
    }

    /// Trimmed draft ready to send, or `None` if empty or sending is disabled.
    pub fn pending_submission(&self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        let content = self.input.trim();
        (!content.is_empty()).then(|| content.to_string())
    }

    pub fn on_submit_accepted(&mut self) {
        self.input.clear();
    }

    /// 422: the intervention is shown at once and the draft counts as handled.
    pub fn on_submit_blocked(&mut self, intervention: Intervention) {
        self.input.clear();
        self.enqueue_direct(intervention);
    }

    /// Any other failure keeps the draft for another attempt.
    pub fn on_submit_failed(&mut self, err: &SstError) {
        self.error = Some(err.to_string());
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub fn activity(&self) -> Option<&ActivityState> {
        self.activity.as_ref()
    }

    pub fn phase_ends_at(&self) -> Option<&str> {
        self.activity.as_ref()?.phase_ends_at.as_deref()
    }

    pub fn phase_index(&self) -> Option<u32> {
        self.phase_index
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn queue(&self) -> &VecDeque<Intervention> {
        &self.queue
    }

    pub fn active(&self) -> Option<&Intervention> {
        self.active.as_ref()
    }

    pub fn show_why(&self) -> bool {
        self.show_why
    }

    pub fn has_seen(&self, id: u64) -> bool {
        self.seen.contains(&id)
    }

    /// Countdown to display; hidden once the activity has finished.
    pub fn seconds_left(&self) -> Option<u64> {
        if self.activity.as_ref().is_some_and(|a| a.finished) {
            return None;
        }
        self.seconds_left
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
