//! Phase countdown.
//!
//! The countdown is display-only: phase advancement is decided by the server
//! and observed through the next poll. Locally we just re-derive
//! `seconds_left` once per tick against the server-supplied deadline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Parse an RFC 3339 deadline. Absent or malformed values yield `None`.
pub fn parse_deadline(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// `max(0, floor((deadline - now) / 1s))`.
pub fn seconds_left(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let ms = (deadline - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        (ms / 1000) as u64
    }
}

/// Countdown value for a raw `phase_ends_at`, or `None` when there is no
/// usable deadline (nothing is displayed).
pub fn countdown_for(phase_ends_at: Option<&str>, now: DateTime<Utc>) -> Option<u64> {
    parse_deadline(phase_ends_at).map(|deadline| seconds_left(deadline, now))
}

/// The ticking half of the countdown.
///
/// Owns a tokio [`Interval`] that exists only while a deadline is present.
/// [`sync`](Self::sync) tears the ticker down and re-creates it whenever the
/// deadline changes, and drops it when the deadline goes away.
#[derive(Debug)]
pub struct CountdownTimer {
    period: Duration,
    deadline: Option<String>,
    ticker: Option<Interval>,
}

impl CountdownTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
            ticker: None,
        }
    }

    /// Align the ticker with the latest `phase_ends_at`. Returns `true` when
    /// the deadline changed (ticker restarted or stopped).
    ///
    /// Must be called from within a tokio runtime when a deadline is present.
    pub fn sync(&mut self, phase_ends_at: Option<&str>) -> bool {
        if self.deadline.as_deref() == phase_ends_at {
            return false;
        }
        self.deadline = phase_ends_at.map(str::to_owned);
        self.ticker = parse_deadline(phase_ends_at).map(|_| {
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        true
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn deadline(&self) -> Option<&str> {
        self.deadline.as_deref()
    }

    /// Wait for the next tick. Never resolves while no ticker exists, which
    /// makes it safe to use as an always-present `select!` branch.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
