//! Activity workspace: the polled transcript, the moderation intervention
//! queue, and the phase countdown for one room.
//!
//! ```rust,ignore
//! let session = WorkspaceSession::new(api, "AB12CD", &config);
//! let (tx, rx) = tokio::sync::mpsc::channel(16);
//! let final_state = session.run(rx, |state| println!("{}", render::workspace(state))).await;
//! ```

pub mod countdown;
pub mod session;
pub mod state;

pub use countdown::{countdown_for, parse_deadline, seconds_left, CountdownTimer};
pub use session::{send_message, Command, WorkspaceSession};
pub use state::{ReconcileReport, WorkspaceState};
