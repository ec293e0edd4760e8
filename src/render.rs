//! Plain-text frames for every view, colored with `colored`.
//!
//! Renderers are pure: state in, `String` out. The interactive loop decides
//! when to print.

use colored::*;

use crate::api::{Activity, Identity, Intervention, Post};
use crate::modal::render_box;
use crate::pages::catalogue::Catalogue;
use crate::pages::dashboard::{Cta, DashboardState};
use crate::pages::hub::RoomsHub;
use crate::workspace::WorkspaceState;

/// Shown in place of an intervention's author when the server sent none.
pub const FALLBACK_AUTHOR: &str = "Moderator";

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

pub fn workspace_header(state: &WorkspaceState) -> String {
    let phase = state.activity().map(|a| a.phase_label()).unwrap_or("Lobby");
    let mut header = format!(
        "{} {} {} {}",
        "Room:".bright_yellow(),
        state.room_code().bold(),
        "• Phase:".bright_yellow(),
        phase
    );
    if let Some(secs) = state.seconds_left() {
        header.push_str(&format!(" • {}", format!("{secs}s left").bright_cyan()));
    }
    header
}

fn post_line(post: &Post) -> String {
    let mut line = format!(
        "{} {}: {}",
        post.created_at.format("[%H:%M:%S]").to_string().dimmed(),
        post.author.bright_green(),
        post.content
    );
    if post.lacks_evidence {
        line.push_str(&format!(" {}", "[Lacks evidence]".yellow()));
    }
    line
}

/// Body and footer of the intervention overlay.
pub fn intervention_overlay(intervention: &Intervention, show_why: bool, queued: usize) -> String {
    let title = if intervention.author.trim().is_empty() {
        FALLBACK_AUTHOR
    } else {
        intervention.author.as_str()
    };

    let body = if show_why {
        let mut why = String::from("Why am I seeing this?\n");
        if intervention.explanation.trim().is_empty() {
            why.push_str("No explanation was given.");
        } else {
            why.push_str(&intervention.explanation);
        }
        if !intervention.rule_name.is_empty() {
            why.push_str(&format!("\nRule: {}", intervention.rule_name));
        }
        why
    } else {
        intervention.content.clone()
    };

    let mut footer = if show_why {
        vec!["/why Back".to_string()]
    } else {
        vec!["/why Why am I seeing this?".to_string()]
    };
    if queued > 0 {
        footer.push(format!("/next Next ({queued})"));
    }
    footer.push("/ok OK".to_string());

    render_box(title, &body, Some(&footer.join("   ")))
}

/// Full workspace frame: the header line followed by [`workspace_body`].
pub fn workspace(state: &WorkspaceState) -> String {
    format!("{}\n{}", workspace_header(state), workspace_body(state))
}

/// Everything below the header. Countdown ticks never change it. While an
/// intervention is showing the transcript is scroll-locked and left out.
pub fn workspace_body(state: &WorkspaceState) -> String {
    let mut out = Vec::new();

    if let Some(prompt) = state
        .activity()
        .and_then(|a| a.phase_prompt.as_deref())
        .filter(|p| !p.trim().is_empty())
    {
        out.push(format!("{} {}", "Prompt:".bright_yellow(), prompt));
    }
    out.push("=".repeat(50).bright_blue().to_string());

    if let Some(active) = state.active() {
        out.push(intervention_overlay(active, state.show_why(), state.queue().len()));
        return out.join("\n");
    }

    if state.loading() && state.posts().is_empty() {
        out.push("Loading…".dimmed().to_string());
    } else if state.posts().is_empty() {
        out.push("No messages yet.".dimmed().to_string());
    } else {
        out.extend(state.posts().iter().map(post_line));
    }

    if let Some(err) = state.error() {
        out.push(format!("{} {}", "error:".red().bold(), err));
    }

    if state.can_submit() {
        out.push(format!("{} {}", ">".bright_cyan(), state.input()));
    } else {
        out.push("Activity finished. The transcript is read-only.".dimmed().to_string());
    }
    out.join("\n")
}

// ---------------------------------------------------------------------------
// Other views
// ---------------------------------------------------------------------------

pub fn identity(identity: &Identity) -> String {
    let mut line = format!(
        "{} ({}) as {}",
        identity.display_name.bold(),
        identity.username,
        identity.role.to_string().bright_yellow()
    );
    if let Some(at) = identity.created_at {
        line.push_str(&format!(", since {}", at.format("%Y-%m-%d %H:%M UTC")));
    }
    line
}

/// The call to action, with the slash command that triggers it.
pub fn cta_line(cta: Cta, facilitator: bool) -> String {
    match cta {
        Cta::NoActivitySelected => "/select  Select Activity".to_string(),
        Cta::SelectedNotStarted { activity_id } if facilitator => {
            format!("/start  Start Activity (#{activity_id})   /select  Change")
        }
        Cta::SelectedNotStarted { activity_id } => {
            format!("Activity #{activity_id} selected, waiting for the facilitator to start it")
        }
        Cta::Running => "/open  Open Workspace".to_string(),
        Cta::Finished => "/open  Review Transcript".to_string(),
    }
}

pub fn dashboard(state: &DashboardState, facilitator: bool) -> String {
    let mut out = Vec::new();
    let name = state.room().map(|r| r.name.as_str()).unwrap_or("");
    out.push(format!("{} {} {}", "Room".bright_yellow(), state.code().bold(), name));

    if let Some(activity) = state.room().and_then(|r| r.activity.as_ref()) {
        if let Some(activity_name) = &activity.activity_name {
            out.push(format!(
                "{} {} ({})",
                "Activity:".bright_yellow(),
                activity_name,
                activity.phase_label()
            ));
        }
    }

    out.push(format!("{} ({})", "Members".bright_yellow(), state.members().len()));
    if state.members().is_empty() {
        out.push("  nobody yet".dimmed().to_string());
    }
    for m in state.members() {
        out.push(format!("  • {}", m.name));
    }

    if let Some(err) = state.error() {
        out.push(format!("{} {}", "error:".red().bold(), err));
    }
    out.push(cta_line(state.cta(), facilitator).bright_cyan().to_string());
    out.join("\n")
}

pub fn hub(hub: &RoomsHub) -> String {
    let mut out = vec!["Rooms".bright_yellow().bold().to_string()];
    if let Some(code) = hub.created_code() {
        out.push(format!("Share this join code: {}", code.bold()));
    }
    for room in hub.rooms() {
        out.push(format!("  {}  {}", room.code.bold(), room.name));
    }
    match hub.active_modal() {
        Some(kind) => {
            let body = match hub.error() {
                Some(err) => format!("{}\n{}", kind.prompt(), err),
                None => kind.prompt().to_string(),
            };
            out.push(render_box(kind.title(), &body, Some("/esc Cancel")));
        }
        None => {
            if let Some(err) = hub.error() {
                out.push(format!("{} {}", "error:".red().bold(), err));
            }
            out.push("/create  Create Room   /join  Join Room   /quit".dimmed().to_string());
        }
    }
    out.join("\n")
}

pub fn catalogue(catalogue: &Catalogue) -> String {
    let mut out = vec!["Activities".bright_yellow().bold().to_string()];
    if catalogue.loading() {
        out.push("Loading…".dimmed().to_string());
        return out.join("\n");
    }
    if let Some(err) = catalogue.error() {
        out.push(format!("{} {}", "error:".red().bold(), err));
    }
    let visible = catalogue.visible();
    if visible.is_empty() {
        out.push("No activities match.".dimmed().to_string());
    }
    for a in visible {
        out.push(format!(
            "  #{:<4} {}  {}  {}",
            a.id,
            a.name.bold(),
            format!("[{}]", a.activity_type).bright_blue(),
            format!("{} phases", a.phases.len()).dimmed()
        ));
        if !a.description.is_empty() {
            out.push(format!("        {}", a.description));
        }
    }
    out.join("\n")
}

pub fn activity_detail(activity: &Activity) -> String {
    let mut out = vec![
        format!("{} {}", activity.name.bold(), format!("[{}]", activity.activity_type).bright_blue()),
    ];
    if !activity.description.is_empty() {
        out.push(activity.description.clone());
    }
    for (i, phase) in activity.phases.iter().enumerate() {
        out.push(format!(
            "  {}. {}  {}",
            i + 1,
            phase.name.bold(),
            format!("{} min, {} turns", phase.time_limit_minutes, phase.turn_limit).dimmed()
        ));
        if !phase.prompt.is_empty() {
            out.push(format!("     {}", phase.prompt));
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ActivityState, MessageItem, MessagesSnapshot, Phase};
    use chrono::{Duration, TimeZone, Utc};

    fn plain() {
        colored::control::set_override(false);
    }

    fn intervention(author: &str) -> Intervention {
        Intervention {
            id: 1,
            content: "Let's back that up with a source.".into(),
            author: author.into(),
            explanation: "Claims without evidence slow the group down.".into(),
            rule_name: "evidence".into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 5).unwrap(),
            phase_index: Some(0),
        }
    }

    #[test]
    fn overlay_falls_back_to_moderator() {
        plain();
        let out = intervention_overlay(&intervention(""), false, 0);
        assert!(out.contains(FALLBACK_AUTHOR));
        assert!(out.contains("back that up"));
        assert!(!out.contains("Next"));
    }

    #[test]
    fn overlay_why_view_shows_rule() {
        plain();
        let out = intervention_overlay(&intervention("Socratic Agent"), true, 2);
        assert!(out.contains("Why am I seeing this?"));
        assert!(out.contains("Rule: evidence"));
        assert!(out.contains("Back"));
        assert!(out.contains("Next (2)"));
        assert!(!out.contains("back that up"));
    }

    fn snapshot(opened: chrono::DateTime<Utc>) -> MessagesSnapshot {
        MessagesSnapshot {
            room: "ROOM01".into(),
            phase_index: Some(0),
            activity: ActivityState {
                is_running: true,
                phase_name: Some("Brainstorm".into()),
                phase_prompt: Some("List three ideas".into()),
                phase_ends_at: Some((opened + Duration::seconds(90)).to_rfc3339()),
                ..Default::default()
            },
            messages: vec![MessageItem::Post(Post {
                id: 1,
                content: "cats are best".into(),
                author: "bo".into(),
                created_at: opened,
                phase_index: Some(0),
                lacks_evidence: true,
            })],
        }
    }

    #[test]
    fn workspace_frame_has_header_prompt_and_badge() {
        plain();
        let opened = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut state = WorkspaceState::new("ROOM01", opened);
        state.apply_snapshot(snapshot(opened), opened);
        let out = workspace(&state);
        assert!(out.contains("Room: ROOM01 • Phase: Brainstorm • 90s left"));
        assert!(out.contains("Prompt: List three ideas"));
        assert!(out.contains("bo: cats are best [Lacks evidence]"));
    }

    #[test]
    fn countdown_tick_changes_header_only() {
        plain();
        let opened = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut state = WorkspaceState::new("ROOM01", opened);
        state.apply_snapshot(snapshot(opened), opened);
        let (header, body) = (workspace_header(&state), workspace_body(&state));
        assert_eq!(workspace(&state), format!("{header}\n{body}"));

        state.refresh_countdown(opened + Duration::seconds(1));
        assert_ne!(workspace_header(&state), header);
        assert_eq!(workspace_body(&state), body);
    }

    #[test]
    fn workspace_frame_hides_transcript_behind_overlay() {
        plain();
        let opened = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut state = WorkspaceState::new("ROOM01", opened);
        state.apply_snapshot(snapshot(opened), opened);
        state.enqueue_direct(intervention("Socratic Agent"));
        let out = workspace(&state);
        assert!(out.contains("Socratic Agent"));
        assert!(!out.contains("cats are best"));
    }

    #[test]
    fn empty_workspace_says_so() {
        plain();
        let opened = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut state = WorkspaceState::new("ROOM01", opened);
        state.apply_snapshot(
            MessagesSnapshot {
                room: "ROOM01".into(),
                phase_index: None,
                activity: ActivityState::default(),
                messages: vec![],
            },
            opened,
        );
        let out = workspace(&state);
        assert!(out.contains("Phase: Lobby"));
        assert!(!out.contains("left"));
        assert!(out.contains("No messages yet."));
    }

    #[test]
    fn cta_lines() {
        assert!(cta_line(Cta::NoActivitySelected, false).contains("Select Activity"));
        assert!(cta_line(Cta::SelectedNotStarted { activity_id: 3 }, true).contains("Start Activity"));
        assert!(!cta_line(Cta::SelectedNotStarted { activity_id: 3 }, false).contains("/start"));
        assert!(cta_line(Cta::Running, false).contains("Open Workspace"));
        assert!(cta_line(Cta::Finished, false).contains("Review Transcript"));
    }

    #[test]
    fn activity_detail_lists_phases() {
        plain();
        let activity = Activity {
            id: 2,
            name: "Bridge Builder".into(),
            description: "Design a bridge".into(),
            activity_type: crate::api::ActivityType::ProblemSolving,
            phases: vec![Phase {
                name: "Plan".into(),
                prompt: "Sketch it".into(),
                time_limit_minutes: 5,
                turn_limit: 10,
            }],
            created_at: None,
        };
        let out = activity_detail(&activity);
        assert!(out.contains("[problem-solving]"));
        assert!(out.contains("1. Plan  5 min, 10 turns"));
    }
}
