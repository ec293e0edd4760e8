//! Interactive navigation loop.
//!
//! Stdin is read line by line on a background task. Each view takes lines
//! from that one channel: polling views get them translated into their own
//! command type, the others handle them inline. A view returns the next
//! [`Route`], or `None` to exit.

use std::str::FromStr;

use clap::ValueEnum;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::{ApiClient, Role};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::modal::ModalInput;
use crate::pages::catalogue::{select as select_activity, Catalogue, TypeFilter};
use crate::pages::dashboard::{DashboardCommand, DashboardSession};
use crate::pages::hub::{HubModal, RoomsHub};
use crate::pages::login;
use crate::render;
use crate::router::Route;
use crate::storage::LocalStore;
use crate::workspace::{Command, WorkspaceSession, WorkspaceState};

// ---------------------------------------------------------------------------
// Line → command translation
// ---------------------------------------------------------------------------

/// Translate a line typed in the workspace. Plain text is a message; `/back`
/// is handled by the caller since it leaves the view.
pub fn workspace_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(Command::Send(line.to_string()));
    }
    let cmd = match line {
        "/ok" => Command::Dismiss,
        "/next" => Command::Next,
        "/why" => Command::ToggleWhy,
        "/esc" => Command::Modal(ModalInput::Escape),
        "/close" => Command::Modal(ModalInput::CloseButton),
        "/retry" => Command::Retry,
        "/refresh" => Command::Refresh,
        "/quit" => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

pub fn dashboard_command(line: &str) -> Option<DashboardCommand> {
    let cmd = match line.trim() {
        "/select" => DashboardCommand::SelectActivity,
        "/start" => DashboardCommand::Start,
        "/open" => DashboardCommand::OpenWorkspace,
        "/refresh" | "" => DashboardCommand::Refresh,
        "/back" => DashboardCommand::Back,
        "/quit" => DashboardCommand::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Prints a frame only when it differs from the last one printed.
#[derive(Debug, Default)]
pub struct FramePrinter {
    last: Option<String>,
}

impl FramePrinter {
    /// Returns whether the frame was printed.
    pub fn show(&mut self, frame: String) -> bool {
        if self.last.as_deref() == Some(frame.as_str()) {
            return false;
        }
        println!("\n{frame}");
        self.last = Some(frame);
        true
    }
}

/// What [`WorkspacePrinter`] emitted for one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repaint {
    Nothing,
    /// Only the header line changed, usually a countdown tick.
    Header,
    Frame,
}

/// Workspace variant of [`FramePrinter`]: when only the header changed it
/// prints just the header line instead of the whole transcript.
#[derive(Debug, Default)]
pub struct WorkspacePrinter {
    header: Option<String>,
    body: Option<String>,
}

impl WorkspacePrinter {
    pub fn show(&mut self, state: &WorkspaceState) -> Repaint {
        let header = render::workspace_header(state);
        let body = render::workspace_body(state);
        let repaint = self.update(header, body);
        match (repaint, &self.header, &self.body) {
            (Repaint::Frame, Some(header), Some(body)) => println!("\n{header}\n{body}"),
            (Repaint::Header, Some(header), _) => println!("{header}"),
            _ => {}
        }
        repaint
    }

    fn update(&mut self, header: String, body: String) -> Repaint {
        if self.body.as_deref() != Some(body.as_str()) {
            self.header = Some(header);
            self.body = Some(body);
            Repaint::Frame
        } else if self.header.as_deref() != Some(header.as_str()) {
            self.header = Some(header);
            Repaint::Header
        } else {
            Repaint::Nothing
        }
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

fn unknown(line: &str) {
    eprintln!("{} unknown command: {}", "?".bright_yellow(), line.trim());
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    api: ApiClient,
    store: LocalStore,
    config: ClientConfig,
    lines: mpsc::Receiver<String>,
}

impl App {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = LocalStore::open(&config.storage_path)?;
        Ok(Self {
            api: ApiClient::new(&config),
            store,
            config,
            lines: spawn_stdin_reader(),
        })
    }

    /// First view when none was asked for.
    pub fn landing(&self) -> Route {
        login::landing_route(&self.store)
    }

    /// Drive views starting at `route` until one of them exits.
    pub async fn run(mut self, route: Route) -> Result<()> {
        let mut next = Some(route);
        while let Some(route) = next {
            debug!(route = %route, "navigating");
            next = match route {
                Route::Login => self.login().await?,
                Route::RoomsHub => self.hub().await?,
                Route::Dashboard { code } => self.dashboard(code).await?,
                Route::Catalogue { code } => self.catalogue(code).await?,
                Route::Workspace { code } => self.workspace(code).await?,
            };
        }
        info!("bye");
        Ok(())
    }

    async fn prompt(&mut self, label: &str) -> Option<String> {
        println!("{}", label.bright_yellow());
        self.lines.recv().await.map(|l| l.trim().to_string())
    }

    async fn login(&mut self) -> Result<Option<Route>> {
        loop {
            let Some(name) = self.prompt("Display name:").await else {
                return Ok(None);
            };
            if name == "/quit" {
                return Ok(None);
            }
            let Some(role) = self.prompt("Role (learner / facilitator):").await else {
                return Ok(None);
            };
            let Ok(role) = <Role as ValueEnum>::from_str(&role, true) else {
                eprintln!("{} choose learner or facilitator", "error:".red().bold());
                continue;
            };
            match login::login(&self.api, &mut self.store, &name, role).await {
                Ok((identity, route)) => {
                    println!("Logged in as {}", render::identity(&identity));
                    return Ok(Some(route));
                }
                Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
            }
        }
    }

    async fn hub(&mut self) -> Result<Option<Route>> {
        let mut hub = RoomsHub::new();
        let mut printer = FramePrinter::default();
        loop {
            printer.show(render::hub(&hub));
            let Some(line) = self.lines.recv().await else {
                return Ok(None);
            };
            let line = line.trim();
            match line {
                "/create" => hub.open(HubModal::Create),
                "/join" => hub.open(HubModal::Join),
                "/esc" => hub.handle_modal(ModalInput::Escape),
                "/quit" => return Ok(None),
                "/logout" => {
                    login::logout(&mut self.store)?;
                    return Ok(Some(Route::Login));
                }
                _ if hub.active_modal().is_some() => {
                    if let Some(route) = hub.submit(&self.api, line).await {
                        printer.show(render::hub(&hub));
                        return Ok(Some(route));
                    }
                }
                _ => unknown(line),
            }
        }
    }

    async fn dashboard(&mut self, code: String) -> Result<Option<Route>> {
        let role = login::current_identity(&self.store).map(|i| i.role);
        let facilitator = role == Some(Role::Facilitator);
        let selected = self.store.selected_activity(&code);

        let (tx, rx) = mpsc::channel(16);
        let mut printer = FramePrinter::default();
        let session = DashboardSession::new(self.api.clone(), code, selected, role, &self.config)
            .run(rx, move |state| {
                printer.show(render::dashboard(state, facilitator));
            });
        tokio::pin!(session);

        loop {
            tokio::select! {
                route = &mut session => return Ok(route),
                line = self.lines.recv() => {
                    let Some(line) = line else { return Ok(None) };
                    match dashboard_command(&line) {
                        Some(cmd) => {
                            let _ = tx.send(cmd).await;
                        }
                        None => unknown(&line),
                    }
                }
            }
        }
    }

    async fn catalogue(&mut self, code: String) -> Result<Option<Route>> {
        let mut catalogue = Catalogue::new();
        catalogue.load(&self.api).await;
        let mut printer = FramePrinter::default();
        loop {
            printer.show(render::catalogue(&catalogue));
            let Some(line) = self.lines.recv().await else {
                return Ok(None);
            };
            let (cmd, arg) = match line.trim().split_once(' ') {
                Some((cmd, arg)) => (cmd, arg.trim()),
                None => (line.trim(), ""),
            };
            match cmd {
                "/search" => catalogue.set_query(arg),
                "/type" => {
                    if let Ok(filter) = TypeFilter::from_str(arg) {
                        catalogue.set_filter(filter);
                    }
                }
                "/show" => match arg.parse::<u64>() {
                    Ok(id) => match self.api.fetch_activity(id).await {
                        Ok(activity) => println!("\n{}", render::activity_detail(&activity)),
                        Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
                    },
                    Err(_) => unknown(&line),
                },
                "/pick" => match arg.parse::<u64>() {
                    Ok(id) if catalogue.find(id).is_some() => {
                        return select_activity(&mut self.store, &code, id).map(Some);
                    }
                    _ => eprintln!("{} no activity #{}", "error:".red().bold(), arg),
                },
                "/reload" => catalogue.load(&self.api).await,
                "/back" => return Ok(Some(Route::Dashboard { code })),
                "/quit" => return Ok(None),
                _ => unknown(&line),
            }
        }
    }

    async fn workspace(&mut self, code: String) -> Result<Option<Route>> {
        let (tx, rx) = mpsc::channel(16);
        let mut printer = WorkspacePrinter::default();
        let session = WorkspaceSession::new(self.api.clone(), code.clone(), &self.config)
            .run(rx, move |state| {
                printer.show(state);
            });
        tokio::pin!(session);

        let mut next = None;
        loop {
            tokio::select! {
                _ = &mut session => return Ok(next),
                line = self.lines.recv() => {
                    let Some(line) = line else { return Ok(None) };
                    if line.trim() == "/back" {
                        next = Some(Route::Dashboard { code: code.clone() });
                        let _ = tx.send(Command::Quit).await;
                        continue;
                    }
                    match workspace_command(&line) {
                        Some(cmd) => {
                            let _ = tx.send(cmd).await;
                        }
                        None => unknown(&line),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/ok", Some(Command::Dismiss))]
    #[case("/next", Some(Command::Next))]
    #[case("/why", Some(Command::ToggleWhy))]
    #[case("/esc", Some(Command::Modal(ModalInput::Escape)))]
    #[case("/retry", Some(Command::Retry))]
    #[case("  hello there ", Some(Command::Send("hello there".into())))]
    #[case("   ", None)]
    #[case("/nope", None)]
    fn workspace_lines(#[case] line: &str, #[case] expected: Option<Command>) {
        assert_eq!(workspace_command(line), expected);
    }

    #[rstest]
    #[case("/select", Some(DashboardCommand::SelectActivity))]
    #[case("/start", Some(DashboardCommand::Start))]
    #[case("", Some(DashboardCommand::Refresh))]
    #[case("hello", None)]
    fn dashboard_lines(#[case] line: &str, #[case] expected: Option<DashboardCommand>) {
        assert_eq!(dashboard_command(line), expected);
    }

    #[test]
    fn frame_printer_skips_repeats() {
        let mut printer = FramePrinter::default();
        assert!(printer.show("a".into()));
        assert!(!printer.show("a".into()));
        assert!(printer.show("b".into()));
    }

    #[test]
    fn workspace_printer_repaints_header_alone_on_tick() {
        let mut printer = WorkspacePrinter::default();
        assert_eq!(printer.update("Room • 90s left".into(), "body".into()), Repaint::Frame);
        assert_eq!(printer.update("Room • 89s left".into(), "body".into()), Repaint::Header);
        assert_eq!(printer.update("Room • 89s left".into(), "body".into()), Repaint::Nothing);
        assert_eq!(printer.update("Room • 88s left".into(), "body 2".into()), Repaint::Frame);
        assert_eq!(printer.update("Room • 88s left".into(), "body 2".into()), Repaint::Nothing);
    }

    #[test]
    fn workspace_printer_tracks_a_real_state() {
        use crate::api::{ActivityState, MessagesSnapshot};
        use chrono::{Duration, TimeZone, Utc};

        let opened = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut state = WorkspaceState::new("ROOM01", opened);
        let snapshot = MessagesSnapshot {
            room: "ROOM01".into(),
            phase_index: Some(0),
            activity: ActivityState {
                is_running: true,
                phase_name: Some("Debate".into()),
                phase_ends_at: Some("2026-03-01T10:01:00Z".into()),
                ..Default::default()
            },
            messages: vec![],
        };
        state.apply_snapshot(snapshot, opened);

        let mut printer = WorkspacePrinter::default();
        assert_eq!(printer.show(&state), Repaint::Frame);
        state.refresh_countdown(opened + Duration::seconds(1));
        assert_eq!(printer.show(&state), Repaint::Header);
        state.set_input("draft");
        assert_eq!(printer.show(&state), Repaint::Frame);
    }
}
