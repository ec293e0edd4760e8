use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::api::Role;
use crate::config::ClientConfig;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "sst")]
#[command(version)]
#[command(about = "Terminal client for Social Study Teammates rooms and activities")]
pub struct Args {
    /// Backend origin (overrides the config file and SST_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (defaults to <config dir>/sst/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Local storage file (defaults to <data dir>/sst/storage.json)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Without a subcommand, start the interactive client at the landing view
    #[command(subcommand)]
    pub command: Option<Cmd>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Cmd {
    /// Create a temporary account and remember it
    Login {
        /// Display name (at least two characters)
        #[arg(long)]
        name: String,
        #[arg(long, value_enum, default_value = "learner")]
        role: Role,
    },
    /// Forget the stored account
    Logout,
    /// Show the stored account
    Whoami,
    /// Create or join a room
    Rooms {
        #[command(subcommand)]
        action: RoomsCmd,
    },
    /// Inspect a room
    Room {
        #[command(subcommand)]
        action: RoomCmd,
    },
    /// Browse activity templates
    Activities {
        #[command(subcommand)]
        action: ActivitiesCmd,
    },
    /// Choose the activity template for a room
    Select { code: String, activity_id: u64 },
    /// Start the room's activity (facilitators)
    Start {
        code: String,
        /// Activity to start; defaults to the one selected for the room
        #[arg(long)]
        activity: Option<u64>,
    },
    /// Post one message to a room
    Send { code: String, message: String },
    /// Open the activity workspace for a room
    Workspace { code: String },
    /// Open the room dashboard
    Dashboard { code: String },
    /// Open the view at a path such as /rooms/AB12CD/activity
    Open {
        #[arg(default_value = "/")]
        path: String,
    },
    /// List the view paths understood by `open`
    Routes,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum RoomsCmd {
    Create { name: String },
    Join { code: String },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum RoomCmd {
    Show { code: String },
    Members { code: String },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ActivitiesCmd {
    List {
        /// Match against name and description
        #[arg(long, default_value = "")]
        query: String,
        /// Activity type, or "all"
        #[arg(long = "type", default_value = "all")]
        kind: String,
    },
    Show { id: u64 },
}

impl Args {
    /// Config file, then environment, then these flags.
    pub fn resolve_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.api_url {
            config = config.base_url(url.clone());
        }
        if let Some(path) = &self.storage {
            config = config.storage_path(path.clone());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_no_subcommand() {
        let args = Args::parse_from(["sst"]);
        assert!(args.command.is_none());
        assert!(args.api_url.is_none());
    }

    #[test]
    fn test_args_login_defaults_to_learner() {
        let args = Args::parse_from(["sst", "login", "--name", "Ana"]);
        assert_eq!(
            args.command,
            Some(Cmd::Login { name: "Ana".into(), role: Role::Learner })
        );
    }

    #[test]
    fn test_args_login_facilitator() {
        let args = Args::parse_from(["sst", "login", "--name", "Bo", "--role", "facilitator"]);
        assert!(matches!(args.command, Some(Cmd::Login { role: Role::Facilitator, .. })));
    }

    #[test]
    fn test_args_global_flags_after_subcommand() {
        let args = Args::parse_from([
            "sst",
            "workspace",
            "ab12cd",
            "--api-url",
            "http://10.0.0.2:8000/",
            "--storage",
            "/tmp/s.json",
        ]);
        assert_eq!(args.command, Some(Cmd::Workspace { code: "ab12cd".into() }));
        assert_eq!(args.api_url.as_deref(), Some("http://10.0.0.2:8000/"));
        assert_eq!(args.storage, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn test_args_rooms_join() {
        let args = Args::parse_from(["sst", "rooms", "join", "ab12cd"]);
        assert_eq!(
            args.command,
            Some(Cmd::Rooms { action: RoomsCmd::Join { code: "ab12cd".into() } })
        );
    }

    #[test]
    fn test_args_activities_list_filters() {
        let args = Args::parse_from(["sst", "activities", "list", "--query", "bridge", "--type", "discussion"]);
        assert_eq!(
            args.command,
            Some(Cmd::Activities {
                action: ActivitiesCmd::List { query: "bridge".into(), kind: "discussion".into() }
            })
        );
    }

    #[test]
    fn test_args_start_with_explicit_activity() {
        let args = Args::parse_from(["sst", "start", "ROOM01", "--activity", "4"]);
        assert_eq!(args.command, Some(Cmd::Start { code: "ROOM01".into(), activity: Some(4) }));
    }

    #[test]
    fn test_args_open_default_path() {
        let args = Args::parse_from(["sst", "open"]);
        assert_eq!(args.command, Some(Cmd::Open { path: "/".into() }));
    }

    #[test]
    fn test_args_rejects_unknown_role() {
        assert!(Args::try_parse_from(["sst", "login", "--name", "Ana", "--role", "admin"]).is_err());
    }

    #[test]
    fn test_resolve_config_flags_win() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "base_url = \"http://file:1\"\npoll_interval_ms = 500\n").unwrap();
        let args = Args::parse_from([
            "sst",
            "--config",
            file.to_str().unwrap(),
            "--api-url",
            "http://flag:2/",
            "--storage",
            "/tmp/x.json",
        ]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.base_url, "http://flag:2");
        assert_eq!(config.poll_interval, std::time::Duration::from_millis(500));
        assert_eq!(config.storage_path, PathBuf::from("/tmp/x.json"));
    }
}
