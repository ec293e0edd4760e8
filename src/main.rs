use clap::{CommandFactory, Parser};
use colored::*;
use tracing_subscriber::EnvFilter;

use sst_client::api::{ApiClient, PostOutcome};
use sst_client::app::App;
use sst_client::cli::{ActivitiesCmd, Args, Cmd, RoomCmd, RoomsCmd};
use sst_client::config::ClientConfig;
use sst_client::error::SstError;
use sst_client::pages::catalogue::{filter_activities, select, TypeFilter};
use sst_client::pages::{dashboard, hub, login};
use sst_client::render;
use sst_client::router::{normalize_code, Route, ROUTE_TABLE};
use sst_client::storage::LocalStore;
use sst_client::workspace::send_message;

/// Log filter variable; defaults to `warn`. Logs go to stderr.
const LOG_ENV: &str = "SST_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing();

    let config = args.resolve_config()?;

    let Some(command) = args.command else {
        return interactive(config, None).await;
    };

    match command {
        Cmd::Completions { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "sst", &mut std::io::stdout());
        }
        Cmd::Routes => {
            for (pattern, view) in ROUTE_TABLE {
                println!("{} {}", format!("{pattern:<26}").bright_yellow(), view);
            }
        }
        Cmd::Workspace { code } => {
            interactive(config, Some(Route::Workspace { code: normalize_code(&code) })).await?
        }
        Cmd::Dashboard { code } => {
            interactive(config, Some(Route::Dashboard { code: normalize_code(&code) })).await?
        }
        Cmd::Open { path } => {
            let route = Route::parse(&path)
                .ok_or_else(|| SstError::Validation(format!("Unknown path: {path}")))?;
            interactive(config, Some(route)).await?
        }
        other => one_shot(config, other).await?,
    }

    Ok(())
}

/// Run the interactive client until a view exits or Ctrl-C.
async fn interactive(config: ClientConfig, route: Option<Route>) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::new(config)?;
    let route = route.unwrap_or_else(|| app.landing());
    let result = tokio::select! {
        res = app.run(route) => res,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    // Runtime shutdown would otherwise wait on the stdin reader's blocking read.
    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    std::process::exit(0)
}

async fn one_shot(config: ClientConfig, command: Cmd) -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiClient::new(&config);
    let mut store = LocalStore::open(&config.storage_path)?;

    match command {
        Cmd::Login { name, role } => {
            let (identity, _) = login::login(&api, &mut store, &name, role).await?;
            println!("Logged in as {}", render::identity(&identity));
        }
        Cmd::Logout => {
            if login::logout(&mut store)? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
        Cmd::Whoami => match login::current_identity(&store) {
            Some(identity) => println!("{}", render::identity(&identity)),
            None => println!("Not logged in"),
        },
        Cmd::Rooms { action: RoomsCmd::Create { name } } => {
            let room = hub::create_room(&api, &name).await?;
            println!("Created {} {}", room.name.bold(), room.code.bright_cyan().bold());
        }
        Cmd::Rooms { action: RoomsCmd::Join { code } } => {
            let room = hub::join_room(&api, &code).await?;
            println!("Joined {} {}", room.name.bold(), room.code.bright_cyan().bold());
        }
        Cmd::Room { action: RoomCmd::Show { code } } => {
            let room = api.fetch_room(&normalize_code(&code)).await?;
            println!("{}", serde_json::to_string_pretty(&room)?);
        }
        Cmd::Room { action: RoomCmd::Members { code } } => {
            for member in api.fetch_members(&normalize_code(&code)).await? {
                println!("{}", member.name);
            }
        }
        Cmd::Activities { action: ActivitiesCmd::List { query, kind } } => {
            let filter: TypeFilter = kind.parse()?;
            let all = api.list_activities().await?;
            for a in filter_activities(&all, &query, &filter) {
                println!("#{:<4} {}  [{}]", a.id, a.name.bold(), a.activity_type);
            }
        }
        Cmd::Activities { action: ActivitiesCmd::Show { id } } => {
            let activity = api.fetch_activity(id).await?;
            println!("{}", render::activity_detail(&activity));
        }
        Cmd::Select { code, activity_id } => {
            let route = select(&mut store, &code, activity_id)?;
            println!("Selected activity #{activity_id} for {}", route.path());
        }
        Cmd::Start { code, activity } => {
            let code = normalize_code(&code);
            let role = login::current_identity(&store).map(|identity| identity.role);
            let activity = activity.or_else(|| store.selected_activity(&code));
            let started = dashboard::start_activity(&api, role, &code, activity).await?;
            println!("Activity #{started} started in {}", code.bright_cyan());
        }
        Cmd::Send { code, message } => {
            match send_message(&api, &normalize_code(&code), &message).await? {
                PostOutcome::Accepted(_) => println!("Sent"),
                PostOutcome::Blocked(intervention) => {
                    println!("{}", render::intervention_overlay(&intervention, false, 0));
                    println!("{}", render::intervention_overlay(&intervention, true, 0));
                }
            }
        }
        other => {
            return Err(SstError::Validation(format!("{other:?} is not a one-shot command")).into());
        }
    }
    Ok(())
}
