use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use wayfinder::modules::locations::core::location::{Floor, LocationDraft};
use wayfinder::modules::positioning::adapters::outbound::scripted_position_source::{
    PositionScript, ScriptedPositionSource,
};
use wayfinder::modules::positioning::core::ports::Platform;
use wayfinder::shell::config::{DATA_DIR_VAR, Settings};
use wayfinder::shell::state::AppState;

#[derive(Parser)]
#[command(name = "wayfinder")]
#[command(about = "Record floor-bound locations and track the live position", long_about = None)]
pub struct Cli {
    /// Directory holding the persisted location collection
    #[arg(long, global = true, env = DATA_DIR_VAR)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print stored locations
    List {
        /// Only locations on this floor (number or name)
        #[arg(long)]
        floor: Option<Floor>,
    },
    /// Store a new location
    Add {
        #[arg(long)]
        floor: Floor,
        #[arg(long)]
        name: Option<String>,
        /// Extra field as key=value; values that parse as JSON are stored as JSON
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Json)>,
    },
    /// Print one location
    Show { id: String },
    /// Delete one location
    Remove { id: String },
    /// Replay a position script through the tracker and print every position change
    Track {
        /// JSON file with `current`, `watch` and optional `permission` entries
        #[arg(long)]
        script: PathBuf,
        /// Delay between replayed watch events
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Print the geolocation permission state
    Permissions {
        /// Position script describing the platform; without one no capability is present
        #[arg(long)]
        script: Option<PathBuf>,
    },
}

fn parse_field(raw: &str) -> Result<(String, Json), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err("field key must not be empty".into());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Json::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_script(path: &Path) -> anyhow::Result<PositionScript> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

pub async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::List { floor } => {
            let state = AppState::new(settings, Platform::bare());
            state.locations.load_locations().await?;
            let locations = match floor {
                Some(floor) => state.locations.locations_by_floor(&floor).await,
                None => state.locations.locations().await,
            };
            print_json(&locations)
        }
        Command::Add { floor, name, fields } => {
            let state = AppState::new(settings, Platform::bare());
            state.locations.load_locations().await?;
            let mut draft = LocationDraft::new(floor);
            if let Some(name) = name {
                draft = draft.with_field("name", name);
            }
            let draft = fields
                .into_iter()
                .fold(draft, |draft, (key, value)| draft.with_field(key, value));
            let location = state.locations.save_location(draft).await?;
            print_json(&location)
        }
        Command::Show { id } => {
            let state = AppState::new(settings, Platform::bare());
            state.locations.load_locations().await?;
            match state.locations.location_by_id(&id).await {
                Some(location) => print_json(&location),
                None => bail!("no location with id {id}"),
            }
        }
        Command::Remove { id } => {
            let state = AppState::new(settings, Platform::bare());
            state.locations.load_locations().await?;
            match state.locations.delete_location(&id).await? {
                Some(location) => print_json(&location),
                None => bail!("no location with id {id}"),
            }
        }
        Command::Track {
            script,
            interval_ms,
        } => track(settings, &script, Duration::from_millis(interval_ms)).await,
        Command::Permissions { script } => {
            let platform = match script {
                Some(path) => ScriptedPositionSource::platform(&read_script(&path).await?).1,
                None => Platform::bare(),
            };
            let state = AppState::new(settings, platform);
            println!("{}", state.geolocation.check_permissions().await);
            Ok(())
        }
    }
}

async fn track(settings: &Settings, script: &Path, interval: Duration) -> anyhow::Result<()> {
    let script = read_script(script).await?;
    let (source, platform) = ScriptedPositionSource::platform(&script);
    let state = AppState::new(settings, platform);

    let initial = state.tracker.start_position_tracking().await?;
    print_json(&initial)?;

    let mut changes = state.tracker.subscribe();
    let replay = async move {
        for event in script.watch {
            tokio::time::sleep(interval).await;
            source.emit(event.into());
        }
        tokio::time::sleep(interval).await;
    };
    let printer = async move {
        while changes.changed().await.is_ok() {
            let position = *changes.borrow_and_update();
            if let Some(position) = position {
                print_json(&position)?;
            }
        }
        anyhow::Ok(())
    };

    tokio::select! {
        _ = replay => info!("script finished"),
        result = printer => result?,
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    state.shutdown();
    if let Some(e) = state.tracker.last_watch_error() {
        info!(error = %e, "last tracking error");
    }
    Ok(())
}
