#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Rampart levels.
//!
//! Loads a level document from a JSON file or a share string, applies an
//! optional build script, then pumps the simulation tick by tick, printing
//! the world's event log until the level ends in victory or defeat.

mod level_transfer;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context as _, Result};
use clap::Parser;
use rampart_core::level::{LevelData, LevelPlan};
use rampart_core::{Event, PlayState, TileCoord};
use rampart_scene::{FrameState, Scene};
use rampart_session::Session;
use serde_json::Value;

use crate::level_transfer::LevelTransfer;

/// Command-line arguments accepted by the runner.
#[derive(Debug, Parser)]
#[command(name = "rampart", about = "Headless Rampart simulation runner")]
struct Args {
    /// Path to a level document JSON file.
    level: Option<PathBuf>,

    /// Level share string to run instead of a file.
    #[arg(long, conflicts_with = "level")]
    share: Option<String>,

    /// Zero-based index of the map to run within the document.
    #[arg(long, default_value_t = 0)]
    map: usize,

    /// Milliseconds of simulated time per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Upper bound on ticks before the run is abandoned.
    #[arg(long, default_value_t = 200_000)]
    max_ticks: u32,

    /// Tower to build before the first tick, as `column,row=towerKey`.
    #[arg(long = "build", value_name = "COL,ROW=KEY")]
    builds: Vec<String>,

    /// Print the selected map as a share string and exit.
    #[arg(long)]
    emit_share: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let map_json = load_map_json(&args)?;

    if args.emit_share {
        let transfer = LevelTransfer::from_map(&map_json).map_err(|error| anyhow!(error))?;
        println!("{}", transfer.encode());
        return Ok(());
    }

    let data: LevelData =
        serde_json::from_value(map_json).context("map JSON does not match the level schema")?;
    let plan = data.validate().context("map failed validation")?;
    run(plan, &args)
}

fn load_map_json(args: &Args) -> Result<Value> {
    if let Some(share) = &args.share {
        let transfer = LevelTransfer::decode(share).map_err(|error| anyhow!(error))?;
        return Ok(transfer.into_map());
    }
    let Some(path) = &args.level else {
        bail!("provide a level document path or a --share string");
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read level document {}", path.display()))?;
    let document: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let maps = document
        .get("maps")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("{} carries no maps array", path.display()))?;
    maps.get(args.map).cloned().ok_or_else(|| {
        anyhow!(
            "document holds {} maps; --map {} is out of range",
            maps.len(),
            args.map
        )
    })
}

fn run(plan: LevelPlan, args: &Args) -> Result<()> {
    // The session consumes the plan; keep a copy for catalog lookups and
    // scene composition.
    let catalog = plan.clone();
    let mut session = Session::new();
    session
        .load_level(plan)
        .map_err(|error| anyhow!(error))
        .context("level was rejected at load")?;

    for spec in &args.builds {
        let (tile, key) = parse_build(spec)?;
        let tower_type = catalog
            .tower_by_key(&key)
            .map(|tower| tower.id)
            .ok_or_else(|| anyhow!("tower type {key:?} is not in the catalog"))?;
        if let Err(reason) = session.build(tile, tower_type) {
            println!("build {spec} rejected: {reason}");
        }
    }
    print_events(session.drain_events());

    let dt = Duration::from_millis(args.tick_ms.max(1));
    let mut ticks = 0u32;
    while matches!(session.play_state(), PlayState::Running | PlayState::Paused) {
        if ticks >= args.max_ticks {
            println!("tick limit of {} reached; abandoning the run", args.max_ticks);
            break;
        }
        session.advance(dt);
        ticks += 1;
        print_events(session.drain_events());
    }

    let enemies = session.enemies();
    let towers = session.towers();
    let projectiles = session.projectiles();
    let effects = session.effects();
    let scene = Scene::compose(
        &catalog,
        &FrameState {
            enemies: &enemies,
            towers: &towers,
            projectiles: &projectiles,
            effects: &effects,
            economy: session.economy(),
            play_state: session.play_state(),
            selected_tower: session.selected_tower(),
        },
    )
    .context("final scene could not be composed")?;
    println!("{} ({ticks} ticks)", scene.hud.status_line());
    Ok(())
}

fn parse_build(spec: &str) -> Result<(TileCoord, String)> {
    let invalid = || anyhow!("build {spec:?} is not of the form column,row=towerKey");
    let (position, key) = spec.split_once('=').ok_or_else(invalid)?;
    let (column, row) = position.split_once(',').ok_or_else(invalid)?;
    let column = column.trim().parse::<u32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<u32>().map_err(|_| invalid())?;
    if key.trim().is_empty() {
        return Err(invalid());
    }
    Ok((TileCoord::new(column, row), key.trim().to_owned()))
}

fn print_events(events: Vec<Event>) {
    for event in events {
        if let Some(line) = describe(&event) {
            println!("{line}");
        }
    }
}

// Per-tick chatter (time, shots, hits) stays out of the log; the summary
// line at the end carries the totals that matter.
fn describe(event: &Event) -> Option<String> {
    match event {
        Event::LevelLoaded { name, waves } => {
            Some(format!("loaded {name:?} with {waves} waves"))
        }
        Event::LevelRejected { reason } => Some(format!("level rejected: {reason}")),
        Event::WaveStarted { index, enemies } => {
            Some(format!("wave {} started ({enemies} enemies)", index + 1))
        }
        Event::EnemyKilled { enemy, reward } => Some(format!(
            "enemy {} destroyed (+{reward} coins)",
            enemy.get()
        )),
        Event::EnemyEscaped { enemy, lives_left } => Some(format!(
            "enemy {} escaped ({lives_left} lives left)",
            enemy.get()
        )),
        Event::TowerBuilt { tile, price, .. } => Some(format!(
            "tower built at {},{} (-{price} coins)",
            tile.column(),
            tile.row()
        )),
        Event::BuildRejected { tile, reason } => Some(format!(
            "build at {},{} rejected: {reason}",
            tile.column(),
            tile.row()
        )),
        Event::TowerSold { tile, refund, .. } => Some(format!(
            "tower at {},{} sold (+{refund} coins)",
            tile.column(),
            tile.row()
        )),
        Event::SellRejected { tile, reason } => Some(format!(
            "sell at {},{} rejected: {reason}",
            tile.column(),
            tile.row()
        )),
        Event::AbilityActivated { tiles, .. } => {
            Some(format!("ability activated on {} tiles", tiles.len()))
        }
        Event::AbilityExpired { .. } => Some("ability effect expired".to_owned()),
        Event::LifePurchased { lives, price } => {
            Some(format!("extra life bought (-{price} coins, {lives} lives)"))
        }
        Event::PurchaseRejected { reason } => Some(format!("purchase rejected: {reason}")),
        Event::GameWon { waves_survived } => {
            Some(format!("victory! {waves_survived} waves cleared"))
        }
        Event::GameLost { waves_survived } => Some(format!(
            "defeat after {waves_survived} cleared waves"
        )),
        Event::TimeAdvanced { .. }
        | Event::EnemySpawned { .. }
        | Event::ProjectileFired { .. }
        | Event::ProjectileHit { .. }
        | Event::AbilitySelected { .. }
        | Event::AbilityRejected { .. }
        | Event::PlacementRejected { .. }
        | Event::PlacementCancelled { .. }
        | Event::WaveRejected { .. }
        | Event::Paused
        | Event::Resumed => None,
    }
}
