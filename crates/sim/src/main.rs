//! Headless battle simulator.
//!
//! Loads combat content, runs one automated battle with the built-in
//! [`AutoPlayer`] and prints the battle log to stdout. Developer logs go to
//! stderr through `tracing` (filter with `RUST_LOG`).
//!
//! # Examples
//!
//! ```bash
//! cargo run -p battle-sim -- --enemy golem --style ap_combo --seed 7
//! SIM_QTE_TOLERANCE=-1 cargo run -p battle-sim   # never confirm timing challenges
//! ```
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use combat_content::ContentFactory;
use combat_core::StyleKind;
use runtime::{AutoPlayer, BattleEvent, BattleSession, TurnReport, play_turn};

use config::SimConfig;

/// Run one automated battle and print its log.
#[derive(Parser, Debug)]
#[command(name = "battle-sim")]
#[command(version)]
struct Cli {
    /// Content directory (config.toml and RON catalogs)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Battle style: type_pp or ap_combo
    #[arg(long)]
    style: Option<StyleKind>,

    /// Player combatant id
    #[arg(long)]
    player: Option<String>,

    /// Enemy combatant id
    #[arg(long)]
    enemy: Option<String>,

    /// Terrain id
    #[arg(long)]
    terrain: Option<String>,

    /// Auto-confirm distance from marker center; negative never confirms
    #[arg(long, allow_hyphen_values = true)]
    qte_tolerance: Option<f32>,

    /// Rounds before the battle is aborted
    #[arg(long)]
    turn_cap: Option<u32>,

    /// Print the structured event log after the battle
    #[arg(long)]
    events: bool,
}

impl Cli {
    fn apply(self, mut config: SimConfig) -> SimConfig {
        if let Some(dir) = self.data_dir {
            config.data_dir = Some(dir);
        }
        config.seed = self.seed.or(config.seed);
        config.style = self.style.or(config.style);
        if let Some(player) = self.player {
            config.player = player;
        }
        if let Some(enemy) = self.enemy {
            config.enemy = enemy;
        }
        config.terrain = self.terrain.or(config.terrain);
        if let Some(tolerance) = self.qte_tolerance {
            config.qte_tolerance = tolerance;
        }
        if let Some(cap) = self.turn_cap {
            config.turn_cap = cap.max(1);
        }
        config
    }
}

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let print_events = cli.events;
    let config = cli.apply(SimConfig::from_env());

    setup_logging();
    tracing::debug!(?config, "simulator configuration");

    let mut session = build_session(&config)?;
    let events = run(&mut session, &config)?;

    if print_events {
        for event in &events {
            println!("{event:?}");
        }
    }
    Ok(())
}

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_session(config: &SimConfig) -> Result<BattleSession> {
    let factory = match &config.data_dir {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::bundled(),
    };
    tracing::info!(data_dir = %factory.data_dir().display(), "loading content");

    let combat = factory.load_config()?;
    let tables = factory.load_tables()?;

    let mut builder = BattleSession::builder()
        .tables(tables)
        .combat_config(combat)
        .player(config.player.clone())
        .enemy(config.enemy.clone());
    if let Some(style) = config.style {
        builder = builder.style(style);
    }
    if let Some(terrain) = &config.terrain {
        builder = builder.terrain(terrain.clone());
    }
    if let Some(seed) = config.seed {
        builder = builder.seed(seed);
    }
    builder.build().context("Failed to build battle session")
}

fn run(session: &mut BattleSession, config: &SimConfig) -> Result<Vec<BattleEvent>> {
    let mut player = AutoPlayer::new(config.qte_tolerance);
    let mut events = Vec::new();

    println!(
        "{} vs {} ({})",
        session.view().player.name,
        session.view().enemy.name,
        session.style().kind()
    );

    while !session.is_over() {
        if session.turn() > config.turn_cap {
            tracing::info!(cap = config.turn_cap, "turn cap reached");
            print_report(&session.abort());
            break;
        }

        let view = session.view();
        println!(
            "\n-- Turn {} -- {} {}/{} HP | {} {}/{} HP",
            view.turn,
            view.player.name,
            view.player.hp,
            view.player.max_hp,
            view.enemy.name,
            view.enemy.hp,
            view.enemy.max_hp
        );
        if let Some(intent) = &view.intent {
            println!(
                "   {} {} in {} turn(s). {}",
                intent.icon, intent.name, intent.turns_remaining, intent.counter_hint
            );
        }

        for report in play_turn(session, &mut player, config.tick_ms)? {
            print_report(&report);
        }
        events.extend(session.drain_events());
    }
    events.extend(session.drain_events());

    if let Some(result) = session.result() {
        println!("\nResult: {result:?} after {} turn(s)", session.turn());
    }
    Ok(events)
}

fn print_report(report: &TurnReport) {
    for outcome in &report.qte {
        println!("   [{}: {:?}]", outcome.kind, outcome.zone);
    }
    for line in &report.messages {
        println!("   {line}");
    }
}
