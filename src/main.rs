//! Mines engine command line
//!
//! Offline tools around the engine: verify a finished game from its
//! disclosed seeds, audit an exported archive, print multiplier tables, run
//! simulations and manage configuration files.

use clap::{Parser, Subcommand};
use mines_engine::{
    common::config::{generate_sample_config, ConfigLoader},
    events::GameEvent,
    games::fairness::{verify_game, VerificationRequest},
    simulation::{SimulationConfig, Simulator},
    Amount, Difficulty, EngineConfig, GameArchive, GameParams, MemoryArchive, MinesEngine, SystemClock,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mines-engine")]
#[command(about = "Provably fair Mines wagering engine", long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-derive a finished game's board from its disclosed seeds
    Verify {
        /// Disclosed server seed (hex)
        #[arg(long)]
        server_seed: String,

        /// Client seed as entered by the player
        #[arg(long)]
        client_seed: String,

        #[arg(long)]
        nonce: u64,

        #[arg(long, default_value_t = 25)]
        tiles: u32,

        #[arg(long, default_value_t = 5)]
        mines: u32,

        /// Server seed hash published before the game
        #[arg(long)]
        expected_hash: Option<String>,
    },

    /// Re-verify every game in an archive exported by `simulate --archive`
    Audit {
        /// JSON lines file, one settlement record per line
        path: String,
    },

    /// Print the multiplier for every number of safe reveals
    Multipliers {
        #[arg(long, default_value_t = 25)]
        tiles: u32,

        /// Mine count; overridden by --difficulty
        #[arg(long, default_value_t = 5)]
        mines: u32,

        /// easy, medium, hard or expert
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },

    /// Play automated games and report the realised return to player
    Simulate {
        #[arg(short = 'g', long, default_value_t = 10_000)]
        games: usize,

        #[arg(short = 'p', long, default_value_t = 8)]
        players: usize,

        #[arg(long, default_value_t = 25)]
        tiles: u32,

        #[arg(long, default_value_t = 5)]
        mines: u32,

        /// Safe reveals before cashing out
        #[arg(short = 'k', long, default_value_t = 3)]
        reveal_target: u32,

        /// Stake per game in tokens
        #[arg(short = 's', long, default_value = "1")]
        stake: String,

        #[arg(long, default_value_t = 7)]
        strategy_seed: u64,

        /// Export every settled game as JSON lines
        #[arg(long)]
        archive: Option<String>,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a configuration file with every default spelled out
    Generate {
        #[arg(default_value = "mines.toml")]
        path: String,
    },
    /// Load, apply environment overrides and validate
    Check,
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let loader = match path {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

fn init_tracing(config: &EngineConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mines_engine={}", config.monitoring.log_level.as_filter()).into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Config {
        action: ConfigAction::Generate { path },
    } = &cli.command
    {
        generate_sample_config(path)?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config);

    match cli.command {
        Commands::Verify {
            server_seed,
            client_seed,
            nonce,
            tiles,
            mines,
            expected_hash,
        } => run_verify(VerificationRequest {
            server_seed,
            client_seed: client_seed.into_bytes(),
            nonce,
            tile_count: tiles,
            mine_count: mines,
            expected_server_seed_hash: expected_hash,
        })?,
        Commands::Audit { path } => run_audit(&path)?,
        Commands::Multipliers {
            tiles,
            mines,
            difficulty,
        } => {
            let params = match difficulty {
                Some(d) => d.params(),
                None => GameParams { tile_count: tiles, mine_count: mines },
            };
            run_multipliers(config, params)?;
        }
        Commands::Simulate {
            games,
            players,
            tiles,
            mines,
            reveal_target,
            stake,
            strategy_seed,
            archive,
        } => {
            let stake = Amount::parse_tokens(&stake).ok_or_else(|| format!("invalid stake '{}'", stake))?;
            let simulation = SimulationConfig {
                params: GameParams::new(tiles, mines)?,
                stake,
                reveal_target,
                games,
                players,
                strategy_seed,
            };
            run_simulation(config, simulation, archive).await?;
        }
        Commands::Config { action: ConfigAction::Check } => {
            println!("Configuration is valid");
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_verify(request: VerificationRequest) -> Result<(), Box<dyn std::error::Error>> {
    let report = verify_game(&request)?;
    println!("Server seed hash: {}", report.server_seed_hash);
    match report.commitment_matches {
        Some(true) => println!("Commitment:       matches published hash"),
        Some(false) => println!("Commitment:       DOES NOT MATCH published hash"),
        None => println!("Commitment:       not checked (no --expected-hash)"),
    }
    println!("Game digest:      {}", report.digest);
    println!("Mine positions:   {:?}", report.mine_positions);

    if report.commitment_matches == Some(false) {
        return Err("server seed does not match the published commitment".into());
    }
    Ok(())
}

fn run_multipliers(config: EngineConfig, params: GameParams) -> Result<(), Box<dyn std::error::Error>> {
    let engine = MinesEngine::new(config)?;
    let table = engine.multiplier_table(params.tile_count, params.mine_count)?;
    let calculator = engine.calculator();

    println!(
        "{} (house edge {} ppm, {} decimals)",
        params,
        calculator.house_edge_ppm(),
        calculator.precision()
    );
    println!("{:>8} {:>16} {:>16} {:>10}", "reveals", "multiplier", "fair", "survival");
    for step in table {
        println!(
            "{:>8} {:>16} {:>16} {:>9.4}%",
            step.revealed,
            step.multiplier.to_string(),
            step.fair_multiplier.to_string(),
            step.survival_probability * 100.0
        );
    }
    Ok(())
}

fn run_audit(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let archive = MemoryArchive::new();
    let imported = archive.import_jsonl(BufReader::new(File::open(path)?))?;

    let mut failed = 0usize;
    for player in archive.players() {
        for record in archive.history(&player) {
            if !record.verify()? {
                warn!(game_id = %record.game_id, player = %player, "Archived game does not verify");
                failed += 1;
            }
        }
    }

    println!("Games audited:    {}", imported);
    println!("Players:          {}", archive.players().len());
    println!("Failed:           {}", failed);
    if failed > 0 {
        return Err(format!("{} archived games failed verification", failed).into());
    }
    Ok(())
}

async fn run_simulation(
    config: EngineConfig,
    simulation: SimulationConfig,
    archive_path: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let archive = Arc::new(MemoryArchive::new());
    let engine = Arc::new(MinesEngine::with_components(config, Arc::new(SystemClock), archive.clone())?);

    // Count settlements off the event stream while the games run
    let mut events = engine.subscribe();
    let observer = tokio::spawn(async move {
        let mut ended = 0u64;
        loop {
            match events.recv().await {
                Ok(event) => {
                    if matches!(event.event, GameEvent::GameEnded { .. }) {
                        ended += 1;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Simulation observer lagged; skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        ended
    });

    let worker = Arc::clone(&engine);
    let report = tokio::task::spawn_blocking(move || Simulator::new(&worker, simulation).run()).await??;
    let metrics = engine.metrics();
    drop(engine);
    let observed = observer.await?;

    info!(observed, active_games = metrics.active_games(), "Settlement events observed");
    if let Some(path) = archive_path {
        let written = archive.export_jsonl(BufWriter::new(File::create(&path)?))?;
        println!("Archived {} games to {}", written, path);
    }
    println!("Games played:     {}", report.games_played);
    println!("Lost / cashed / perfect: {} / {} / {}", report.games_lost, report.games_cashed_out, report.perfect_games);
    println!("Win rate:         {:.2}%", report.win_rate() * 100.0);
    println!("Wagered:          {}", report.total_wagered);
    println!("Paid out:         {}", report.total_paid_out);
    println!("Realised RTP:     {:.4}", report.realised_rtp);
    println!("Expected RTP:     {:.4}", report.expected_rtp);
    println!("Verified games:   {}/{}", report.verified_games, report.games_played);
    println!("Elapsed:          {:?}", report.execution_time);
    Ok(())
}
