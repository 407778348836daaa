// squadline entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; stdout carries JSON results only)
// 2. Load config (copying defaults on first run)
// 3. Open database, load the player pool
// 4. Run the requested subcommand and print its result as JSON

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use squadline_core::config::{self, Config};
use squadline_core::db::{Database, SaveOutcome};
use squadline_core::lineup::bonus::{BonusHistory, RawBonusSelection};
use squadline_core::lineup::engine::{EvaluatedLineup, LineupEngine, LineupRejection, SaveLineupCommand};
use squadline_core::lineup::export::export_lineup;
use squadline_core::lineup::player::CurrentPoints;
use squadline_core::lineup::preview::preview_bonus;
use squadline_core::pool::{load_player_pool, PlayerPool};

/// Exit status for a lineup the engine or the store refused.
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "squadline")]
#[command(about = "Validate, score and save fantasy football lineups", long_about = None)]
struct Cli {
    /// Directory holding config/ and defaults/
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load players from CSV into the database
    ImportPlayers {
        /// Player CSV (defaults to data_paths.players from league.toml)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Check a lineup and print its cost and points
    Validate {
        /// Save-lineup JSON file, or `-` for stdin
        #[arg(long)]
        lineup: PathBuf,

        /// Check bonus eligibility against this user's season history
        #[arg(long)]
        user: Option<String>,
    },

    /// Compare points with and without a bonus
    PreviewBonus {
        /// Save-lineup JSON file, or `-` for stdin
        #[arg(long)]
        lineup: PathBuf,

        /// Bonus name (ławka_punktuje, kapitanów_2, joker)
        #[arg(long)]
        bonus: String,

        /// Joker: starter to take out
        #[arg(long)]
        swap_out: Option<u32>,

        /// Joker: player to bring in
        #[arg(long)]
        swap_in: Option<u32>,

        /// Double captain: player ids to double alongside the captain
        #[arg(long, value_delimiter = ',')]
        alternative_captains: Option<Vec<u32>>,

        #[arg(long)]
        user: Option<String>,
    },

    /// Validate and save a lineup for a user
    Save {
        #[arg(long)]
        user: String,

        /// Save-lineup JSON file, or `-` for stdin
        #[arg(long)]
        lineup: PathBuf,
    },

    /// Show saved lineups, remaining saves and bonus status for a gameweek
    Usage {
        #[arg(long)]
        user: String,

        #[arg(long)]
        gameweek: u32,
    },

    /// Print a lineup as plain text
    Export {
        /// Save-lineup JSON file, or `-` for stdin
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        lineup: Option<PathBuf>,

        /// Id of a saved lineup
        #[arg(long)]
        id: Option<i64>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(&cli.base_dir)?;
    info!("squadline starting up");

    let config = config::load_config_in(&cli.base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, budget cap {}M, {} lineups per gameweek",
        config.league.name, config.league.budget_cap, config.league.max_lineups_per_gameweek
    );

    let db_path = resolve(&cli.base_dir, &config.db_path);
    let db = Database::open(&db_path.to_string_lossy()).context("failed to open database")?;
    let engine = LineupEngine::new(config.rules());

    match cli.command {
        Commands::ImportPlayers { csv } => {
            let path = csv.unwrap_or_else(|| resolve(&cli.base_dir, &config.data_paths.players));
            let pool = load_player_pool(&path).context("failed to load player CSV")?;
            let imported = db.import_players(&pool)?;
            print_json(&json!({ "imported": imported, "source": path.display().to_string() }))?;
        }

        Commands::Validate { lineup, user } => {
            let command = read_command(&lineup)?;
            let players = player_pool(&db, &cli.base_dir, &config)?;
            let history = history_for(&db, user.as_deref())?;
            return report(engine.evaluate(&command, &players, &history, &CurrentPoints));
        }

        Commands::PreviewBonus {
            lineup,
            bonus,
            swap_out,
            swap_in,
            alternative_captains,
            user,
        } => {
            let command = read_command(&lineup)?;
            let players = player_pool(&db, &cli.base_dir, &config)?;
            let history = history_for(&db, user.as_deref())?;
            let selection = RawBonusSelection {
                bonus_type: bonus,
                alternative_captains,
                swap_out,
                swap_in,
            };
            return report(preview_bonus(
                &engine,
                &command,
                &selection,
                &players,
                &history,
                &CurrentPoints,
            ));
        }

        Commands::Save { user, lineup } => {
            let command = read_command(&lineup)?;
            let players = player_pool(&db, &cli.base_dir, &config)?;
            let history = db.bonus_history(&user)?;
            let evaluated = match engine.evaluate(&command, &players, &history, &CurrentPoints) {
                Ok(evaluated) => evaluated,
                Err(rejection) => return rejected(&rejection),
            };
            let limit = config.league.max_lineups_per_gameweek;
            match db.save_lineup(&user, &evaluated, limit)? {
                SaveOutcome::Saved { lineup_id, usage } => {
                    print_json(&json!({
                        "status": "saved",
                        "lineup_id": lineup_id,
                        "usage": usage,
                        "totals": evaluated.totals,
                    }))?;
                }
                SaveOutcome::LimitReached(e) => return rejected(&LineupRejection::single(e.to_issue())),
                SaveOutcome::BonusAlreadyUsed(e) => {
                    return rejected(&LineupRejection::single(e.to_issue()))
                }
            }
        }

        Commands::Usage { user, gameweek } => {
            let limit = config.league.max_lineups_per_gameweek;
            print_json(&json!({
                "lineups": db.list_lineups(&user, gameweek)?,
                "usage": db.usage_summary(&user, gameweek, limit)?,
                "bonuses": db.bonus_history(&user)?.statuses(),
            }))?;
        }

        Commands::Export { lineup, id } => {
            let players = player_pool(&db, &cli.base_dir, &config)?;
            let evaluated: EvaluatedLineup = match (lineup, id) {
                (_, Some(id)) => match db.load_lineup(id)? {
                    Some(evaluated) => evaluated,
                    None => bail!("no saved lineup with id {id}"),
                },
                (Some(path), None) => {
                    let command = read_command(&path)?;
                    match engine.evaluate(&command, &players, &BonusHistory::new(), &CurrentPoints) {
                        Ok(evaluated) => evaluated,
                        Err(rejection) => return rejected(&rejection),
                    }
                }
                (None, None) => bail!("either --lineup or --id is required"),
            };
            println!("{}", export_lineup(&evaluated, &players));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(base_dir: &Path) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("squadline.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squadline=info,squadline_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

/// Relative paths in league.toml are taken relative to `base_dir`.
fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn read_command(path: &Path) -> Result<SaveLineupCommand> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read lineup from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lineup file {}", path.display()))?
    };
    serde_json::from_str(&text).context("lineup JSON does not match the save-lineup format")
}

/// Players from the database; falls back to the configured CSV when the
/// table is still empty.
fn player_pool(db: &Database, base_dir: &Path, config: &Config) -> Result<PlayerPool> {
    let pool = db.load_players()?;
    if !pool.is_empty() {
        return Ok(pool);
    }
    let path = resolve(base_dir, &config.data_paths.players);
    warn!("player table is empty, importing {}", path.display());
    let pool = load_player_pool(&path).context("failed to load player CSV")?;
    db.import_players(&pool)?;
    Ok(pool)
}

fn history_for(db: &Database, user: Option<&str>) -> Result<BonusHistory> {
    match user {
        Some(user) => db.bonus_history(user),
        None => Ok(BonusHistory::new()),
    }
}

fn report<T: Serialize>(result: Result<T, LineupRejection>) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            print_json(&json!({ "status": "ok", "result": value }))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(rejection) => rejected(&rejection),
    }
}

fn rejected(rejection: &LineupRejection) -> Result<ExitCode> {
    print_json(&json!({ "status": "rejected", "issues": rejection.issues }))?;
    Ok(ExitCode::from(EXIT_REJECTED))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}
