// Configuration loading and parsing (league.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::lineup::rules::{SquadRules, DEFAULT_BUDGET_CAP, DEFAULT_MAX_LINEUPS_PER_GAMEWEEK};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

impl Config {
    /// Limits handed to the lineup engine.
    pub fn rules(&self) -> SquadRules {
        SquadRules {
            budget_cap: self.league.budget_cap,
            max_lineups_per_gameweek: self.league.max_lineups_per_gameweek,
        }
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    database: DatabaseConfig,
    #[serde(default)]
    data_paths: DataPaths,
}

fn default_budget_cap() -> f64 {
    DEFAULT_BUDGET_CAP
}

fn default_max_lineups() -> u32 {
    DEFAULT_MAX_LINEUPS_PER_GAMEWEEK
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    #[serde(default = "default_budget_cap")]
    pub budget_cap: f64,
    #[serde(default = "default_max_lineups")]
    pub max_lineups_per_gameweek: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseConfig {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            players: "data/players.csv".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` relative to
/// `base_dir`.
///
/// Does not seed from defaults; startup goes through `load_config_in`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let league_path = base_dir.join("config").join("league.toml");
    let league_text = read_file(&league_path)?;
    let file: LeagueFile = toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
        path: league_path.clone(),
        source: e,
    })?;

    let config = Config {
        league: file.league,
        db_path: file.database.path,
        data_paths: file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

const LEAGUE_FILE: &str = "league.toml";

/// Seed `config/league.toml` from `defaults/league.toml` on first run.
/// Returns whether a copy was made; an existing file is never touched.
pub fn ensure_league_file(base_dir: &Path) -> Result<bool, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join(LEAGUE_FILE);
    if target.exists() {
        return Ok(false);
    }

    let source = base_dir.join("defaults").join(LEAGUE_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "{LEAGUE_FILE} is in neither config/ nor defaults/ under {}",
                base_dir.display()
            ),
        });
    }

    let seed_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to seed {}: {e}", target.display()),
    };
    std::fs::create_dir_all(&config_dir).map_err(seed_err)?;
    std::fs::copy(&source, &target).map_err(seed_err)?;
    Ok(true)
}

/// Load config relative to `base_dir`, seeding league.toml first.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_league_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let cap = config.league.budget_cap;
    if !cap.is_finite() || cap <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "league.budget_cap".into(),
            message: format!("must be a positive number, got {cap}"),
        });
    }

    if config.league.max_lineups_per_gameweek == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.max_lineups_per_gameweek".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
