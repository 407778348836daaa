// Player pool: the in-memory player table and its CSV loader.
//
// CSV columns: id,name,team,position,price,health_status,fantasy_points.
// Extra columns are ignored. Rows that fail to parse or validate are skipped
// with a warning.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::lineup::player::{HealthStatus, Player, PlayerId, PlayerLookup, Position};

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Players keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerPool {
    players: HashMap<PlayerId, Player>,
}

impl PlayerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a player. Returns the previous record, if any.
    pub fn insert(&mut self, player: Player) -> Option<Player> {
        self.players.insert(player.id, player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in id order.
    pub fn sorted(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.id);
        players
    }
}

impl PlayerLookup for PlayerPool {
    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.get(id)
    }
}

impl FromIterator<Player> for PlayerPool {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        let mut pool = PlayerPool::new();
        for player in iter {
            pool.insert(player);
        }
        pool
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    id: PlayerId,
    name: String,
    #[serde(default)]
    team: String,
    position: String,
    price: f64,
    #[serde(default)]
    health_status: String,
    #[serde(default)]
    fantasy_points: f64,
}

fn load_pool_from_reader<R: Read>(rdr: R) -> Result<PlayerPool, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut pool = PlayerPool::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };

        let name = raw.name.trim();
        if name.is_empty() {
            warn!("skipping player {}: empty name", raw.id);
            continue;
        }
        if !raw.price.is_finite() || raw.price < 0.0 {
            warn!("skipping player '{}': invalid price {}", name, raw.price);
            continue;
        }
        if !raw.fantasy_points.is_finite() {
            warn!("skipping player '{}': non-finite fantasy points", name);
            continue;
        }
        let Some(position) = Position::from_str_pos(&raw.position) else {
            warn!("skipping player '{}': unknown position '{}'", name, raw.position);
            continue;
        };
        let health_status = if raw.health_status.trim().is_empty() {
            HealthStatus::Fit
        } else if let Some(status) = HealthStatus::from_label(&raw.health_status) {
            status
        } else {
            warn!(
                "skipping player '{}': unknown health status '{}'",
                name, raw.health_status
            );
            continue;
        };

        let player = Player {
            id: raw.id,
            name: name.to_string(),
            team: raw.team.trim().to_string(),
            position,
            price: raw.price,
            health_status,
            fantasy_points: raw.fantasy_points,
        };
        if pool.insert(player).is_some() {
            warn!("duplicate player id {}, using latest row", raw.id);
        }
    }
    Ok(pool)
}

/// Load the player pool from a CSV file. An empty result is an error.
pub fn load_player_pool(path: &Path) -> Result<PlayerPool, PoolError> {
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let pool = load_pool_from_reader(file).map_err(|e| PoolError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;

    if pool.is_empty() {
        return Err(PoolError::Validation(format!(
            "player CSV {} produced zero valid rows",
            path.display()
        )));
    }

    info!(players = pool.len(), path = %path.display(), "loaded player pool");
    Ok(pool)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
