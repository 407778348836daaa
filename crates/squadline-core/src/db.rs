// SQLite persistence layer for players, saved lineups, and bonus usage.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::lineup::bonus::{ensure_available, BonusEffect, BonusError, BonusHistory, BonusType};
use crate::lineup::engine::EvaluatedLineup;
use crate::lineup::player::{HealthStatus, Player, PlayerId, Position};
use crate::lineup::usage::{check_usage_with_limit, UsageError, UsageSummary};
use crate::pool::PlayerPool;

/// Result of a save attempt. Limit and bonus refusals are normal outcomes,
/// not errors; `Err` is reserved for storage failures.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { lineup_id: i64, usage: UsageSummary },
    LimitReached(UsageError),
    BonusAlreadyUsed(BonusError),
}

/// One row of a user's saved lineups for a gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLineup {
    pub id: i64,
    pub name: String,
    pub gameweek_id: u32,
    pub formation: String,
    pub is_active: bool,
    pub total_cost: f64,
    pub total_points: f64,
    pub bonus: Option<BonusType>,
    pub created_at: String,
}

/// SQLite-backed store for the player table, saved lineups, their
/// assignments, and the season's bonus usage.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id             INTEGER PRIMARY KEY,
                name           TEXT NOT NULL,
                team           TEXT NOT NULL,
                position       TEXT NOT NULL,
                price          REAL NOT NULL,
                health_status  TEXT NOT NULL,
                fantasy_points REAL NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS lineups (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id      TEXT NOT NULL,
                name         TEXT NOT NULL,
                gameweek_id  INTEGER NOT NULL,
                formation    TEXT NOT NULL,
                is_active    INTEGER NOT NULL,
                total_cost   REAL NOT NULL,
                total_points REAL NOT NULL,
                snapshot     TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_lineups_user_gameweek
                ON lineups(user_id, gameweek_id);

            CREATE TABLE IF NOT EXISTS lineup_players (
                lineup_id  INTEGER NOT NULL REFERENCES lineups(id) ON DELETE CASCADE,
                player_id  INTEGER NOT NULL,
                role       TEXT NOT NULL,
                is_captain INTEGER NOT NULL DEFAULT 0,
                is_vice    INTEGER NOT NULL DEFAULT 0,
                is_locked  INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (lineup_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS lineup_bonuses (
                lineup_id   INTEGER PRIMARY KEY REFERENCES lineups(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL,
                bonus_type  TEXT NOT NULL,
                gameweek_id INTEGER NOT NULL,
                swap_out    INTEGER,
                swap_in     INTEGER,
                applied_at  TEXT NOT NULL,
                UNIQUE (user_id, bonus_type)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection, recovering from a poisoned lock.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Insert a player or overwrite the row with the same id.
    pub fn upsert_player(&self, player: &Player) -> Result<()> {
        let conn = self.conn();
        upsert_player_row(&conn, player)
    }

    /// Write every player of `pool` in a single transaction. Returns the
    /// number of rows written.
    pub fn import_players(&self, pool: &PlayerPool) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        let players = pool.sorted();
        for player in &players {
            upsert_player_row(&tx, player)?;
        }
        tx.commit().context("failed to commit player import")?;
        info!(players = players.len(), "imported players");
        Ok(players.len())
    }

    /// Load the full player table.
    pub fn load_players(&self) -> Result<PlayerPool> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, team, position, price, health_status, fantasy_points
                 FROM players ORDER BY id",
            )
            .context("failed to prepare load_players query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, PlayerId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, f64>(6)?,
                ))
            })
            .context("failed to query players")?;

        let mut pool = PlayerPool::new();
        for row in rows {
            let (id, name, team, position, price, health, fantasy_points) =
                row.context("failed to read player row")?;
            let position = Position::from_str_pos(&position)
                .ok_or_else(|| anyhow!("player {id} has unknown position '{position}'"))?;
            let health_status = HealthStatus::from_label(&health)
                .ok_or_else(|| anyhow!("player {id} has unknown health status '{health}'"))?;
            pool.insert(Player {
                id,
                name,
                team,
                position,
                price,
                health_status,
                fantasy_points,
            });
        }
        Ok(pool)
    }

    // ------------------------------------------------------------------
    // Usage and bonus history
    // ------------------------------------------------------------------

    /// Number of lineups `user_id` has saved for `gameweek_id`.
    pub fn lineup_count(&self, user_id: &str, gameweek_id: u32) -> Result<u32> {
        let conn = self.conn();
        count_lineups(&conn, user_id, gameweek_id)
    }

    /// Bonuses `user_id` has played this season.
    pub fn bonus_history(&self, user_id: &str) -> Result<BonusHistory> {
        let conn = self.conn();
        read_bonus_history(&conn, user_id)
    }

    pub fn usage_summary(&self, user_id: &str, gameweek_id: u32, limit: u32) -> Result<UsageSummary> {
        Ok(UsageSummary::new(self.lineup_count(user_id, gameweek_id)?, limit))
    }

    // ------------------------------------------------------------------
    // Lineups
    // ------------------------------------------------------------------

    /// Persist an evaluated lineup for `user_id`.
    ///
    /// The saved-lineup count and the bonus history are re-read inside an
    /// IMMEDIATE transaction, so two concurrent saves cannot both pass the
    /// limit or both spend the same bonus. The squad written to
    /// `lineup_players` is the one that scores (after a joker swap).
    pub fn save_lineup(&self, user_id: &str, lineup: &EvaluatedLineup, limit: u32) -> Result<SaveOutcome> {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin save transaction")?;

        let count = count_lineups(&tx, user_id, lineup.gameweek_id)?;
        if let Err(e) = check_usage_with_limit(count, limit) {
            warn!(user_id, gameweek_id = lineup.gameweek_id, "save refused: {e}");
            return Ok(SaveOutcome::LimitReached(e));
        }

        if let Some(effect) = &lineup.bonus {
            let history = read_bonus_history(&tx, user_id)?;
            if let Err(e) = ensure_available(effect.bonus_type(), &history) {
                warn!(user_id, gameweek_id = lineup.gameweek_id, "save refused: {e}");
                return Ok(SaveOutcome::BonusAlreadyUsed(e));
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        let snapshot = serde_json::to_string(lineup).context("failed to serialize lineup")?;
        tx.execute(
            "INSERT INTO lineups
                (user_id, name, gameweek_id, formation, is_active, total_cost, total_points, snapshot, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user_id,
                lineup.name,
                lineup.gameweek_id,
                lineup.formation.to_string(),
                lineup.is_active,
                lineup.totals.total_cost,
                lineup.totals.total_points,
                snapshot,
                now,
            ],
        )
        .context("failed to insert lineup")?;
        let lineup_id = tx.last_insert_rowid();

        for a in &lineup.scoring_squad().assignments {
            tx.execute(
                "INSERT INTO lineup_players (lineup_id, player_id, role, is_captain, is_vice, is_locked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![lineup_id, a.player_id, a.role.as_str(), a.is_captain, a.is_vice, a.is_locked],
            )
            .context("failed to insert lineup player")?;
        }

        if let Some(effect) = &lineup.bonus {
            let (swap_out, swap_in) = match effect {
                BonusEffect::Joker { swap_out, swap_in, .. } => (Some(*swap_out), Some(*swap_in)),
                _ => (None, None),
            };
            tx.execute(
                "INSERT INTO lineup_bonuses (lineup_id, user_id, bonus_type, gameweek_id, swap_out, swap_in, applied_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    lineup_id,
                    user_id,
                    effect.bonus_type().name(),
                    lineup.gameweek_id,
                    swap_out,
                    swap_in,
                    now,
                ],
            )
            .context("failed to record bonus usage")?;
        }

        tx.commit().context("failed to commit lineup save")?;

        let usage = UsageSummary::new(count + 1, limit);
        info!(
            user_id,
            lineup_id,
            gameweek_id = lineup.gameweek_id,
            saved = usage.saved,
            limit = usage.limit,
            "lineup saved"
        );
        Ok(SaveOutcome::Saved { lineup_id, usage })
    }

    /// Saved lineups of `user_id` for `gameweek_id`, oldest first.
    pub fn list_lineups(&self, user_id: &str, gameweek_id: u32) -> Result<Vec<StoredLineup>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT l.id, l.name, l.gameweek_id, l.formation, l.is_active,
                        l.total_cost, l.total_points, b.bonus_type, l.created_at
                 FROM lineups l
                 LEFT JOIN lineup_bonuses b ON b.lineup_id = l.id
                 WHERE l.user_id = ?1 AND l.gameweek_id = ?2
                 ORDER BY l.id",
            )
            .context("failed to prepare list_lineups query")?;

        let rows = stmt
            .query_map(params![user_id, gameweek_id], |row| {
                Ok((
                    StoredLineup {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        gameweek_id: row.get(2)?,
                        formation: row.get(3)?,
                        is_active: row.get(4)?,
                        total_cost: row.get(5)?,
                        total_points: row.get(6)?,
                        bonus: None,
                        created_at: row.get(8)?,
                    },
                    row.get::<_, Option<String>>(7)?,
                ))
            })
            .context("failed to query lineups")?;

        let mut lineups = Vec::new();
        for row in rows {
            let (mut lineup, bonus) = row.context("failed to read lineup row")?;
            lineup.bonus = bonus.and_then(|name| BonusType::from_name(&name).ok());
            lineups.push(lineup);
        }
        Ok(lineups)
    }

    /// Load a saved lineup exactly as it was evaluated.
    pub fn load_lineup(&self, lineup_id: i64) -> Result<Option<EvaluatedLineup>> {
        let conn = self.conn();
        let snapshot: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM lineups WHERE id = ?1",
                params![lineup_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to load lineup")?;

        snapshot
            .map(|s| serde_json::from_str(&s).context("failed to parse lineup snapshot"))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Statement helpers shared by plain connections and transactions
// ---------------------------------------------------------------------------

fn upsert_player_row(conn: &Connection, player: &Player) -> Result<()> {
    conn.execute(
        "INSERT INTO players (id, name, team, position, price, health_status, fantasy_points)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            name           = excluded.name,
            team           = excluded.team,
            position       = excluded.position,
            price          = excluded.price,
            health_status  = excluded.health_status,
            fantasy_points = excluded.fantasy_points",
        params![
            player.id,
            player.name,
            player.team,
            player.position.display_str(),
            player.price,
            player.health_status.label(),
            player.fantasy_points,
        ],
    )
    .with_context(|| format!("failed to upsert player {}", player.id))?;
    Ok(())
}

fn count_lineups(conn: &Connection, user_id: &str, gameweek_id: u32) -> Result<u32> {
    let count: u32 = conn
        .query_row(
            "SELECT COUNT(*) FROM lineups WHERE user_id = ?1 AND gameweek_id = ?2",
            params![user_id, gameweek_id],
            |row| row.get(0),
        )
        .context("failed to count lineups")?;
    Ok(count)
}

fn read_bonus_history(conn: &Connection, user_id: &str) -> Result<BonusHistory> {
    let mut stmt = conn
        .prepare(
            "SELECT bonus_type, gameweek_id FROM lineup_bonuses
             WHERE user_id = ?1 ORDER BY applied_at, lineup_id",
        )
        .context("failed to prepare bonus history query")?;

    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })
        .context("failed to query bonus history")?;

    let mut history = BonusHistory::new();
    for row in rows {
        let (name, gameweek_id) = row.context("failed to read bonus row")?;
        match BonusType::from_name(&name) {
            Ok(bonus) => history.record(bonus, gameweek_id),
            Err(_) => warn!(user_id, "ignoring unknown bonus type '{}' in history", name),
        }
    }
    debug!(user_id, ?history, "loaded bonus history");
    Ok(history)
}
