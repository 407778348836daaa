// League-wide limits the engine checks against.

use serde::{Deserialize, Serialize};

/// Squad budget cap in millions.
pub const DEFAULT_BUDGET_CAP: f64 = 30.0;

/// Saved lineups a user may keep per gameweek.
pub const DEFAULT_MAX_LINEUPS_PER_GAMEWEEK: u32 = 3;

/// Tolerance for money comparisons. Prices carry at most two decimals.
pub const MONEY_EPSILON: f64 = 1e-9;

/// Maximum accepted gap between a caller-declared cost and the recomputed one.
pub const DECLARED_COST_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquadRules {
    pub budget_cap: f64,
    pub max_lineups_per_gameweek: u32,
}

impl Default for SquadRules {
    fn default() -> Self {
        Self {
            budget_cap: DEFAULT_BUDGET_CAP,
            max_lineups_per_gameweek: DEFAULT_MAX_LINEUPS_PER_GAMEWEEK,
        }
    }
}
