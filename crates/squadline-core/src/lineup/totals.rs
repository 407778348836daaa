// Lineup cost and points aggregation.

use serde::{Deserialize, Serialize};

use super::bonus::BonusEffect;
use super::captaincy::Captaincy;
use super::player::{PlayerLookup, PointsSource};
use super::roster::squad_cost;
use super::squad::Squad;

/// Cost and points figures for one lineup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineupTotals {
    /// Price of all fifteen players.
    pub total_cost: f64,
    /// Starting points with multipliers, plus bench points when they count.
    pub total_points: f64,
    /// Starting XI contribution, multipliers included.
    pub starting_points: f64,
    /// Bench contribution actually counted (zero without the bench boost).
    pub bench_points: f64,
}

/// Sum cost and points for `squad`.
///
/// Starters score `points × multiplier` (captain ×2, vice-captain ×2 under the
/// double-captain bonus). Bench players add their raw points only when the
/// bench boost is active. For a joker, pass the swapped squad and the
/// captaincy resolved on it.
pub fn compute_totals<L, P>(
    squad: &Squad,
    players: &L,
    captaincy: &Captaincy,
    effect: Option<&BonusEffect>,
    points: &P,
) -> LineupTotals
where
    L: PlayerLookup,
    P: PointsSource + ?Sized,
{
    let double_captain = effect.is_some_and(BonusEffect::doubles_vice_captain);
    let bench_counts = effect.is_some_and(BonusEffect::counts_bench);

    let starting_points: f64 = squad
        .starting()
        .filter_map(|a| players.player(a.player_id).map(|p| (a, p)))
        .map(|(a, p)| points.score(p) * f64::from(captaincy.multiplier(a.player_id, double_captain)))
        .sum();

    let bench_points: f64 = if bench_counts {
        squad
            .bench()
            .filter_map(|a| players.player(a.player_id))
            .map(|p| points.score(p))
            .sum()
    } else {
        0.0
    };

    LineupTotals {
        total_cost: squad_cost(squad, players),
        total_points: starting_points + bench_points,
        starting_points,
        bench_points,
    }
}
