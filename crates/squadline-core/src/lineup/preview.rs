// What-if scoring for a candidate bonus.

use serde::{Deserialize, Serialize};

use super::bonus::{BonusEffect, BonusHistory, BonusType, RawBonusSelection};
use super::engine::{EvaluatedLineup, LineupEngine, LineupRejection, SaveLineupCommand};
use super::player::{round2, HealthStatus, PlayerId, PlayerLookup, PointsSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskAssessment {
    Low,
    Medium,
    High,
}

impl RiskAssessment {
    /// Worst case over the health of the players a bonus depends on.
    pub fn from_health<'a>(statuses: impl IntoIterator<Item = &'a HealthStatus>) -> Self {
        statuses
            .into_iter()
            .map(|s| match s {
                HealthStatus::Fit => RiskAssessment::Low,
                HealthStatus::Doubtful => RiskAssessment::Medium,
                HealthStatus::Out => RiskAssessment::High,
            })
            .max()
            .unwrap_or(RiskAssessment::Low)
    }
}

/// A player whose contribution the bonus changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub health_status: HealthStatus,
    /// Points this player adds to the lineup without the bonus.
    pub points_without: f64,
    /// Points this player adds with the bonus played.
    pub points_with: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPreview {
    pub bonus_type: BonusType,
    pub without_bonus: f64,
    pub with_bonus: f64,
    pub difference: f64,
    pub selected_players: Vec<AffectedPlayer>,
    pub risk_assessment: RiskAssessment,
}

/// Evaluate `command` twice, without and with `selection`, and compare.
///
/// Any bonus already on the command is ignored. The candidate bonus goes
/// through the same checks as a real save, season history included. Risk is
/// judged on the players who gain points from the bonus.
pub fn preview_bonus<L, P>(
    engine: &LineupEngine,
    command: &SaveLineupCommand,
    selection: &RawBonusSelection,
    players: &L,
    history: &BonusHistory,
    points: &P,
) -> Result<BonusPreview, LineupRejection>
where
    L: PlayerLookup,
    P: PointsSource + ?Sized,
{
    let bonus_type =
        BonusType::from_name(&selection.bonus_type).map_err(|e| LineupRejection::single(e.to_issue()))?;

    let mut base = command.clone();
    base.bonus = None;
    let without = engine.evaluate(&base, players, history, points)?;

    let mut boosted = command.clone();
    boosted.bonus = Some(selection.clone());
    let with = engine.evaluate(&boosted, players, history, points)?;

    let selected_players: Vec<AffectedPlayer> = affected_ids(&with)
        .into_iter()
        .filter_map(|id| players.player(id))
        .map(|p| AffectedPlayer {
            id: p.id,
            name: p.name.clone(),
            health_status: p.health_status,
            points_without: contribution(&without, p.id, players, points),
            points_with: contribution(&with, p.id, players, points),
        })
        .collect();

    let risk_assessment = RiskAssessment::from_health(
        selected_players
            .iter()
            .filter(|a| a.points_with > a.points_without)
            .map(|a| &a.health_status),
    );

    Ok(BonusPreview {
        bonus_type,
        without_bonus: without.totals.total_points,
        with_bonus: with.totals.total_points,
        difference: round2(with.totals.total_points - without.totals.total_points),
        selected_players,
        risk_assessment,
    })
}

fn affected_ids(lineup: &EvaluatedLineup) -> Vec<PlayerId> {
    match &lineup.bonus {
        Some(BonusEffect::BenchBoost) => lineup.scoring_squad().bench().map(|a| a.player_id).collect(),
        Some(BonusEffect::DoubleCaptain { vice_captain_id }) => vec![*vice_captain_id],
        Some(BonusEffect::Joker { swap_out, swap_in, .. }) => vec![*swap_out, *swap_in],
        None => Vec::new(),
    }
}

/// Points a single player adds to an evaluated lineup.
fn contribution<L, P>(lineup: &EvaluatedLineup, id: PlayerId, players: &L, points: &P) -> f64
where
    L: PlayerLookup,
    P: PointsSource + ?Sized,
{
    let Some(player) = players.player(id) else {
        return 0.0;
    };
    let Some(assignment) = lineup.scoring_squad().get(id) else {
        return 0.0;
    };
    let effect = lineup.bonus.as_ref();
    if assignment.is_starting() {
        let double_captain = effect.is_some_and(BonusEffect::doubles_vice_captain);
        points.score(player) * f64::from(lineup.captaincy.multiplier(id, double_captain))
    } else if effect.is_some_and(BonusEffect::counts_bench) {
        points.score(player)
    } else {
        0.0
    }
}
