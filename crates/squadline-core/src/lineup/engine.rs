// End-to-end lineup evaluation: formation, roster, captaincy, bonus, totals.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::bonus::{apply_bonus, BonusContext, BonusEffect, BonusHistory, BonusSelection, RawBonusSelection};
use super::captaincy::{resolve_captaincy, Captaincy};
use super::formation::{parse_formation, FormationQuotas};
use super::issue::{ErrorKind, ValidationIssue};
use super::player::{PlayerLookup, PointsSource};
use super::roster::{squad_cost, validate_roster, ValidatedRoster};
use super::rules::{SquadRules, DECLARED_COST_TOLERANCE, MONEY_EPSILON};
use super::squad::{PlayerAssignment, Squad};
use super::totals::{compute_totals, LineupTotals};

fn default_true() -> bool {
    true
}

/// A request to save a lineup, as sent by the request layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveLineupCommand {
    pub name: String,
    pub formation: String,
    pub gameweek_id: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Cost claimed by the caller. Checked against the recomputed cost.
    pub total_cost: f64,
    pub players: Vec<PlayerAssignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<RawBonusSelection>,
}

/// A lineup that passed every check, annotated for storage and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedLineup {
    pub name: String,
    pub gameweek_id: u32,
    pub is_active: bool,
    pub formation: FormationQuotas,
    /// The squad as submitted, with its cost figures.
    pub roster: ValidatedRoster,
    /// Armbands on the squad that scores (after a joker swap, if any).
    pub captaincy: Captaincy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<BonusEffect>,
    pub totals: LineupTotals,
}

impl EvaluatedLineup {
    /// The roster that scores and gets stored: the joker result if one was
    /// played, otherwise the submitted squad.
    pub fn scoring_roster(&self) -> &ValidatedRoster {
        self.bonus
            .as_ref()
            .and_then(BonusEffect::swapped_roster)
            .unwrap_or(&self.roster)
    }

    pub fn scoring_squad(&self) -> &Squad {
        &self.scoring_roster().squad
    }
}

/// Why a lineup was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("lineup rejected with {} issue(s)", .issues.len())]
pub struct LineupRejection {
    pub issues: Vec<ValidationIssue>,
}

impl LineupRejection {
    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.issues.iter().map(|i| i.kind).collect()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

/// Stateless evaluator. Safe to share between threads; every call is
/// independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineupEngine {
    rules: SquadRules,
}

impl LineupEngine {
    pub fn new(rules: SquadRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SquadRules {
        &self.rules
    }

    /// Run every check on a save command and compute its figures.
    ///
    /// Stages run in order: formation, roster (with the declared cost),
    /// captaincy, bonus, totals. Roster problems are collected together; any
    /// other stage stops at its first problem.
    pub fn evaluate<L, P>(
        &self,
        command: &SaveLineupCommand,
        players: &L,
        history: &BonusHistory,
        points: &P,
    ) -> Result<EvaluatedLineup, LineupRejection>
    where
        L: PlayerLookup,
        P: PointsSource + ?Sized,
    {
        self.run(command, players, history, points).inspect_err(|rejection| {
            debug!(
                name = %command.name,
                gameweek_id = command.gameweek_id,
                kinds = ?rejection.kinds(),
                "lineup rejected"
            );
        })
    }

    fn run<L, P>(
        &self,
        command: &SaveLineupCommand,
        players: &L,
        history: &BonusHistory,
        points: &P,
    ) -> Result<EvaluatedLineup, LineupRejection>
    where
        L: PlayerLookup,
        P: PointsSource + ?Sized,
    {
        let formation = parse_formation(&command.formation).map_err(|e| LineupRejection::single(e.to_issue()))?;
        let squad = Squad::new(command.players.clone());

        let cost_issue = declared_cost_issue(command.total_cost, squad_cost(&squad, players));
        let roster = match validate_roster(&squad, &formation, players, &self.rules) {
            Ok(roster) => roster,
            Err(errors) => {
                let mut issues: Vec<ValidationIssue> = errors.iter().map(|e| e.to_issue()).collect();
                issues.extend(cost_issue);
                return Err(LineupRejection { issues });
            }
        };
        if let Some(issue) = cost_issue {
            return Err(LineupRejection::single(issue));
        }

        let captaincy = resolve_captaincy(&roster.squad).map_err(|e| LineupRejection::single(e.to_issue()))?;

        let bonus = match &command.bonus {
            Some(raw) => {
                let selection =
                    BonusSelection::try_from(raw.clone()).map_err(|e| LineupRejection::single(e.to_issue()))?;
                let ctx = BonusContext {
                    roster: &roster,
                    captaincy: &captaincy,
                    players,
                    rules: &self.rules,
                };
                Some(apply_bonus(&ctx, &selection, history).map_err(|e| LineupRejection::single(e.to_issue()))?)
            }
            None => None,
        };

        // A joker scores the swapped squad, so its armbands are resolved again.
        let (scoring_squad, scoring_captaincy) = match bonus.as_ref().and_then(BonusEffect::swapped_roster) {
            Some(swapped) => {
                let c = resolve_captaincy(&swapped.squad).map_err(|e| LineupRejection::single(e.to_issue()))?;
                (&swapped.squad, c)
            }
            None => (&roster.squad, captaincy),
        };

        let totals = compute_totals(scoring_squad, players, &scoring_captaincy, bonus.as_ref(), points);

        info!(
            name = %command.name,
            gameweek_id = command.gameweek_id,
            formation = %formation,
            total_cost = totals.total_cost,
            total_points = totals.total_points,
            bonus = ?bonus.as_ref().map(BonusEffect::bonus_type),
            "lineup accepted"
        );

        Ok(EvaluatedLineup {
            name: command.name.clone(),
            gameweek_id: command.gameweek_id,
            is_active: command.is_active,
            formation,
            roster,
            captaincy: scoring_captaincy,
            bonus,
            totals,
        })
    }
}

fn declared_cost_issue(declared: f64, computed: f64) -> Option<ValidationIssue> {
    if (declared - computed).abs() <= DECLARED_COST_TOLERANCE + MONEY_EPSILON {
        return None;
    }
    Some(
        ValidationIssue::new(
            ErrorKind::DeclaredCostMismatch,
            format!("declared total cost {declared:.2}M does not match computed {computed:.2}M"),
        )
        .with_field("total_cost"),
    )
}
