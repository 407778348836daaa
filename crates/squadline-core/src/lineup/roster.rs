// Squad composition checks: size, membership, uniqueness, formation, budget.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::formation::FormationQuotas;
use super::issue::{ErrorKind, ValidationIssue};
use super::player::{round2, PlayerId, PlayerLookup, Position};
use super::rules::{SquadRules, MONEY_EPSILON};
use super::squad::{Squad, BENCH_SIZE, SQUAD_SIZE, STARTING_SIZE};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RosterError {
    #[error("squad must have 15 players (11 starting, 4 bench), got {total} ({starting} starting, {bench} bench)")]
    WrongSquadSize {
        total: usize,
        starting: usize,
        bench: usize,
    },

    #[error("unknown player id {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("player {player_id} appears more than once")]
    DuplicatePlayer { player_id: PlayerId },

    #[error("formation needs {expected} starting {position}, got {actual}")]
    FormationMismatch {
        position: Position,
        expected: usize,
        actual: usize,
    },

    #[error("squad costs {total_cost:.2}M, {overage:.2}M over the {budget_cap:.2}M cap")]
    BudgetExceeded {
        total_cost: f64,
        budget_cap: f64,
        overage: f64,
    },
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RosterError::WrongSquadSize { .. } => ErrorKind::WrongSquadSize,
            RosterError::UnknownPlayer { .. } => ErrorKind::UnknownPlayer,
            RosterError::DuplicatePlayer { .. } => ErrorKind::DuplicatePlayer,
            RosterError::FormationMismatch { .. } => ErrorKind::FormationMismatch,
            RosterError::BudgetExceeded { .. } => ErrorKind::BudgetExceeded,
        }
    }

    pub fn to_issue(&self) -> ValidationIssue {
        let issue = ValidationIssue::new(self.kind(), self.to_string());
        match self {
            RosterError::UnknownPlayer { player_id } | RosterError::DuplicatePlayer { player_id } => {
                issue.with_field("players").with_players([*player_id])
            }
            RosterError::FormationMismatch { .. } => issue.with_field("formation"),
            RosterError::BudgetExceeded { .. } => issue.with_field("total_cost"),
            RosterError::WrongSquadSize { .. } => issue.with_field("players"),
        }
    }
}

/// A squad that passed every composition check, with its cost figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRoster {
    pub squad: Squad,
    pub formation: FormationQuotas,
    /// Price of all fifteen players, bench included.
    pub total_cost: f64,
    /// `budget_cap - total_cost`; never negative once validated.
    pub remaining_budget: f64,
}

/// Check a squad against a formation and the budget cap.
///
/// Every check runs; all violations are returned together so a caller can
/// show the complete list. Unknown players contribute neither to position
/// counts nor to cost.
pub fn validate_roster<L: PlayerLookup>(
    squad: &Squad,
    formation: &FormationQuotas,
    players: &L,
    rules: &SquadRules,
) -> Result<ValidatedRoster, Vec<RosterError>> {
    let mut errors = Vec::new();

    // 1. Shape
    let starting = squad.starting().count();
    let bench = squad.bench().count();
    if squad.len() != SQUAD_SIZE || starting != STARTING_SIZE || bench != BENCH_SIZE {
        errors.push(RosterError::WrongSquadSize {
            total: squad.len(),
            starting,
            bench,
        });
    }

    // 2. Membership
    let mut reported_unknown = HashSet::new();
    for id in squad.player_ids() {
        if players.player(id).is_none() && reported_unknown.insert(id) {
            errors.push(RosterError::UnknownPlayer { player_id: id });
        }
    }

    // 3. Uniqueness
    let mut seen = HashSet::new();
    let mut reported_dupes = HashSet::new();
    for id in squad.player_ids() {
        if !seen.insert(id) && reported_dupes.insert(id) {
            errors.push(RosterError::DuplicatePlayer { player_id: id });
        }
    }

    // 4. Formation quotas, exact match per position
    let mut counts: BTreeMap<Position, usize> = Position::ALL.iter().map(|&p| (p, 0)).collect();
    for assignment in squad.starting() {
        if let Some(player) = players.player(assignment.player_id) {
            *counts.entry(player.position).or_insert(0) += 1;
        }
    }
    for (&position, &actual) in &counts {
        let expected = formation.quota(position);
        if actual != expected {
            errors.push(RosterError::FormationMismatch {
                position,
                expected,
                actual,
            });
        }
    }

    // 5. Budget
    // The cap is checked on the exact sum; only reported figures are rounded.
    let exact_cost = price_sum(squad, players);
    let total_cost = round2(exact_cost);
    if exact_cost > rules.budget_cap + MONEY_EPSILON {
        errors.push(RosterError::BudgetExceeded {
            total_cost,
            budget_cap: rules.budget_cap,
            overage: round2(exact_cost - rules.budget_cap).max(0.01),
        });
    }

    if !errors.is_empty() {
        debug!(
            violations = errors.len(),
            formation = %formation,
            "roster rejected"
        );
        return Err(errors);
    }

    Ok(ValidatedRoster {
        squad: squad.clone(),
        formation: *formation,
        total_cost,
        remaining_budget: round2(rules.budget_cap - exact_cost).max(0.0),
    })
}

/// Sum of the prices of every known player in the squad, rounded to cents.
pub fn squad_cost<L: PlayerLookup>(squad: &Squad, players: &L) -> f64 {
    round2(price_sum(squad, players))
}

fn price_sum<L: PlayerLookup>(squad: &Squad, players: &L) -> f64 {
    squad
        .player_ids()
        .filter_map(|id| players.player(id))
        .map(|p| p.price)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::formation::parse_formation;
    use crate::lineup::squad::PlayerAssignment;
    use crate::lineup::test_fixtures::{f442, pool, squad};

    // Fixture players cost 2.0 each, so the squad sits exactly on the 30.0 cap.

    #[test]
    fn valid_squad_reports_cost_and_remaining_budget() {
        let mut players = pool();
        players.get_mut(&15).unwrap().price = 1.5;
        let v = validate_roster(&squad(), &f442(), &players, &SquadRules::default()).unwrap();
        assert!((v.total_cost - 29.5).abs() < 1e-9);
        assert!((v.remaining_budget - 0.5).abs() < 1e-9);
        assert_eq!(v.formation, f442());
    }

    #[test]
    fn budget_exactly_at_cap_is_allowed() {
        let v = validate_roster(&squad(), &f442(), &pool(), &SquadRules::default()).unwrap();
        assert_eq!(v.total_cost, 30.0);
        assert_eq!(v.remaining_budget, 0.0);
    }

    #[test]
    fn over_budget_reports_overage() {
        let mut players = pool();
        players.get_mut(&15).unwrap().price = 2.5;
        let errs = validate_roster(&squad(), &f442(), &players, &SquadRules::default()).unwrap_err();
        assert_eq!(errs.len(), 1);
        match &errs[0] {
            RosterError::BudgetExceeded { overage, total_cost, .. } => {
                assert!((overage - 0.5).abs() < 1e-9);
                assert!((total_cost - 30.5).abs() < 1e-9);
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
    }

    #[test]
    fn sub_cent_overage_is_still_over_budget() {
        let mut players = pool();
        players.get_mut(&15).unwrap().price = 2.004;
        let errs = validate_roster(&squad(), &f442(), &players, &SquadRules::default()).unwrap_err();
        match &errs[..] {
            [RosterError::BudgetExceeded { total_cost, overage, .. }] => {
                assert_eq!(*total_cost, 30.0);
                assert_eq!(*overage, 0.01);
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
        // The rounded figure alone would have passed.
        assert_eq!(squad_cost(&squad(), &players), 30.0);
    }

    #[test]
    fn sub_cent_saving_leaves_no_spurious_remaining() {
        let mut players = pool();
        players.get_mut(&15).unwrap().price = 1.996;
        let v = validate_roster(&squad(), &f442(), &players, &SquadRules::default()).unwrap();
        assert_eq!(v.total_cost, 30.0);
        assert_eq!(v.remaining_budget, 0.0);
    }

    #[test]
    fn wrong_split_between_starting_and_bench() {
        let mut s = squad();
        s.assignments[10] = PlayerAssignment::bench(11);
        let errs = validate_roster(&s, &f442(), &pool(), &SquadRules::default()).unwrap_err();
        assert!(errs.contains(&RosterError::WrongSquadSize {
            total: 15,
            starting: 10,
            bench: 5
        }));
        // The missing forward also shows up as a formation mismatch.
        assert!(errs.contains(&RosterError::FormationMismatch {
            position: Position::Forward,
            expected: 2,
            actual: 1
        }));
    }

    #[test]
    fn collects_unknown_and_duplicate_players_together() {
        let mut s = squad();
        s.assignments[12] = PlayerAssignment::bench(99);
        s.assignments[13] = PlayerAssignment::bench(2);
        let errs = validate_roster(&s, &f442(), &pool(), &SquadRules::default()).unwrap_err();
        assert!(errs.contains(&RosterError::UnknownPlayer { player_id: 99 }));
        assert!(errs.contains(&RosterError::DuplicatePlayer { player_id: 2 }));
    }

    #[test]
    fn repeated_unknown_id_reported_once() {
        let mut s = squad();
        s.assignments[12] = PlayerAssignment::bench(99);
        s.assignments[13] = PlayerAssignment::bench(99);
        let errs = validate_roster(&s, &f442(), &pool(), &SquadRules::default()).unwrap_err();
        let unknown = errs
            .iter()
            .filter(|e| matches!(e, RosterError::UnknownPlayer { .. }))
            .count();
        assert_eq!(unknown, 1);
        assert!(errs.contains(&RosterError::DuplicatePlayer { player_id: 99 }));
    }

    #[test]
    fn formation_quotas_must_match_exactly() {
        let f433 = parse_formation("1-4-3-3").unwrap();
        let errs = validate_roster(&squad(), &f433, &pool(), &SquadRules::default()).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.contains(&RosterError::FormationMismatch {
            position: Position::Midfielder,
            expected: 3,
            actual: 4
        }));
        assert!(errs.contains(&RosterError::FormationMismatch {
            position: Position::Forward,
            expected: 3,
            actual: 2
        }));
    }

    #[test]
    fn empty_squad_reports_size_and_every_quota() {
        let errs =
            validate_roster(&Squad::default(), &f442(), &pool(), &SquadRules::default()).unwrap_err();
        assert_eq!(errs[0].kind(), ErrorKind::WrongSquadSize);
        let mismatches = errs
            .iter()
            .filter(|e| e.kind() == ErrorKind::FormationMismatch)
            .count();
        assert_eq!(mismatches, 4);
    }

    #[test]
    fn custom_cap_is_respected() {
        let rules = SquadRules {
            budget_cap: 29.0,
            ..SquadRules::default()
        };
        let errs = validate_roster(&squad(), &f442(), &pool(), &rules).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind(), ErrorKind::BudgetExceeded);
    }

    #[test]
    fn issue_carries_offending_ids() {
        let issue = RosterError::UnknownPlayer { player_id: 42 }.to_issue();
        assert_eq!(issue.kind, ErrorKind::UnknownPlayer);
        assert_eq!(issue.player_ids, vec![42]);
        assert_eq!(issue.field.as_deref(), Some("players"));
    }
}
