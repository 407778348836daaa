// One-time bonuses: payload typing, eligibility, and the effect each one has.
//
// Each bonus can be played once per season. The engine does not track that
// itself; callers pass in the season's usage as a `BonusHistory`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::captaincy::Captaincy;
use super::issue::{ErrorKind, ValidationIssue};
use super::player::{PlayerId, PlayerLookup};
use super::roster::{validate_roster, RosterError, ValidatedRoster};
use super::rules::SquadRules;
use super::squad::Squad;

// ---------------------------------------------------------------------------
// Bonus types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BonusType {
    /// Bench players' points count towards the total.
    #[serde(rename = "ławka_punktuje")]
    BenchBoost,
    /// Vice-captain scores double alongside the captain.
    #[serde(rename = "kapitanów_2")]
    DoubleCaptain,
    /// One starter may be swapped out for another player.
    #[serde(rename = "joker")]
    Joker,
}

impl BonusType {
    pub const ALL: [BonusType; 3] = [BonusType::BenchBoost, BonusType::DoubleCaptain, BonusType::Joker];

    /// Stored name, as used in the bonuses table and request payloads.
    pub fn name(&self) -> &'static str {
        match self {
            BonusType::BenchBoost => "ławka_punktuje",
            BonusType::DoubleCaptain => "kapitanów_2",
            BonusType::Joker => "joker",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BonusType::BenchBoost => "Ławka punktuje",
            BonusType::DoubleCaptain => "Dwóch kapitanów",
            BonusType::Joker => "Joker",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, BonusError> {
        BonusType::ALL
            .into_iter()
            .find(|b| b.name() == name.trim())
            .ok_or_else(|| BonusError::UnknownBonusType {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for BonusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BonusError {
    #[error("bonus {bonus} was already used this season")]
    AlreadyUsed {
        bonus: BonusType,
        gameweek_id: Option<u32>,
    },

    #[error("unknown bonus type `{name}`")]
    UnknownBonusType { name: String },

    #[error("alternative captains {player_ids:?} do not match the vice-captain")]
    InvalidCaptainOverride { player_ids: Vec<PlayerId> },

    #[error("invalid joker swap: {reason}")]
    InvalidJokerSwap {
        player_id: Option<PlayerId>,
        reason: String,
    },

    #[error("squad after the joker swap is invalid ({} problem(s))", .errors.len())]
    JokerResultInvalid { errors: Vec<RosterError> },
}

impl BonusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BonusError::AlreadyUsed { .. } => ErrorKind::BonusAlreadyUsed,
            BonusError::UnknownBonusType { .. } => ErrorKind::UnknownBonusType,
            BonusError::InvalidCaptainOverride { .. } => ErrorKind::InvalidCaptainOverride,
            BonusError::InvalidJokerSwap { .. } => ErrorKind::InvalidJokerSwap,
            BonusError::JokerResultInvalid { .. } => ErrorKind::JokerResultInvalid,
        }
    }

    pub fn to_issue(&self) -> ValidationIssue {
        let mut message = self.to_string();
        if let BonusError::JokerResultInvalid { errors } = self {
            let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            message = format!("{message}: {}", details.join("; "));
        }
        let issue = ValidationIssue::new(self.kind(), message).with_field("bonus");
        match self {
            BonusError::InvalidCaptainOverride { player_ids } => {
                issue.with_players(player_ids.iter().copied())
            }
            BonusError::InvalidJokerSwap {
                player_id: Some(id),
                ..
            } => issue.with_players([*id]),
            BonusError::JokerResultInvalid { errors } => issue.with_players(errors.iter().filter_map(
                |e| match e {
                    RosterError::UnknownPlayer { player_id }
                    | RosterError::DuplicatePlayer { player_id } => Some(*player_id),
                    _ => None,
                },
            )),
            _ => issue,
        }
    }
}

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

/// A chosen bonus with only the fields that bonus uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BonusSelection {
    #[serde(rename = "ławka_punktuje")]
    BenchBoost,
    #[serde(rename = "kapitanów_2")]
    DoubleCaptain {
        #[serde(default)]
        alternative_captains: Vec<PlayerId>,
    },
    #[serde(rename = "joker")]
    Joker { swap_out: PlayerId, swap_in: PlayerId },
}

impl BonusSelection {
    pub fn bonus_type(&self) -> BonusType {
        match self {
            BonusSelection::BenchBoost => BonusType::BenchBoost,
            BonusSelection::DoubleCaptain { .. } => BonusType::DoubleCaptain,
            BonusSelection::Joker { .. } => BonusType::Joker,
        }
    }
}

/// Bonus payload as it arrives from the request layer: a free-form type name
/// plus every optional field any bonus might use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBonusSelection {
    #[serde(rename = "type")]
    pub bonus_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_captains: Option<Vec<PlayerId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_out: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_in: Option<PlayerId>,
}

impl TryFrom<RawBonusSelection> for BonusSelection {
    type Error = BonusError;

    /// Fields that do not belong to the named bonus are dropped.
    fn try_from(raw: RawBonusSelection) -> Result<Self, Self::Error> {
        match BonusType::from_name(&raw.bonus_type)? {
            BonusType::BenchBoost => Ok(BonusSelection::BenchBoost),
            BonusType::DoubleCaptain => Ok(BonusSelection::DoubleCaptain {
                alternative_captains: raw.alternative_captains.unwrap_or_default(),
            }),
            BonusType::Joker => match (raw.swap_out, raw.swap_in) {
                (Some(swap_out), Some(swap_in)) => Ok(BonusSelection::Joker { swap_out, swap_in }),
                (out, _) => Err(BonusError::InvalidJokerSwap {
                    player_id: out,
                    reason: "joker needs both swap_out and swap_in".into(),
                }),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Season usage
// ---------------------------------------------------------------------------

/// Which bonuses a user has already played this season, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusHistory {
    used: BTreeMap<BonusType, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BonusAvailability {
    Available,
    Used,
}

/// Per-bonus status line for a user's season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusStatus {
    pub bonus: BonusType,
    pub display_name: String,
    pub status: BonusAvailability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_in_gameweek: Option<u32>,
}

impl BonusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `bonus` was played in `gameweek_id`. The first record wins.
    pub fn record(&mut self, bonus: BonusType, gameweek_id: u32) {
        self.used.entry(bonus).or_insert(gameweek_id);
    }

    pub fn is_used(&self, bonus: BonusType) -> bool {
        self.used.contains_key(&bonus)
    }

    pub fn used_in(&self, bonus: BonusType) -> Option<u32> {
        self.used.get(&bonus).copied()
    }

    pub fn statuses(&self) -> Vec<BonusStatus> {
        BonusType::ALL
            .into_iter()
            .map(|bonus| BonusStatus {
                bonus,
                display_name: bonus.display_name().to_string(),
                status: if self.is_used(bonus) {
                    BonusAvailability::Used
                } else {
                    BonusAvailability::Available
                },
                used_in_gameweek: self.used_in(bonus),
            })
            .collect()
    }
}

impl FromIterator<(BonusType, u32)> for BonusHistory {
    fn from_iter<I: IntoIterator<Item = (BonusType, u32)>>(iter: I) -> Self {
        let mut history = BonusHistory::new();
        for (bonus, gameweek_id) in iter {
            history.record(bonus, gameweek_id);
        }
        history
    }
}

/// Fail with `AlreadyUsed` if the season history shows `bonus` consumed.
pub fn ensure_available(bonus: BonusType, history: &BonusHistory) -> Result<(), BonusError> {
    if history.is_used(bonus) {
        return Err(BonusError::AlreadyUsed {
            bonus,
            gameweek_id: history.used_in(bonus),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// What an accepted bonus changes for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BonusEffect {
    /// Bench points are added, unmultiplied.
    #[serde(rename = "ławka_punktuje")]
    BenchBoost,
    /// The vice-captain also scores double.
    #[serde(rename = "kapitanów_2")]
    DoubleCaptain { vice_captain_id: PlayerId },
    /// The squad after the swap; scoring uses this squad.
    #[serde(rename = "joker")]
    Joker {
        swap_out: PlayerId,
        swap_in: PlayerId,
        roster: ValidatedRoster,
    },
}

impl BonusEffect {
    pub fn bonus_type(&self) -> BonusType {
        match self {
            BonusEffect::BenchBoost => BonusType::BenchBoost,
            BonusEffect::DoubleCaptain { .. } => BonusType::DoubleCaptain,
            BonusEffect::Joker { .. } => BonusType::Joker,
        }
    }

    pub fn counts_bench(&self) -> bool {
        matches!(self, BonusEffect::BenchBoost)
    }

    pub fn doubles_vice_captain(&self) -> bool {
        matches!(self, BonusEffect::DoubleCaptain { .. })
    }

    /// The roster produced by a joker swap, if this is a joker.
    pub fn swapped_roster(&self) -> Option<&ValidatedRoster> {
        match self {
            BonusEffect::Joker { roster, .. } => Some(roster),
            _ => None,
        }
    }
}

/// Everything a bonus needs to know about the lineup it is applied to.
pub struct BonusContext<'a, L: PlayerLookup> {
    pub roster: &'a ValidatedRoster,
    pub captaincy: &'a Captaincy,
    pub players: &'a L,
    pub rules: &'a SquadRules,
}

/// Validate a bonus choice against the lineup and season usage, and return
/// its effect. Fails on the first problem found.
pub fn apply_bonus<L: PlayerLookup>(
    ctx: &BonusContext<'_, L>,
    selection: &BonusSelection,
    history: &BonusHistory,
) -> Result<BonusEffect, BonusError> {
    let bonus = selection.bonus_type();
    ensure_available(bonus, history).inspect_err(|_| {
        debug!(bonus = %bonus, "bonus rejected: already used this season");
    })?;

    let effect = match selection {
        BonusSelection::BenchBoost => BonusEffect::BenchBoost,
        BonusSelection::DoubleCaptain {
            alternative_captains,
        } => {
            let vice = ctx.captaincy.vice_captain_id;
            let offending: Vec<PlayerId> = alternative_captains
                .iter()
                .copied()
                .filter(|&id| id != vice)
                .collect();
            if !offending.is_empty() {
                return Err(BonusError::InvalidCaptainOverride {
                    player_ids: offending,
                });
            }
            BonusEffect::DoubleCaptain {
                vice_captain_id: vice,
            }
        }
        BonusSelection::Joker { swap_out, swap_in } => {
            let swapped = joker_swap(&ctx.roster.squad, *swap_out, *swap_in)?;
            let roster = validate_roster(&swapped, &ctx.roster.formation, ctx.players, ctx.rules)
                .map_err(|errors| BonusError::JokerResultInvalid { errors })?;
            BonusEffect::Joker {
                swap_out: *swap_out,
                swap_in: *swap_in,
                roster,
            }
        }
    };

    info!(bonus = %bonus, "bonus accepted");
    Ok(effect)
}

/// Swap one starter for a bench player (roles and armbands trade places) or
/// for a player outside the squad (who takes over the starter's assignment).
fn joker_swap(squad: &Squad, swap_out: PlayerId, swap_in: PlayerId) -> Result<Squad, BonusError> {
    let invalid = |player_id: PlayerId, reason: &str| BonusError::InvalidJokerSwap {
        player_id: Some(player_id),
        reason: reason.to_string(),
    };

    if swap_out == swap_in {
        return Err(invalid(swap_out, "cannot swap a player for themselves"));
    }

    let out_idx = squad
        .assignments
        .iter()
        .position(|a| a.player_id == swap_out)
        .ok_or_else(|| invalid(swap_out, "outgoing player is not in the squad"))?;
    let outgoing = &squad.assignments[out_idx];
    if !outgoing.is_starting() {
        return Err(invalid(swap_out, "outgoing player is not in the starting XI"));
    }
    if outgoing.is_locked {
        return Err(invalid(swap_out, "outgoing player is locked"));
    }

    let mut assignments = squad.assignments.clone();
    match squad.assignments.iter().position(|a| a.player_id == swap_in) {
        Some(in_idx) => {
            if squad.assignments[in_idx].is_starting() {
                return Err(invalid(swap_in, "incoming player is already starting"));
            }
            let (out_role, out_captain, out_vice) =
                (outgoing.role, outgoing.is_captain, outgoing.is_vice);
            let incoming = squad.assignments[in_idx].clone();

            let a = &mut assignments[out_idx];
            a.role = incoming.role;
            a.is_captain = incoming.is_captain;
            a.is_vice = incoming.is_vice;

            let b = &mut assignments[in_idx];
            b.role = out_role;
            b.is_captain = out_captain;
            b.is_vice = out_vice;
        }
        None => {
            let a = &mut assignments[out_idx];
            a.player_id = swap_in;
            a.is_locked = false;
        }
    }

    Ok(Squad::new(assignments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::captaincy::resolve_captaincy;
    use crate::lineup::test_fixtures::{f442, pool, squad};

    fn roster() -> ValidatedRoster {
        validate_roster(&squad(), &f442(), &pool(), &SquadRules::default()).unwrap()
    }

    fn apply(selection: &BonusSelection, history: &BonusHistory) -> Result<BonusEffect, BonusError> {
        let roster = roster();
        let captaincy = resolve_captaincy(&roster.squad).unwrap();
        let players = pool();
        let rules = SquadRules::default();
        let ctx = BonusContext {
            roster: &roster,
            captaincy: &captaincy,
            players: &players,
            rules: &rules,
        };
        apply_bonus(&ctx, selection, history)
    }

    #[test]
    fn bonus_names_round_trip() {
        for bonus in BonusType::ALL {
            assert_eq!(BonusType::from_name(bonus.name()).unwrap(), bonus);
        }
        assert!(matches!(
            BonusType::from_name("triple_captain"),
            Err(BonusError::UnknownBonusType { .. })
        ));
    }

    #[test]
    fn raw_payload_converts_to_tagged_selection() {
        let raw = RawBonusSelection {
            bonus_type: "kapitanów_2".into(),
            alternative_captains: Some(vec![9]),
            swap_out: Some(3),
            swap_in: None,
        };
        assert_eq!(
            BonusSelection::try_from(raw).unwrap(),
            BonusSelection::DoubleCaptain {
                alternative_captains: vec![9]
            }
        );

        let raw = RawBonusSelection {
            bonus_type: "ławka_punktuje".into(),
            ..Default::default()
        };
        assert_eq!(BonusSelection::try_from(raw).unwrap(), BonusSelection::BenchBoost);
    }

    #[test]
    fn raw_payload_with_unknown_type_is_rejected() {
        let raw = RawBonusSelection {
            bonus_type: "wildcard".into(),
            ..Default::default()
        };
        assert_eq!(
            BonusSelection::try_from(raw).unwrap_err().kind(),
            ErrorKind::UnknownBonusType
        );
    }

    #[test]
    fn raw_joker_needs_both_targets() {
        let raw = RawBonusSelection {
            bonus_type: "joker".into(),
            swap_out: Some(3),
            ..Default::default()
        };
        assert_eq!(
            BonusSelection::try_from(raw).unwrap_err().kind(),
            ErrorKind::InvalidJokerSwap
        );
    }

    #[test]
    fn selection_json_is_tagged_by_type() {
        let sel: BonusSelection =
            serde_json::from_str(r#"{"type":"joker","swap_out":10,"swap_in":17}"#).unwrap();
        assert_eq!(
            sel,
            BonusSelection::Joker {
                swap_out: 10,
                swap_in: 17
            }
        );
        let sel: BonusSelection = serde_json::from_str(r#"{"type":"kapitanów_2"}"#).unwrap();
        assert_eq!(sel.bonus_type(), BonusType::DoubleCaptain);
    }

    #[test]
    fn history_blocks_reuse() {
        let history: BonusHistory = [(BonusType::BenchBoost, 4)].into_iter().collect();
        let err = apply(&BonusSelection::BenchBoost, &history).unwrap_err();
        assert_eq!(
            err,
            BonusError::AlreadyUsed {
                bonus: BonusType::BenchBoost,
                gameweek_id: Some(4)
            }
        );
        // Other bonuses stay available.
        assert!(apply(
            &BonusSelection::DoubleCaptain {
                alternative_captains: vec![]
            },
            &history
        )
        .is_ok());
    }

    #[test]
    fn history_statuses_report_each_bonus() {
        let mut history = BonusHistory::new();
        history.record(BonusType::Joker, 7);
        history.record(BonusType::Joker, 9);
        let statuses = history.statuses();
        assert_eq!(statuses.len(), 3);
        let joker = statuses.iter().find(|s| s.bonus == BonusType::Joker).unwrap();
        assert_eq!(joker.status, BonusAvailability::Used);
        assert_eq!(joker.used_in_gameweek, Some(7));
        let bench = statuses
            .iter()
            .find(|s| s.bonus == BonusType::BenchBoost)
            .unwrap();
        assert_eq!(bench.status, BonusAvailability::Available);
    }

    #[test]
    fn bench_boost_has_no_extra_requirements() {
        let effect = apply(&BonusSelection::BenchBoost, &BonusHistory::new()).unwrap();
        assert!(effect.counts_bench());
        assert!(!effect.doubles_vice_captain());
    }

    #[test]
    fn double_captain_accepts_empty_or_vice_override() {
        for alts in [vec![], vec![9]] {
            let effect = apply(
                &BonusSelection::DoubleCaptain {
                    alternative_captains: alts,
                },
                &BonusHistory::new(),
            )
            .unwrap();
            assert_eq!(effect, BonusEffect::DoubleCaptain { vice_captain_id: 9 });
        }
    }

    #[test]
    fn double_captain_rejects_other_overrides() {
        let err = apply(
            &BonusSelection::DoubleCaptain {
                alternative_captains: vec![9, 4],
            },
            &BonusHistory::new(),
        )
        .unwrap_err();
        assert_eq!(err, BonusError::InvalidCaptainOverride { player_ids: vec![4] });
    }

    #[test]
    fn joker_swaps_starter_for_external_player() {
        // 10 (FWD, captain, 2.0) out, 17 (FWD, 4.0) in: 28 + 4 = 32 > 30.
        let err = apply(
            &BonusSelection::Joker {
                swap_out: 10,
                swap_in: 17,
            },
            &BonusHistory::new(),
        )
        .unwrap_err();
        match err {
            BonusError::JokerResultInvalid { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].kind(), ErrorKind::BudgetExceeded);
            }
            other => panic!("expected JokerResultInvalid, got {other:?}"),
        }

        // 6 (MID, 2.0) out, 16 (MID, 1.5) in fits.
        let effect = apply(
            &BonusSelection::Joker {
                swap_out: 6,
                swap_in: 16,
            },
            &BonusHistory::new(),
        )
        .unwrap();
        let roster = effect.swapped_roster().unwrap();
        assert!(roster.squad.contains(16));
        assert!(!roster.squad.contains(6));
        assert!((roster.total_cost - 29.5).abs() < 1e-9);
    }

    #[test]
    fn joker_bench_swap_trades_roles_and_armband() {
        // Captain 10 (FWD) swapped with bench FWD 15.
        let effect = apply(
            &BonusSelection::Joker {
                swap_out: 10,
                swap_in: 15,
            },
            &BonusHistory::new(),
        )
        .unwrap();
        let squad = &effect.swapped_roster().unwrap().squad;
        let incoming = squad.get(15).unwrap();
        let outgoing = squad.get(10).unwrap();
        assert!(incoming.is_starting() && incoming.is_captain);
        assert!(!outgoing.is_starting() && !outgoing.is_captain);
        assert_eq!(resolve_captaincy(squad).unwrap().captain_id, 15);
    }

    #[test]
    fn joker_position_change_breaks_formation() {
        // DEF 2 out for bench MID 14 leaves 3 DEF / 5 MID.
        let err = apply(
            &BonusSelection::Joker {
                swap_out: 2,
                swap_in: 14,
            },
            &BonusHistory::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JokerResultInvalid);
        let issue = err.to_issue();
        assert!(issue.message.contains("formation needs"));
    }

    #[test]
    fn joker_rejects_bad_targets() {
        let cases = [
            (12, 16, "bench player cannot be swapped out"),
            (40, 16, "outgoing player must be in the squad"),
            (3, 3, "same player"),
            (3, 4, "incoming player already starting"),
        ];
        for (swap_out, swap_in, why) in cases {
            let err = apply(&BonusSelection::Joker { swap_out, swap_in }, &BonusHistory::new())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidJokerSwap, "{why}");
        }
    }

    #[test]
    fn joker_cannot_remove_locked_player() {
        let mut s = squad();
        s.assignments[5].is_locked = true;
        let players = pool();
        let rules = SquadRules::default();
        let roster = validate_roster(&s, &f442(), &players, &rules).unwrap();
        let captaincy = resolve_captaincy(&roster.squad).unwrap();
        let ctx = BonusContext {
            roster: &roster,
            captaincy: &captaincy,
            players: &players,
            rules: &rules,
        };
        let err = apply_bonus(
            &ctx,
            &BonusSelection::Joker {
                swap_out: 6,
                swap_in: 16,
            },
            &BonusHistory::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BonusError::InvalidJokerSwap {
                player_id: Some(6),
                reason: "outgoing player is locked".into()
            }
        );
    }
}
