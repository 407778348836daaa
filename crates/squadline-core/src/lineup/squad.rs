// Squad shape: fifteen player assignments split into a starting XI and a bench.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Total players in a squad.
pub const SQUAD_SIZE: usize = 15;
/// Players in the starting XI.
pub const STARTING_SIZE: usize = 11;
/// Players on the bench.
pub const BENCH_SIZE: usize = 4;

/// Whether an assignment is in the starting XI or on the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineupRole {
    Starting,
    Bench,
}

impl LineupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineupRole::Starting => "starting",
            LineupRole::Bench => "bench",
        }
    }

    pub fn from_str_role(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(LineupRole::Starting),
            "bench" => Some(LineupRole::Bench),
            _ => None,
        }
    }
}

/// One row of a lineup: a player, their role, and captaincy flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAssignment {
    pub player_id: PlayerId,
    pub role: LineupRole,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice: bool,
    /// Locked players cannot be swapped out by the joker bonus.
    #[serde(default)]
    pub is_locked: bool,
}

impl PlayerAssignment {
    pub fn starting(player_id: PlayerId) -> Self {
        Self {
            player_id,
            role: LineupRole::Starting,
            is_captain: false,
            is_vice: false,
            is_locked: false,
        }
    }

    pub fn bench(player_id: PlayerId) -> Self {
        Self {
            role: LineupRole::Bench,
            ..Self::starting(player_id)
        }
    }

    pub fn is_starting(&self) -> bool {
        self.role == LineupRole::Starting
    }
}

/// A candidate squad. Built per request and never mutated by the engine;
/// operations that change it (the joker swap) return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Squad {
    pub assignments: Vec<PlayerAssignment>,
}

impl Squad {
    pub fn new(assignments: Vec<PlayerAssignment>) -> Self {
        Self { assignments }
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn starting(&self) -> impl Iterator<Item = &PlayerAssignment> {
        self.assignments.iter().filter(|a| a.role == LineupRole::Starting)
    }

    pub fn bench(&self) -> impl Iterator<Item = &PlayerAssignment> {
        self.assignments.iter().filter(|a| a.role == LineupRole::Bench)
    }

    /// First assignment for the given player, if present.
    pub fn get(&self, player_id: PlayerId) -> Option<&PlayerAssignment> {
        self.assignments.iter().find(|a| a.player_id == player_id)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.get(player_id).is_some()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.assignments.iter().map(|a| a.player_id)
    }
}

impl From<Vec<PlayerAssignment>> for Squad {
    fn from(assignments: Vec<PlayerAssignment>) -> Self {
        Self::new(assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let a = PlayerAssignment::bench(4);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["role"], "bench");
        assert_eq!(LineupRole::from_str_role("starting"), Some(LineupRole::Starting));
        assert_eq!(LineupRole::from_str_role("Starting"), None);
    }

    #[test]
    fn flags_default_to_false_when_absent() {
        let a: PlayerAssignment =
            serde_json::from_str(r#"{"player_id": 9, "role": "starting"}"#).unwrap();
        assert!(!a.is_captain && !a.is_vice && !a.is_locked);
    }

    #[test]
    fn starting_and_bench_partition_the_squad() {
        let squad = Squad::new(vec![
            PlayerAssignment::starting(1),
            PlayerAssignment::bench(2),
            PlayerAssignment::starting(3),
        ]);
        assert_eq!(squad.starting().count(), 2);
        assert_eq!(squad.bench().map(|a| a.player_id).collect::<Vec<_>>(), vec![2]);
        assert!(squad.contains(3));
        assert!(!squad.contains(4));
    }
}
