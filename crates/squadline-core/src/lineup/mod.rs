// Lineup engine: formation parsing, roster and captaincy validation, bonuses,
// totals, and the save-limit check.

pub mod bonus;
pub mod captaincy;
pub mod engine;
pub mod export;
pub mod formation;
pub mod issue;
pub mod player;
pub mod preview;
pub mod roster;
pub mod rules;
pub mod squad;
pub mod totals;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_fixtures;
