// Shared squads and player pools for unit tests.

use std::collections::HashMap;

use super::engine::SaveLineupCommand;
use super::formation::{parse_formation, FormationQuotas};
use super::player::{HealthStatus, Player, PlayerId, Position};
use super::squad::{PlayerAssignment, Squad};

/// Positions of ids 1..=15: a 1-4-4-2 starting XI followed by a
/// GK/DEF/MID/FWD bench.
pub const POSITIONS_442: [Position; 15] = [
    Position::Goalkeeper,
    Position::Defender,
    Position::Defender,
    Position::Defender,
    Position::Defender,
    Position::Midfielder,
    Position::Midfielder,
    Position::Midfielder,
    Position::Midfielder,
    Position::Forward,
    Position::Forward,
    Position::Goalkeeper,
    Position::Defender,
    Position::Midfielder,
    Position::Forward,
];

pub fn player(id: PlayerId, position: Position, price: f64, points: f64) -> Player {
    Player {
        id,
        name: format!("Player {id}"),
        team: "Lech".into(),
        position,
        price,
        health_status: HealthStatus::Fit,
        fantasy_points: points,
    }
}

/// Pool of ids 1..=15 priced at 2.0 each, with `points = id`.
/// Players 16 (MID, 1.5) and 17 (FWD, 4.0) are free agents for joker swaps.
pub fn pool() -> HashMap<PlayerId, Player> {
    let mut pool: HashMap<PlayerId, Player> = POSITIONS_442
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let id = i as PlayerId + 1;
            (id, player(id, position, 2.0, id as f64))
        })
        .collect();
    pool.insert(16, player(16, Position::Midfielder, 1.5, 9.0));
    pool.insert(17, player(17, Position::Forward, 4.0, 12.0));
    pool
}

/// Ids 1..=11 starting, 12..=15 bench; captain 10, vice 9.
pub fn squad() -> Squad {
    let mut assignments: Vec<PlayerAssignment> = (1..=15)
        .map(|id| {
            if id <= 11 {
                PlayerAssignment::starting(id)
            } else {
                PlayerAssignment::bench(id)
            }
        })
        .collect();
    assignments[9].is_captain = true;
    assignments[8].is_vice = true;
    Squad::new(assignments)
}

pub fn f442() -> FormationQuotas {
    parse_formation("1-4-4-2").expect("1-4-4-2 is a valid formation")
}

/// Save command for `squad()` on gameweek 5, declaring its true cost of 30.0.
pub fn command() -> SaveLineupCommand {
    SaveLineupCommand {
        name: "Gameweek 5 main".into(),
        formation: "1-4-4-2".into(),
        gameweek_id: 5,
        is_active: true,
        total_cost: 30.0,
        players: squad().assignments,
        bonus: None,
    }
}
