// Player records and the read-side seams the engine consumes.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Database identifier of a player.
pub type PlayerId = u32;

/// Football positions. The wire names match the player table (`GK`, `DEF`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    /// All positions in formation order (GK first, FWD last).
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position abbreviation. Case-insensitive.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "BR" => Some(Position::Goalkeeper),
            "DEF" | "OBR" => Some(Position::Defender),
            "MID" | "POM" => Some(Position::Midfielder),
            "FWD" | "NAP" => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Availability flag attached to each player by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    #[serde(rename = "Pewny")]
    Fit,
    #[serde(rename = "Wątpliwy")]
    Doubtful,
    #[serde(rename = "Nie zagra")]
    Out,
}

impl HealthStatus {
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Pewny" => Some(HealthStatus::Fit),
            "Wątpliwy" => Some(HealthStatus::Doubtful),
            "Nie zagra" => Some(HealthStatus::Out),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Fit => "Pewny",
            HealthStatus::Doubtful => "Wątpliwy",
            HealthStatus::Out => "Nie zagra",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A player as supplied by the read collaborator. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Real-world club name. Informational only; no per-club quota is applied.
    #[serde(default)]
    pub team: String,
    pub position: Position,
    /// Price in millions, same unit as the budget cap.
    pub price: f64,
    pub health_status: HealthStatus,
    /// Latest fantasy-points figure.
    pub fantasy_points: f64,
}

/// Resolves player ids to player records.
pub trait PlayerLookup {
    fn player(&self, id: PlayerId) -> Option<&Player>;
}

impl PlayerLookup for HashMap<PlayerId, Player> {
    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.get(&id)
    }
}

impl<T: PlayerLookup + ?Sized> PlayerLookup for &T {
    fn player(&self, id: PlayerId) -> Option<&Player> {
        (**self).player(id)
    }
}

/// Scoring collaborator: produces the points figure used for a player.
///
/// Recommendation engines plug in here; the engine itself only sums what it
/// is given.
pub trait PointsSource {
    fn score(&self, player: &Player) -> f64;
}

/// Scores each player by their current fantasy-points figure.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentPoints;

impl PointsSource for CurrentPoints {
    fn score(&self, player: &Player) -> f64 {
        player.fantasy_points
    }
}

impl<F> PointsSource for F
where
    F: Fn(&Player) -> f64,
{
    fn score(&self, player: &Player) -> f64 {
        self(player)
    }
}

/// Round a money or points figure to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
