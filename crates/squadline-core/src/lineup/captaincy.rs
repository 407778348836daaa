// Captain and vice-captain resolution, plus the point multipliers they carry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::issue::{ErrorKind, ValidationIssue};
use super::player::PlayerId;
use super::squad::Squad;

/// Multiplier applied to a captain's points.
pub const CAPTAIN_MULTIPLIER: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptaincyError {
    #[error("no captain selected")]
    MissingCaptain,

    #[error("more than one captain selected: {player_ids:?}")]
    MultipleCaptains { player_ids: Vec<PlayerId> },

    #[error("no vice-captain selected")]
    MissingViceCaptain,

    #[error("more than one vice-captain selected: {player_ids:?}")]
    MultipleViceCaptains { player_ids: Vec<PlayerId> },

    #[error("player {player_id} is marked as both captain and vice-captain")]
    CaptainViceConflict { player_id: PlayerId },

    #[error("player {player_id} wears an armband but is not in the starting XI")]
    CaptainNotStarting { player_id: PlayerId },
}

impl CaptaincyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptaincyError::MissingCaptain => ErrorKind::MissingCaptain,
            CaptaincyError::MultipleCaptains { .. } => ErrorKind::MultipleCaptains,
            CaptaincyError::MissingViceCaptain => ErrorKind::MissingViceCaptain,
            CaptaincyError::MultipleViceCaptains { .. } => ErrorKind::MultipleViceCaptains,
            CaptaincyError::CaptainViceConflict { .. } => ErrorKind::CaptainViceConflict,
            CaptaincyError::CaptainNotStarting { .. } => ErrorKind::CaptainNotStarting,
        }
    }

    pub fn to_issue(&self) -> ValidationIssue {
        let issue = ValidationIssue::new(self.kind(), self.to_string()).with_field("players");
        match self {
            CaptaincyError::MultipleCaptains { player_ids }
            | CaptaincyError::MultipleViceCaptains { player_ids } => {
                issue.with_players(player_ids.iter().copied())
            }
            CaptaincyError::CaptainViceConflict { player_id }
            | CaptaincyError::CaptainNotStarting { player_id } => issue.with_players([*player_id]),
            CaptaincyError::MissingCaptain | CaptaincyError::MissingViceCaptain => issue,
        }
    }
}

/// The resolved armbands of a squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Captaincy {
    pub captain_id: PlayerId,
    pub vice_captain_id: PlayerId,
}

impl Captaincy {
    /// Point multiplier for a starting player.
    ///
    /// The captain always doubles. With the double-captain bonus active the
    /// vice-captain doubles too; everyone else scores once.
    pub fn multiplier(&self, player_id: PlayerId, double_captain: bool) -> u32 {
        if player_id == self.captain_id || (double_captain && player_id == self.vice_captain_id) {
            CAPTAIN_MULTIPLIER
        } else {
            1
        }
    }
}

/// Find the captain and vice-captain. Fails on the first violation.
pub fn resolve_captaincy(squad: &Squad) -> Result<Captaincy, CaptaincyError> {
    let captains: Vec<PlayerId> = squad
        .assignments
        .iter()
        .filter(|a| a.is_captain)
        .map(|a| a.player_id)
        .collect();
    let captain_id = match captains.len() {
        0 => return Err(CaptaincyError::MissingCaptain),
        1 => captains[0],
        _ => return Err(CaptaincyError::MultipleCaptains { player_ids: captains }),
    };

    if squad
        .assignments
        .iter()
        .any(|a| a.is_captain && a.is_vice)
    {
        return Err(CaptaincyError::CaptainViceConflict {
            player_id: captain_id,
        });
    }

    let vices: Vec<PlayerId> = squad
        .assignments
        .iter()
        .filter(|a| a.is_vice)
        .map(|a| a.player_id)
        .collect();
    let vice_captain_id = match vices.len() {
        0 => return Err(CaptaincyError::MissingViceCaptain),
        1 => vices[0],
        _ => return Err(CaptaincyError::MultipleViceCaptains { player_ids: vices }),
    };

    // Distinct assignments can still share an id in a squad with duplicates.
    if vice_captain_id == captain_id {
        return Err(CaptaincyError::CaptainViceConflict {
            player_id: captain_id,
        });
    }

    for id in [captain_id, vice_captain_id] {
        let starting = squad
            .assignments
            .iter()
            .any(|a| a.player_id == id && a.is_starting() && (a.is_captain || a.is_vice));
        if !starting {
            return Err(CaptaincyError::CaptainNotStarting { player_id: id });
        }
    }

    Ok(Captaincy {
        captain_id,
        vice_captain_id,
    })
}
