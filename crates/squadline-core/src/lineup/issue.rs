// Structured validation output shared by every engine component.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Machine-readable failure kind. Serialized names are stable API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidFormationSyntax,
    InvalidFormationTotal,
    WrongSquadSize,
    UnknownPlayer,
    DuplicatePlayer,
    FormationMismatch,
    BudgetExceeded,
    DeclaredCostMismatch,
    MissingCaptain,
    MultipleCaptains,
    MissingViceCaptain,
    MultipleViceCaptains,
    CaptainViceConflict,
    CaptainNotStarting,
    BonusAlreadyUsed,
    UnknownBonusType,
    InvalidCaptainOverride,
    InvalidJokerSwap,
    JokerResultInvalid,
    LimitExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One problem with a submitted lineup: kind, human message, and what it
/// points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: ErrorKind,
    pub message: String,
    /// Request field the issue refers to (`formation`, `players`, `bonus`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub player_ids: Vec<PlayerId>,
}

impl ValidationIssue {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
            player_ids: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_players(mut self, ids: impl IntoIterator<Item = PlayerId>) -> Self {
        self.player_ids = ids.into_iter().collect();
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
