// Formation descriptors ("1-4-4-2") and the per-position quotas they imply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::issue::{ErrorKind, ValidationIssue};
use super::player::Position;
use super::squad::STARTING_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormationError {
    #[error("formation `{descriptor}` is not four dash-separated numbers")]
    InvalidSyntax { descriptor: String },

    #[error("formation `{descriptor}` must have 1 goalkeeper and 11 players, got {goalkeepers} and {total}")]
    InvalidTotal {
        descriptor: String,
        goalkeepers: u32,
        total: u32,
    },
}

impl FormationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormationError::InvalidSyntax { .. } => ErrorKind::InvalidFormationSyntax,
            FormationError::InvalidTotal { .. } => ErrorKind::InvalidFormationTotal,
        }
    }

    pub fn to_issue(&self) -> ValidationIssue {
        ValidationIssue::new(self.kind(), self.to_string()).with_field("formation")
    }
}

/// Starting-XI quotas per position. The goalkeeper quota is always one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormationQuotas {
    defenders: u8,
    midfielders: u8,
    forwards: u8,
}

impl FormationQuotas {
    pub fn defenders(&self) -> usize {
        self.defenders as usize
    }

    pub fn midfielders(&self) -> usize {
        self.midfielders as usize
    }

    pub fn forwards(&self) -> usize {
        self.forwards as usize
    }

    /// Number of starters required at `position`.
    pub fn quota(&self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => 1,
            Position::Defender => self.defenders(),
            Position::Midfielder => self.midfielders(),
            Position::Forward => self.forwards(),
        }
    }

    pub fn total(&self) -> usize {
        Position::ALL.iter().map(|&p| self.quota(p)).sum()
    }
}

/// Parse a descriptor of the form `1-<DEF>-<MID>-<FWD>`.
///
/// Each part must be plain ASCII digits; surrounding whitespace on the whole
/// descriptor is ignored. The four numbers must sum to eleven with exactly
/// one goalkeeper.
pub fn parse_formation(descriptor: &str) -> Result<FormationQuotas, FormationError> {
    let trimmed = descriptor.trim();
    let syntax_err = || FormationError::InvalidSyntax {
        descriptor: descriptor.to_string(),
    };

    let parts: Vec<&str> = trimmed.split('-').collect();
    if parts.len() != 4 {
        return Err(syntax_err());
    }

    let mut numbers = [0u32; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(syntax_err());
        }
        // Digits only, so the one possible parse failure is overflow.
        *slot = part.parse::<u32>().unwrap_or(u32::MAX);
    }

    let [goalkeepers, defenders, midfielders, forwards] = numbers;
    let total = numbers
        .iter()
        .try_fold(0u32, |acc, &n| acc.checked_add(n))
        .unwrap_or(u32::MAX);

    if goalkeepers != 1 || total != STARTING_SIZE as u32 {
        return Err(FormationError::InvalidTotal {
            descriptor: descriptor.to_string(),
            goalkeepers,
            total,
        });
    }

    // Each outfield count is at most 10 here, so the narrowing is lossless.
    Ok(FormationQuotas {
        defenders: defenders as u8,
        midfielders: midfielders as u8,
        forwards: forwards as u8,
    })
}

impl FromStr for FormationQuotas {
    type Err = FormationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formation(s)
    }
}

impl TryFrom<String> for FormationQuotas {
    type Error = FormationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_formation(&s)
    }
}

impl From<FormationQuotas> for String {
    fn from(f: FormationQuotas) -> Self {
        f.to_string()
    }
}

impl fmt::Display for FormationQuotas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1-{}-{}-{}", self.defenders, self.midfielders, self.forwards)
    }
}
