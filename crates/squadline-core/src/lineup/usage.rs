// Saved-lineup quota per user and gameweek.
//
// The current count is supplied by the storage layer; this module only
// compares. Making the read and the following insert atomic is the storage
// layer's job (see `db::Database::save_lineup`).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::issue::{ErrorKind, ValidationIssue};
use super::rules::DEFAULT_MAX_LINEUPS_PER_GAMEWEEK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("lineup limit reached: {count} of {limit} saved for this gameweek")]
    LimitExceeded { count: u32, limit: u32 },
}

impl UsageError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::LimitExceeded
    }

    pub fn to_issue(&self) -> ValidationIssue {
        ValidationIssue::new(self.kind(), self.to_string()).with_field("gameweek_id")
    }
}

/// Saved count, limit, and what is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub saved: u32,
    pub limit: u32,
    pub remaining: u32,
}

impl UsageSummary {
    pub fn new(saved: u32, limit: u32) -> Self {
        Self {
            saved,
            limit,
            remaining: limit.saturating_sub(saved),
        }
    }
}

/// Allow one more save when `current_count` is below the default limit of 3.
pub fn check_usage(current_count: u32) -> Result<UsageSummary, UsageError> {
    check_usage_with_limit(current_count, DEFAULT_MAX_LINEUPS_PER_GAMEWEEK)
}

/// Allow one more save when `current_count < limit`. The returned summary
/// describes the state before the save.
pub fn check_usage_with_limit(current_count: u32, limit: u32) -> Result<UsageSummary, UsageError> {
    if current_count >= limit {
        debug!(current_count, limit, "lineup save blocked by usage limit");
        return Err(UsageError::LimitExceeded {
            count: current_count,
            limit,
        });
    }
    Ok(UsageSummary::new(current_count, limit))
}
