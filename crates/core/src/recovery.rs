//! Operator-initiated requeue of stuck or failed analysis jobs.

use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

/// Status an operator may requeue back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryTarget {
    /// Jobs left claimed by a crashed or hung process.
    InProgress,
    /// Jobs whose last attempt failed.
    Failed,
}

/// Accepted values for the recovery `status` parameter.
pub const VALID_RECOVERY_TARGETS: &[&str] = &["in_progress", "failed"];

impl FromStr for RecoveryTarget {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid recovery status '{other}'. Must be one of: {}",
                VALID_RECOVERY_TARGETS.join(", ")
            ))),
        }
    }
}
