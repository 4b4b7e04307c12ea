//! Task phases
//!
//! A run executes exactly one phase. Map consumes raw pairs; combine and
//! reduce consume groups of adjacent pairs sharing a key.

use crate::error::{ErrorCode, TaskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phase of a MapReduce task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Map,
    Combine,
    Reduce,
}

impl Phase {
    /// Every phase, in pipeline order
    pub const ALL: [Phase; 3] = [Phase::Map, Phase::Combine, Phase::Reduce];

    /// Name accepted by [`resolve_phase`]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Map => "map",
            Phase::Combine => "combine",
            Phase::Reduce => "reduce",
        }
    }

    /// Whether this phase consumes grouped input
    pub fn is_grouped(self) -> bool {
        !matches!(self, Phase::Map)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a phase from its name.
///
/// Matching is exact and case-sensitive. An empty name is reported as a
/// missing phase, anything else unrecognized as an unknown phase.
pub fn resolve_phase(name: &str) -> Result<Phase, TaskError> {
    match name {
        "map" => Ok(Phase::Map),
        "combine" => Ok(Phase::Combine),
        "reduce" => Ok(Phase::Reduce),
        "" => Err(TaskError::validation_with_code(
            ErrorCode::VALIDATION_MISSING_PHASE,
            "Missing phase",
            Some("phase".to_string()),
        )),
        other => Err(TaskError::validation_with_code(
            ErrorCode::VALIDATION_UNKNOWN_PHASE,
            format!("Unknown phase '{}'", other),
            Some("phase".to_string()),
        )),
    }
}

impl FromStr for Phase {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_phase(s)
    }
}
