//! Traffic-light compliance classification of an indicator against its target.

use serde::Serialize;

/// Fraction of the target that still counts as partial compliance.
pub const PARTIAL_RATIO: f64 = 0.8;

/// Target assumed for rows that carry none.
pub const DEFAULT_TARGET: f64 = 90.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Meets,
    Partial,
    BelowTarget,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Self::Meets => "🟢 Cumple",
            Self::Partial => "🟡 Parcial",
            Self::BelowTarget => "🔴 No cumple",
        }
    }

    /// Row background used by the semáforo table.
    pub fn background(self) -> &'static str {
        match self {
            Self::Meets => "#d4edda",
            Self::Partial => "#fff3cd",
            Self::BelowTarget => "#f8d7da",
        }
    }
}

/// `Meets` iff `value >= target`, `Partial` iff `value >= 0.8 * target`,
/// otherwise `BelowTarget`. NaN on either side compares false and lands in
/// `BelowTarget`.
pub fn classify(value: f64, target: f64) -> Status {
    if value >= target {
        Status::Meets
    } else if value >= PARTIAL_RATIO * target {
        Status::Partial
    } else {
        Status::BelowTarget
    }
}
