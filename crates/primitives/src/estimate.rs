//! Growth estimate outcome.

use serde::{Deserialize, Serialize};

/// Outcome of a growth-rate estimation for one entity and horizon.
///
/// `Degenerate` marks a computation whose base or trailing average was not
/// positive, so no compound rate exists. It is a tag, never a number that
/// could be averaged or ranked by accident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum GrowthEstimate {
    /// Compound annual growth rate.
    Value(f64),
    /// Non-positive base or trailing average.
    Degenerate,
    /// Not enough data to estimate.
    Undefined,
}

impl GrowthEstimate {
    /// The numeric rate, if any.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Degenerate | Self::Undefined => None,
        }
    }

    /// Whether this is a numeric rate.
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Whether this is the degenerate tag.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate)
    }

    /// Whether the estimate could not be computed.
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Short status label used in exported tables.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Degenerate => "degenerate",
            Self::Undefined => "undefined",
        }
    }
}

impl std::fmt::Display for GrowthEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.4}"),
            Self::Degenerate => write!(f, "degenerate"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}
