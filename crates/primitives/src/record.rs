//! Long-format fundamentals record.

use serde::{Deserialize, Serialize};

use crate::{EntityId, Period};

/// One long-format observation of a reported field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    /// Reporting entity.
    pub entity: EntityId,
    /// Period-end date of the report.
    pub period: Period,
    /// Field name, e.g. `fcfe` or `total_assets`.
    pub field: String,
    /// Reported value; `None` when the source had no number.
    pub value: Option<f64>,
}

impl FundamentalRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(
        entity: impl Into<EntityId>,
        period: Period,
        field: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        Self { entity: entity.into(), period, field: field.into(), value }
    }
}
