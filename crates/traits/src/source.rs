//! Fundamentals source trait definitions.

use fundpanel_primitives::{EntityId, FundamentalRecord};

/// Errors a fundamentals source can report for one entity.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport failure (network, timeout).
    #[error("transport error for {entity}: {message}")]
    Transport {
        /// Entity being fetched.
        entity: EntityId,
        /// Underlying failure.
        message: String,
    },

    /// The source answered but the payload could not be used.
    #[error("malformed response for {entity}: {message}")]
    Malformed {
        /// Entity being fetched.
        entity: EntityId,
        /// What was wrong with the payload.
        message: String,
    },

    /// The source does not know the entity.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),
}

/// Per-entity provider of long-format fundamentals.
///
/// A source is queried one entity at a time; rate limiting is the caller's
/// concern.
pub trait FundamentalsSource {
    /// Fetch every available record for `entity`.
    ///
    /// # Errors
    /// Returns `SourceError` if the entity cannot be fetched.
    fn fetch(&mut self, entity: &EntityId) -> Result<Vec<FundamentalRecord>, SourceError>;

    /// Returns the name of this source.
    fn name(&self) -> &str;
}
