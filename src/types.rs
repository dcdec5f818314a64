use std::fmt::Debug;
use std::fmt::Display;

use thiserror::Error;

/// Outcome of an update request. Absence of the entity is a regular outcome,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

/// Outcome of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Failures surfaced by [`AsideCache`](crate::cache::AsideCache) operations.
///
/// Cache-layer faults never show up here: the cache is a performance
/// optimization, not a source of truth, so they are logged and recovered
/// locally. Store faults always propagate.
#[derive(Debug, Error)]
pub enum AsideError<SE>
where
    SE: Debug + Display,
{
    #[error("store failure: {0}")]
    Store(SE),

    /// The identifier addressed by the caller and the one carried by the
    /// payload disagree. Surfaced to the caller, never retried.
    #[error("entity identifier mismatch: request addresses '{requested}', payload carries '{supplied}'")]
    IdMismatch { requested: String, supplied: String },
}

/// Failures surfaced by [`CartStore`](crate::session::CartStore) operations.
/// The cart has no backing store, so here the cache backend is authoritative
/// and its faults are hard.
#[derive(Debug, Error)]
pub enum CartError<CE>
where
    CE: Debug + Display,
{
    #[error("cache backend failure: {0}")]
    Backend(CE),

    #[error("cart payload codec failure: {0}")]
    Codec(#[source] serde_json::Error),
}
