//! Panel error taxonomy.
//!
//! Every variant is recovered at the panel boundary: callers get the error
//! back, the panel's UI state reflects the recovery path (manual-address
//! prompt, explicit empty list, selection list restored), and nothing
//! propagates out as a crash.

use thiserror::Error;

/// Everything that can go wrong inside the map panel.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Device geolocation was denied, timed out, or is unsupported.
    #[error("device location unavailable: {0}")]
    LocationUnavailable(String),

    /// User input was unusable (empty address, out-of-range selection).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The geocoder had no match for the address or failed outright.
    #[error("could not geocode address: {0}")]
    GeocodeFailed(String),

    /// A category tag outside the dispatch table.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// The POI backend was unreachable or its payload undecodable.
    #[error("facility lookup failed: {0}")]
    FetchFailed(String),

    /// The directions provider returned a non-OK status.
    #[error("no route to destination: {0}")]
    RouteUnavailable(String),
}

/// Shorthand result type for panel operations.
pub type PanelResult<T = ()> = Result<T, PanelError>;
