use serde::{Deserialize, Serialize};

use crate::{location::LatLng, prelude::*};

/// Travel mode for directions requests. Only driving is assumed today.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TravelMode {
    #[default]
    Driving,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "driving",
        }
    }
}

/// Whole-trip figures, as provider-formatted display text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSummary {
    pub distance: String,
    pub duration: String,
}

/// One turn instruction in the detail panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteStep {
    pub instruction: String,
    pub distance: String,
}

/// A computed route, ready to hand to the surface for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePlan {
    pub origin: LatLng,
    pub destination: String,
    pub summary: RouteSummary,
    pub steps: Vec<RouteStep>,
}

/// Outcome of a geocode call that reached the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    Found(LatLng),
    NoMatch,
}

/// The external geocoding + directions capability. The panel never
/// computes geometry itself; it only orchestrates calls through this seam.
pub trait MapsProvider: Send + Sync {
    /// Resolve a free-text address to a coordinate.
    fn geocode(&self, address: &str) -> impl Future<Output = Result<GeocodeOutcome>> + Send;

    /// Compute a route from `origin` to a destination address. A non-OK
    /// provider status (unreachable destination, zero results) is an `Err`.
    fn route(
        &self,
        origin: LatLng,
        destination: &str,
        mode: TravelMode,
    ) -> impl Future<Output = Result<RoutePlan>> + Send;
}
