mod category;
mod error;
mod hazard;
mod location;
mod maps;
mod panel;
mod poi;
mod profile;
mod surface;

pub use category::{CategoryInfo, PoiCategory};
pub use error::{PanelError, PanelResult};
pub use hazard::{AdvisoryService, HazardKind, HazardSnapshot, HazardView, RiskAssessment};
pub use location::{
    LatLng, Location, LocationService, LocationSource, SharedLocation, SharedLocationReader,
};
pub use maps::{GeocodeOutcome, MapsProvider, RoutePlan, RouteStep, RouteSummary, TravelMode};
pub use panel::{MapPanel, PanelUiState, RouteUi, StateUpdateSender};
pub use poi::{MAX_RESULTS, PoiBackend, PoiItem, PoiRequest, SEARCH_RADIUS};
pub use profile::{ProfileStore, UserProfile};
pub use surface::MapSurface;

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
