mod advisory;
mod backend;
mod maps;

pub use advisory::AdvisoryApiClient;
pub use backend::{PoiApiClient, api_base_url};
pub use maps::GoogleMapsGateway;
