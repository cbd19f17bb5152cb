//! HTTP client for the readiness backend's category endpoints.
//!
//! The base URL is fixed at compile time from the build environment so a
//! deployed binary can't be pointed somewhere else by a stray runtime
//! variable.

use std::time::Duration;

use reqwest::Client;

use beacon_logic::{PoiBackend, PoiRequest, prelude::*};

const fn api_host() -> &'static str {
    if let Some(host) = option_env!("BEACON_API_HOST") {
        host
    } else {
        "127.0.0.1"
    }
}

const fn api_port() -> u16 {
    if let Some(port) = option_env!("BEACON_API_PORT") {
        const_str::parse!(port, u16)
    } else {
        8000
    }
}

const fn api_secure() -> bool {
    if let Some(secure) = option_env!("BEACON_API_SECURE") {
        const_str::eq_ignore_ascii_case!(secure, "true") || const_str::equal!(secure, "1")
    } else {
        false
    }
}

const fn api_proto() -> &'static str {
    if api_secure() { "https" } else { "http" }
}

const API_HOST: &str = api_host();
const API_PORT: u16 = api_port();
const API_PROTO: &str = api_proto();

const API_SOCKET: &str = const_str::concat!(API_HOST, ":", API_PORT);
const API_BASE_URL: &str = const_str::concat!(API_PROTO, "://", API_SOCKET);

pub const fn api_base_url() -> &'static str {
    API_BASE_URL
}

/// Timeout applied to every backend request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Couldn't build HTTP client")
}

/// [`PoiBackend`] over the real category endpoints.
pub struct PoiApiClient {
    client: Client,
    base_url: String,
}

impl PoiApiClient {
    pub fn new() -> Self {
        Self::with_base_url(API_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }
}

impl Default for PoiApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PoiBackend for PoiApiClient {
    async fn fetch(&self, req: PoiRequest) -> Result<String> {
        let url = format!(
            "{}{}?{}",
            self.base_url,
            req.category.info().endpoint,
            req.query()
        );
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the facility backend")?
            .error_for_status()
            .context("Facility backend returned an error status")?;

        response
            .text()
            .await
            .context("Failed to read the facility backend response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_logic::{LatLng, PoiCategory};

    #[test]
    fn default_base_url_is_the_local_backend() {
        assert_eq!(api_base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn request_url_matches_the_backend_contract() {
        let req = PoiRequest::new(
            PoiCategory::TransitStop,
            LatLng {
                lat: 37.77,
                lng: -122.42,
            },
        );
        let url = format!(
            "{}{}?{}",
            api_base_url(),
            req.category.info().endpoint,
            req.query()
        );
        assert_eq!(
            url,
            "http://127.0.0.1:8000/public-transportation/?lat=37.77&lng=-122.42&radius=10000"
        );
    }
}
