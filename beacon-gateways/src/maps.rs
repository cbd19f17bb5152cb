//! Geocoding and directions over the Google Maps web-service endpoints.

use anyhow::bail;
use reqwest::Client;
use serde::Deserialize;

use beacon_logic::{
    GeocodeOutcome, LatLng, MapsProvider, RoutePlan, RouteStep, RouteSummary, TravelMode,
    prelude::*,
};

use crate::backend::http_client;

const MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// [`MapsProvider`] backed by the Google geocoding and directions APIs.
pub struct GoogleMapsGateway {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleMapsGateway {
    /// Reads the API key from `GOOGLE_MAPS_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var(KEY_VAR).with_context(|| format!("{KEY_VAR} is not set"))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(),
            api_key,
            base_url: MAPS_BASE_URL.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: Coordinates,
}

#[derive(Deserialize)]
struct Coordinates {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    legs: Vec<DirectionsLeg>,
}

#[derive(Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
    steps: Vec<DirectionsStep>,
}

#[derive(Deserialize)]
struct TextValue {
    text: String,
}

#[derive(Deserialize)]
struct DirectionsStep {
    html_instructions: String,
    distance: TextValue,
}

/// Step instructions arrive as HTML fragments; the detail panel wants
/// plain text.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn parse_geocode(body: &str) -> Result<GeocodeOutcome> {
    let response: GeocodeResponse =
        serde_json::from_str(body).context("Failed to decode geocode response")?;

    match response.status.as_str() {
        STATUS_OK => {
            let result = response
                .results
                .first()
                .context("Geocode response contained no results")?;
            Ok(GeocodeOutcome::Found(LatLng {
                lat: result.geometry.location.lat,
                lng: result.geometry.location.lng,
            }))
        }
        STATUS_ZERO_RESULTS => Ok(GeocodeOutcome::NoMatch),
        other => bail!("Geocoder returned status {other}"),
    }
}

fn parse_directions(origin: LatLng, destination: &str, body: &str) -> Result<RoutePlan> {
    let response: DirectionsResponse =
        serde_json::from_str(body).context("Failed to decode directions response")?;

    if response.status != STATUS_OK {
        bail!("Directions service returned status {}", response.status);
    }

    let leg = response
        .routes
        .first()
        .and_then(|route| route.legs.first())
        .context("Directions response contained no route legs")?;

    Ok(RoutePlan {
        origin,
        destination: destination.to_string(),
        summary: RouteSummary {
            distance: leg.distance.text.clone(),
            duration: leg.duration.text.clone(),
        },
        steps: leg
            .steps
            .iter()
            .map(|step| RouteStep {
                instruction: strip_tags(&step.html_instructions),
                distance: step.distance.text.clone(),
            })
            .collect(),
    })
}

impl MapsProvider for GoogleMapsGateway {
    async fn geocode(&self, address: &str) -> Result<GeocodeOutcome> {
        let url = format!("{}/geocode/json", self.base_url);
        log::debug!("Geocoding \"{address}\"");

        let body = self
            .client
            .get(&url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to reach the geocoder")?
            .text()
            .await
            .context("Failed to read the geocode response")?;

        parse_geocode(&body)
    }

    async fn route(
        &self,
        origin: LatLng,
        destination: &str,
        mode: TravelMode,
    ) -> Result<RoutePlan> {
        let url = format!("{}/directions/json", self.base_url);
        let origin_param = format!("{},{}", origin.lat, origin.lng);
        log::debug!("Routing {origin_param} -> \"{destination}\"");

        let body = self
            .client
            .get(&url)
            .query(&[
                ("origin", origin_param.as_str()),
                ("destination", destination),
                ("mode", mode.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach the directions service")?
            .text()
            .await
            .context("Failed to read the directions response")?;

        parse_directions(origin, destination, &body)
    }
}
