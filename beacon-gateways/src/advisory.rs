//! Single-shot clients for the risk-assessment and disaster-response
//! endpoints. Display-only collaborators of the panel; one GET each.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use beacon_logic::{AdvisoryService, HazardKind, LatLng, RiskAssessment, prelude::*};

use crate::backend::{api_base_url, http_client};

#[derive(Deserialize)]
struct RiskResponse {
    risk_assessment: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct GuidanceResponse {
    response: String,
}

/// [`AdvisoryService`] over the readiness backend.
pub struct AdvisoryApiClient {
    client: Client,
    base_url: String,
}

impl AdvisoryApiClient {
    pub fn new() -> Self {
        Self::with_base_url(api_base_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into(),
        }
    }
}

impl Default for AdvisoryApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Risk levels arrive as strings or numbers depending on the model
/// behind the endpoint; both become display labels.
fn level_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl AdvisoryService for AdvisoryApiClient {
    async fn risk_assessment(&self, at: LatLng) -> Result<RiskAssessment> {
        let url = format!(
            "{}/risk-assessment?lat={}&lng={}",
            self.base_url, at.lat, at.lng
        );
        log::debug!("GET {url}");

        let response: RiskResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the risk-assessment endpoint")?
            .json()
            .await
            .context("Failed to decode the risk-assessment response")?;

        Ok(RiskAssessment {
            levels: response
                .risk_assessment
                .iter()
                .filter_map(|(field, value)| Some((field.clone(), level_label(value)?)))
                .collect(),
        })
    }

    async fn response_guidance(&self, hazard: HazardKind, at: LatLng) -> Result<String> {
        let url = format!(
            "{}/disaster-response?disaster_type={}&lat={}&lng={}",
            self.base_url,
            hazard.query_value(),
            at.lat,
            at.lng
        );
        log::debug!("GET {url}");

        let response: GuidanceResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the disaster-response endpoint")?
            .json()
            .await
            .context("Failed to decode the disaster-response response")?;

        Ok(response.response)
    }
}
