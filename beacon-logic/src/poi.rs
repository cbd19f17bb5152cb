use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    category::PoiCategory,
    error::{PanelError, PanelResult},
    location::LatLng,
    prelude::*,
};

/// Fixed search radius sent with every category fetch, in backend units.
pub const SEARCH_RADIUS: u32 = 10_000;

/// Result lists are cut to this many entries before display.
pub const MAX_RESULTS: usize = 5;

/// One normalized facility row, uniform across all categories. Optional
/// fields missing from the backend payload stay `None` and render as
/// [`PoiItem::NOT_AVAILABLE`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoiItem {
    pub name: String,
    pub address: String,
    pub distance_label: Option<String>,
    pub rating: Option<String>,
}

impl PoiItem {
    pub const NOT_AVAILABLE: &'static str = "N/A";

    pub fn distance_display(&self) -> &str {
        self.distance_label.as_deref().unwrap_or(Self::NOT_AVAILABLE)
    }

    pub fn rating_display(&self) -> &str {
        self.rating.as_deref().unwrap_or(Self::NOT_AVAILABLE)
    }
}

/// Query for one category fetch, exactly as sent to the backend. Carrying
/// the category on the request is what lets the panel discard responses
/// that arrive after the user has moved on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoiRequest {
    pub category: PoiCategory,
    pub at: LatLng,
    pub radius: u32,
}

impl PoiRequest {
    pub fn new(category: PoiCategory, at: LatLng) -> Self {
        Self {
            category,
            at,
            radius: SEARCH_RADIUS,
        }
    }

    /// Query string appended to the category endpoint.
    pub fn query(&self) -> String {
        format!(
            "lat={}&lng={}&radius={}",
            self.at.lat, self.at.lng, self.radius
        )
    }
}

pub trait PoiBackend: Send + Sync {
    /// Perform the GET for `req` and return the raw JSON body. Decoding
    /// and field extraction stay in [`normalize`] so the category table
    /// is consulted in exactly one place.
    fn fetch(&self, req: PoiRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Backend payloads are heterogeneous per category; only these fields are
/// common enough to read. Anything else is ignored.
#[derive(Debug, Deserialize)]
struct RawPoiItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    distance_miles: Option<Value>,
    #[serde(default)]
    rating: Option<Value>,
}

/// Some backends send strings, some numbers; both become labels.
fn label(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a backend payload into at most [`MAX_RESULTS`] normalized items.
///
/// The named response field missing means zero results, not an error
/// (backends omit the field when nothing matched). Backend order is kept;
/// there is no client-side sorting.
pub(crate) fn normalize(category: PoiCategory, body: &str) -> PanelResult<Vec<PoiItem>> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| PanelError::FetchFailed(err.to_string()))?;

    let Some(rows) = value
        .get(category.info().response_field)
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    Ok(rows
        .iter()
        .take(MAX_RESULTS)
        .map(|row| {
            let raw: RawPoiItem = serde_json::from_value(row.clone()).unwrap_or(RawPoiItem {
                name: None,
                address: None,
                distance_miles: None,
                rating: None,
            });
            PoiItem {
                name: raw.name.unwrap_or_default(),
                address: raw.address.unwrap_or_default(),
                distance_label: label(raw.distance_miles),
                rating: label(raw.rating),
            }
        })
        .collect())
}
