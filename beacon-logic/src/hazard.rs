use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    category::PoiCategory,
    location::{LatLng, SharedLocationReader},
    poi::PoiItem,
    prelude::*,
};

/// The hazard dashboards that embed the map panel. Each one browses a
/// different facility category by default and reads its own field out of
/// the risk-assessment payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HazardKind {
    Earthquake,
    Hurricane,
    Tsunami,
    Wildfire,
    NuclearEvent,
}

impl HazardKind {
    pub const ALL: [Self; 5] = [
        HazardKind::Earthquake,
        HazardKind::Hurricane,
        HazardKind::Tsunami,
        HazardKind::Wildfire,
        HazardKind::NuclearEvent,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Earthquake => "earthquake",
            Self::Hurricane => "hurricane",
            Self::Tsunami => "tsunami",
            Self::Wildfire => "wildfire",
            Self::NuclearEvent => "nuclear-event",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.tag() == tag)
    }

    /// Category this dashboard searches when it opens.
    pub fn default_category(self) -> PoiCategory {
        match self {
            Self::Earthquake => PoiCategory::Structure,
            Self::Hurricane => PoiCategory::TransitStop,
            Self::Tsunami => PoiCategory::ElevatedGround,
            Self::Wildfire => PoiCategory::FireStation,
            Self::NuclearEvent => PoiCategory::MedicalFacility,
        }
    }

    /// Field name inside the risk-assessment payload.
    pub fn risk_field(self) -> &'static str {
        match self {
            Self::Earthquake => "Earthquake Risk",
            Self::Hurricane => "Hurricane Risk",
            Self::Tsunami => "Tsunami Risk",
            Self::Wildfire => "Wildfire Risk",
            Self::NuclearEvent => "Nuclear Event Risk",
        }
    }

    /// Value sent as the advisory backend's `disaster_type` parameter.
    pub fn query_value(self) -> &'static str {
        self.tag()
    }
}

/// Per-hazard risk levels as returned by the advisory backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub levels: HashMap<String, String>,
}

impl RiskAssessment {
    pub fn level_for(&self, hazard: HazardKind) -> Option<&str> {
        self.levels.get(hazard.risk_field()).map(String::as_str)
    }
}

/// Single-shot advisory fetches. Display-only collaborators: one GET
/// each, no orchestration, no retries.
pub trait AdvisoryService: Send + Sync {
    fn risk_assessment(&self, at: LatLng) -> impl Future<Output = Result<RiskAssessment>> + Send;

    fn response_guidance(
        &self,
        hazard: HazardKind,
        at: LatLng,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// The statistic-card values a hazard dashboard shows next to the panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HazardSnapshot {
    pub nearby_count: usize,
    pub nearest_distance: String,
    pub top_rating: String,
    pub risk_level: String,
}

/// A hazard dashboard's view of the shared location: read-only subscriber
/// plus the advisory collaborator. Never writes the location.
pub struct HazardView<A: AdvisoryService> {
    kind: HazardKind,
    advisory: A,
    location: SharedLocationReader,
}

impl<A: AdvisoryService> HazardView<A> {
    pub fn new(kind: HazardKind, advisory: A, location: SharedLocationReader) -> Self {
        Self {
            kind,
            advisory,
            location,
        }
    }

    pub fn kind(&self) -> HazardKind {
        self.kind
    }

    /// Derive the statistic cards from the panel's current list plus one
    /// risk fetch. Anything unavailable renders as "N/A".
    pub async fn snapshot(&self, items: &[PoiItem]) -> HazardSnapshot {
        let risk_level = match self.location.get() {
            Some(at) => match self.advisory.risk_assessment(at).await {
                Ok(risk) => risk
                    .level_for(self.kind)
                    .unwrap_or(PoiItem::NOT_AVAILABLE)
                    .to_string(),
                Err(_) => PoiItem::NOT_AVAILABLE.to_string(),
            },
            None => PoiItem::NOT_AVAILABLE.to_string(),
        };

        HazardSnapshot {
            nearby_count: items.len(),
            nearest_distance: items
                .first()
                .map(|item| item.distance_display().to_string())
                .unwrap_or_else(|| PoiItem::NOT_AVAILABLE.to_string()),
            top_rating: items
                .first()
                .map(|item| item.rating_display().to_string())
                .unwrap_or_else(|| PoiItem::NOT_AVAILABLE.to_string()),
            risk_level,
        }
    }

    /// Response guidance text, if the backend has any and a location is
    /// set. Absence is not an error at this layer.
    pub async fn guidance(&self) -> Option<String> {
        let at = self.location.get()?;
        self.advisory.response_guidance(self.kind, at).await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{location::SharedLocation, tests::MockAdvisory};

    const POINT: LatLng = LatLng {
        lat: 37.77,
        lng: -122.42,
    };

    fn items(distance: Option<&str>) -> Vec<PoiItem> {
        vec![PoiItem {
            name: "General".to_string(),
            address: "1 Main St".to_string(),
            distance_label: distance.map(str::to_string),
            rating: None,
        }]
    }

    #[test]
    fn every_hazard_has_a_distinct_default_category() {
        for hazard in HazardKind::ALL {
            assert_eq!(HazardKind::from_tag(hazard.tag()), Some(hazard));
        }
        let categories: std::collections::HashSet<_> = HazardKind::ALL
            .iter()
            .map(|h| h.default_category().info().tag)
            .collect();
        assert_eq!(categories.len(), HazardKind::ALL.len());
    }

    #[tokio::test]
    async fn snapshot_reads_the_risk_field_for_its_hazard() {
        let shared = SharedLocation::new();
        shared.set(POINT);
        let advisory = MockAdvisory::with_level("Earthquake Risk", "High");
        let view = HazardView::new(HazardKind::Earthquake, advisory, shared.subscribe());

        let snapshot = view.snapshot(&items(Some("1.2 mi"))).await;

        assert_eq!(snapshot.nearby_count, 1);
        assert_eq!(snapshot.nearest_distance, "1.2 mi");
        assert_eq!(snapshot.top_rating, "N/A");
        assert_eq!(snapshot.risk_level, "High");
    }

    #[tokio::test]
    async fn snapshot_is_all_not_available_without_data() {
        let shared = SharedLocation::new();
        let view = HazardView::new(
            HazardKind::Tsunami,
            MockAdvisory::default(),
            shared.subscribe(),
        );

        let snapshot = view.snapshot(&[]).await;

        assert_eq!(snapshot.nearby_count, 0);
        assert_eq!(snapshot.nearest_distance, "N/A");
        assert_eq!(snapshot.top_rating, "N/A");
        assert_eq!(snapshot.risk_level, "N/A");
    }

    #[tokio::test]
    async fn advisory_failure_renders_not_available() {
        let shared = SharedLocation::new();
        shared.set(POINT);
        let advisory = MockAdvisory::with_level("Wildfire Risk", "Low");
        advisory
            .fail
            .store(true, std::sync::atomic::Ordering::Relaxed);
        let view = HazardView::new(HazardKind::Wildfire, advisory, shared.subscribe());

        let snapshot = view.snapshot(&[]).await;
        assert_eq!(snapshot.risk_level, "N/A");
        assert_eq!(view.guidance().await, None);
    }

    #[tokio::test]
    async fn guidance_comes_back_verbatim() {
        let shared = SharedLocation::new();
        shared.set(POINT);
        let advisory = MockAdvisory::default();
        *advisory.guidance.lock().unwrap() = Some("Drop, cover, hold on.".to_string());
        let view = HazardView::new(HazardKind::Earthquake, advisory, shared.subscribe());

        assert_eq!(
            view.guidance().await.as_deref(),
            Some("Drop, cover, hold on.")
        );
    }
}
