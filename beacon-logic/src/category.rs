use serde::{Deserialize, Serialize};

/// A facility category the panel can search for.
///
/// The set is closed; each variant maps to exactly one backend endpoint
/// and one response field through [`PoiCategory::info`]. Call sites never
/// branch on the category themselves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PoiCategory {
    MedicalFacility,
    FireStation,
    TransitStop,
    Structure,
    ElevatedGround,
    Shelter,
}

/// Static descriptor for one category: where to fetch and how to read the
/// response.
#[derive(Debug, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Stable tag used in user input and logs
    pub tag: &'static str,
    /// Endpoint path joined onto the backend base URL
    pub endpoint: &'static str,
    /// Name of the array field holding this category's results
    pub response_field: &'static str,
    /// Heading shown above the selection list
    pub title: &'static str,
}

impl PoiCategory {
    pub const ALL: [Self; 6] = [
        PoiCategory::MedicalFacility,
        PoiCategory::FireStation,
        PoiCategory::TransitStop,
        PoiCategory::Structure,
        PoiCategory::ElevatedGround,
        PoiCategory::Shelter,
    ];

    pub const fn info(self) -> &'static CategoryInfo {
        match self {
            Self::MedicalFacility => &CategoryInfo {
                tag: "medical-facility",
                endpoint: "/hospitals/",
                response_field: "hospitals",
                title: "Nearby Hospitals",
            },
            Self::FireStation => &CategoryInfo {
                tag: "fire-station",
                endpoint: "/fire-stations/",
                response_field: "fire_stations",
                title: "Nearby Fire Stations",
            },
            Self::TransitStop => &CategoryInfo {
                tag: "transit-stop",
                endpoint: "/public-transportation/",
                response_field: "public_transportation",
                title: "Nearby Public Transportation",
            },
            Self::Structure => &CategoryInfo {
                tag: "structure",
                endpoint: "/buildings/",
                response_field: "buildings",
                title: "Nearby Buildings",
            },
            Self::ElevatedGround => &CategoryInfo {
                tag: "elevated-ground",
                endpoint: "/viewpoints/",
                response_field: "viewpoints",
                title: "Nearby High Ground",
            },
            Self::Shelter => &CategoryInfo {
                tag: "shelter",
                endpoint: "/shelters/",
                response_field: "shelters",
                title: "Nearby Shelters",
            },
        }
    }

    /// Parse a user-supplied tag. Anything outside the table is `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.info().tag == tag)
    }
}
