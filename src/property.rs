//! Property profile
//!
//! Static facts about the property: amenities, hours, contacts and the
//! surrounding area. Loaded from the `[property]` config section; every
//! field defaults to The Avant in Centennial, Colorado.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Facts about the property used in replies, prompts and info endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PropertyProfile {
    pub name: String,
    pub location: String,
    pub management_company: String,
    /// Prefix of generated request identifiers (e.g. "AVT")
    pub id_prefix: String,
    pub amenities: Vec<String>,
    pub amenity_hours: BTreeMap<String, String>,
    pub operating_hours: BTreeMap<String, String>,
    pub emergency_contacts: BTreeMap<String, String>,
    pub local_highlights: Vec<String>,
    pub local_area: LocalArea,
    pub building: BuildingInfo,
    /// Stubbed availability keyed by normalized amenity name
    pub availability: BTreeMap<String, AmenityAvailability>,
}

/// Neighborhood facts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalArea {
    pub parks: String,
    pub shopping: String,
    pub transit: String,
    pub dining: String,
}

/// Building facts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildingInfo {
    pub total_units: u32,
    pub floors: u32,
    pub built: u32,
    pub style: String,
}

/// Availability of a single amenity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AmenityAvailability {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_available: Option<String>,
}

impl AmenityAvailability {
    fn open(hours: &str) -> Self {
        Self {
            available: true,
            hours: Some(hours.to_string()),
            next_available: None,
        }
    }

    /// Answer for amenities the property does not know about
    pub fn unavailable() -> Self {
        Self {
            available: false,
            hours: None,
            next_available: None,
        }
    }
}

impl PropertyProfile {
    /// Look up stubbed availability for an amenity
    ///
    /// The name is normalized to lowercase with spaces replaced by
    /// underscores, so "Fitness Center" finds `fitness_center`.
    pub fn availability_for(&self, amenity: &str) -> AmenityAvailability {
        let key = amenity.trim().to_lowercase().replace(' ', "_");
        self.availability
            .get(&key)
            .cloned()
            .unwrap_or_else(AmenityAvailability::unavailable)
    }

    /// Phone number of the management office, if configured
    pub fn management_phone(&self) -> Option<&str> {
        self.emergency_contacts.get("management").map(String::as_str)
    }
}

fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for PropertyProfile {
    fn default() -> Self {
        let availability = [
            ("fitness_center", AmenityAvailability::open("24/7")),
            ("pool", AmenityAvailability::open("6 AM - 10 PM")),
            (
                "clubhouse",
                AmenityAvailability {
                    available: true,
                    hours: None,
                    next_available: Some("2:00 PM".to_string()),
                },
            ),
            ("coworking", AmenityAvailability::open("24/7")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            name: "The Avant".to_string(),
            location: "Centennial, Colorado".to_string(),
            management_company: "Kairoi Residential".to_string(),
            id_prefix: "AVT".to_string(),
            amenities: [
                "Fitness Center (24/7)",
                "Swimming Pool (6 AM - 10 PM)",
                "Clubhouse (6 AM - 11 PM)",
                "Coworking Spaces (24/7)",
                "Rooftop Terrace (6 AM - 11 PM)",
                "Pet Park (24/7)",
                "Package Room (24/7)",
                "EV Charging Stations",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            amenity_hours: map(&[
                ("fitness_center", "24/7"),
                ("pool", "6 AM - 10 PM"),
                ("clubhouse", "6 AM - 11 PM"),
                ("coworking", "24/7"),
                ("rooftop", "6 AM - 11 PM"),
            ]),
            operating_hours: map(&[
                ("office", "Monday-Friday 9 AM - 6 PM, Saturday 10 AM - 4 PM"),
                ("maintenance", "Monday-Friday 8 AM - 5 PM, Emergency 24/7"),
                ("concierge", "24/7 via Elysia"),
            ]),
            emergency_contacts: map(&[
                ("maintenance_emergency", "303-555-MAINT"),
                ("security", "303-555-SECURITY"),
                ("management", "303-555-MGMT"),
                ("police", "911"),
                ("fire", "911"),
            ]),
            local_highlights: [
                "Cherry Creek State Park - 5 minutes",
                "Centennial Center Park - 2 minutes",
                "Light Rail Access - Cherry Creek Station",
                "Premium Shopping - Cherry Creek Mall",
                "Dining - Centennial Promenade",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            local_area: LocalArea::default(),
            building: BuildingInfo::default(),
            availability,
        }
    }
}

impl Default for LocalArea {
    fn default() -> Self {
        Self {
            parks: "Cherry Creek State Park (5 min), Centennial Center Park (2 min)".to_string(),
            shopping: "Cherry Creek Mall (15 min), Centennial Promenade (5 min)".to_string(),
            transit: "Cherry Creek Light Rail Station (10 min)".to_string(),
            dining: "Centennial Promenade restaurants, local cafes".to_string(),
        }
    }
}

impl Default for BuildingInfo {
    fn default() -> Self {
        Self {
            total_units: 280,
            floors: 12,
            built: 2023,
            style: "Luxury modern apartments".to_string(),
        }
    }
}
