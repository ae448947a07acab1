//! Static property information endpoints
//!
//! Everything here is derived from the configured [`PropertyProfile`]; no
//! booking system is consulted.
//!
//! [`PropertyProfile`]: crate::property::PropertyProfile

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::handlers::AppState;
use crate::property::{AmenityAvailability, BuildingInfo, LocalArea};

/// `GET /` service metadata
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let profile = state.concierge().profile();
    Json(json!({
        "service": "Elysia Concierge API",
        "property": format!("{} - {}", profile.name, profile.location),
        "management": profile.management_company,
        "status": "operational",
        "endpoints": {
            "submit_request": "/api/elysia/request",
            "amenities": "/api/elysia/amenities",
            "amenity_availability": "/api/elysia/amenities/{amenity}/availability",
            "community": "/api/elysia/community",
            "status": "/api/elysia/status/{request_id}",
            "health": "/health",
            "metrics": "/metrics",
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct AmenitiesResponse {
    pub amenities: Vec<String>,
    pub operating_hours: BTreeMap<String, String>,
    pub amenity_hours: BTreeMap<String, String>,
    pub booking_available: bool,
}

/// `GET /api/elysia/amenities`
pub async fn amenities(State(state): State<AppState>) -> Json<AmenitiesResponse> {
    let profile = state.concierge().profile();
    Json(AmenitiesResponse {
        amenities: profile.amenities.clone(),
        operating_hours: profile.operating_hours.clone(),
        amenity_hours: profile.amenity_hours.clone(),
        booking_available: true,
    })
}

/// `GET /api/elysia/amenities/{amenity}/availability`
pub async fn availability(
    State(state): State<AppState>,
    Path(amenity): Path<String>,
) -> Json<AmenityAvailability> {
    let answer = state.concierge().profile().availability_for(&amenity);
    tracing::debug!(amenity = %amenity, available = answer.available, "Amenity availability lookup");
    Json(answer)
}

#[derive(Debug, Serialize)]
pub struct CommunityResponse {
    pub property_name: String,
    pub location: String,
    pub management_company: String,
    pub local_highlights: Vec<String>,
    pub local_area: LocalArea,
    pub building: BuildingInfo,
    pub weather_today: &'static str,
    pub events: &'static str,
}

/// `GET /api/elysia/community`
pub async fn community(State(state): State<AppState>) -> Json<CommunityResponse> {
    let profile = state.concierge().profile();
    Json(CommunityResponse {
        property_name: profile.name.clone(),
        location: profile.location.clone(),
        management_company: profile.management_company.clone(),
        local_highlights: profile.local_highlights.clone(),
        local_area: profile.local_area.clone(),
        building: profile.building.clone(),
        weather_today: "Check current Colorado weather",
        events: "Community events updated weekly",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::rule_based_state;

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let Json(body) = root(State(rule_based_state())).await;
        assert_eq!(body["property"], "The Avant - Centennial, Colorado");
        assert_eq!(body["endpoints"]["submit_request"], "/api/elysia/request");
    }

    #[tokio::test]
    async fn test_amenities_includes_booking_flag() {
        let Json(body) = amenities(State(rule_based_state())).await;
        assert!(body.booking_available);
        assert!(body.amenities.iter().any(|a| a.starts_with("Fitness Center")));
        assert_eq!(body.amenity_hours.get("pool").map(String::as_str), Some("6 AM - 10 PM"));
    }

    #[tokio::test]
    async fn test_availability_normalizes_name() {
        let Json(body) = availability(State(rule_based_state()), Path("Fitness Center".to_string())).await;
        assert!(body.available);
        assert_eq!(body.hours.as_deref(), Some("24/7"));
    }

    #[tokio::test]
    async fn test_unknown_amenity_unavailable() {
        let Json(body) = availability(State(rule_based_state()), Path("bowling".to_string())).await;
        assert_eq!(body, AmenityAvailability::unavailable());
    }

    #[tokio::test]
    async fn test_community_uses_profile() {
        let Json(body) = community(State(rule_based_state())).await;
        assert_eq!(body.property_name, "The Avant");
        assert_eq!(body.local_highlights.len(), 5);
        assert_eq!(body.building.total_units, 280);
    }
}
