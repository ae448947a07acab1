//! Resident request and concierge response types
//!
//! `ResidentRequest` validates during deserialization so an invalid request
//! never reaches the concierge. Both types are immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum allowed message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Kind of help a resident is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Maintenance,
    AmenityBooking,
    PackageInquiry,
    GuestAccess,
    CommunityInfo,
    GeneralInquiry,
    Emergency,
}

impl RequestType {
    /// Every request type, in declaration order
    pub const ALL: [RequestType; 7] = [
        RequestType::Maintenance,
        RequestType::AmenityBooking,
        RequestType::PackageInquiry,
        RequestType::GuestAccess,
        RequestType::CommunityInfo,
        RequestType::GeneralInquiry,
        RequestType::Emergency,
    ];

    /// Wire name, also used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::AmenityBooking => "amenity_booking",
            Self::PackageInquiry => "package_inquiry",
            Self::GuestAccess => "guest_access",
            Self::CommunityInfo => "community_info",
            Self::GeneralInquiry => "general_inquiry",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resident-declared priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
    Emergency,
}

impl Priority {
    /// Every priority, lowest first
    pub const ALL: [Priority; 5] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
        Priority::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_contact() -> String {
    "app".to_string()
}

/// A resident's service request
///
/// Fields are private; use the accessors. Instances built with `new()` skip
/// boundary validation, which only applies to untrusted JSON input.
#[derive(Debug, Clone, Serialize)]
pub struct ResidentRequest {
    resident_id: String,
    unit_number: String,
    request_type: RequestType,
    message: String,
    priority: Priority,
    preferred_contact: String,
    timestamp: DateTime<Utc>,
}

impl ResidentRequest {
    /// Create a request with default priority (medium), contact ("app") and
    /// the current time as its timestamp
    pub fn new(
        resident_id: impl Into<String>,
        unit_number: impl Into<String>,
        request_type: RequestType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resident_id: resident_id.into(),
            unit_number: unit_number.into(),
            request_type,
            message: message.into(),
            priority: Priority::default(),
            preferred_contact: default_contact(),
            timestamp: Utc::now(),
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the preferred contact channel
    pub fn with_preferred_contact(mut self, contact: impl Into<String>) -> Self {
        self.preferred_contact = contact.into();
        self
    }

    pub fn resident_id(&self) -> &str {
        &self.resident_id
    }

    pub fn unit_number(&self) -> &str {
        &self.unit_number
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn preferred_contact(&self) -> &str {
        &self.preferred_contact
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Custom Deserialize implementation that validates during deserialization
impl<'de> Deserialize<'de> for ResidentRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawResidentRequest {
            resident_id: String,
            unit_number: String,
            request_type: RequestType,
            message: String,
            #[serde(default)]
            priority: Priority,
            #[serde(default = "default_contact")]
            preferred_contact: String,
            #[serde(default = "Utc::now")]
            timestamp: DateTime<Utc>,
        }

        let raw = RawResidentRequest::deserialize(deserializer)?;

        if raw.resident_id.trim().is_empty() {
            return Err(serde::de::Error::custom(
                "resident_id cannot be empty or contain only whitespace",
            ));
        }

        if raw.unit_number.trim().is_empty() {
            return Err(serde::de::Error::custom(
                "unit_number cannot be empty or contain only whitespace",
            ));
        }

        // Count Unicode characters, not bytes
        let char_count = raw.message.chars().count();
        if char_count > MAX_MESSAGE_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "message exceeds maximum length of {} characters (got {})",
                MAX_MESSAGE_LENGTH, char_count
            )));
        }

        let preferred_contact = if raw.preferred_contact.trim().is_empty() {
            default_contact()
        } else {
            raw.preferred_contact
        };

        Ok(ResidentRequest {
            resident_id: raw.resident_id,
            unit_number: raw.unit_number,
            request_type: raw.request_type,
            message: raw.message,
            priority: raw.priority,
            preferred_contact,
            timestamp: raw.timestamp,
        })
    }
}

/// Structured acknowledgment returned to the resident
///
/// Built exactly once per processed request by the concierge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConciergeResponse {
    response: String,
    request_id: String,
    estimated_resolution_time: String,
    follow_up_needed: bool,
    escalation_required: bool,
    satisfaction_prompt: bool,
}

impl ConciergeResponse {
    pub fn new(
        response: String,
        request_id: String,
        estimated_resolution_time: String,
        follow_up_needed: bool,
        escalation_required: bool,
    ) -> Self {
        Self {
            response,
            request_id,
            estimated_resolution_time,
            follow_up_needed,
            escalation_required,
            satisfaction_prompt: true,
        }
    }

    /// Reply text shown to the resident
    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn estimated_resolution_time(&self) -> &str {
        &self.estimated_resolution_time
    }

    pub fn follow_up_needed(&self) -> bool {
        self.follow_up_needed
    }

    pub fn escalation_required(&self) -> bool {
        self.escalation_required
    }

    pub fn satisfaction_prompt(&self) -> bool {
        self.satisfaction_prompt
    }
}
