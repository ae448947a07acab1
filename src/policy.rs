//! Classification policy
//!
//! Pure mapping from (request type, priority) to the metadata attached to
//! every concierge response. Shared by every generation backend.

use crate::request::{Priority, RequestType};

/// Metadata decision for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Human-readable resolution-time estimate
    pub estimate: &'static str,
    /// Request needs priority human attention
    pub escalate: bool,
    /// Staff must follow up with the resident
    pub follow_up: bool,
}

/// Classify a request
///
/// Total over both enumerations (the match below is exhaustive, so there is
/// no "unmapped type" case), no I/O, never fails.
/// - `escalate` iff priority is urgent or emergency
/// - `follow_up` iff the type is maintenance or guest access
pub fn classify(request_type: RequestType, priority: Priority) -> Classification {
    Classification {
        estimate: estimate_for(request_type),
        escalate: matches!(priority, Priority::Urgent | Priority::Emergency),
        follow_up: matches!(
            request_type,
            RequestType::Maintenance | RequestType::GuestAccess
        ),
    }
}

fn estimate_for(request_type: RequestType) -> &'static str {
    match request_type {
        RequestType::Maintenance => "24-48 hours for standard requests",
        RequestType::AmenityBooking => "Immediate confirmation",
        RequestType::PackageInquiry => "Real-time status",
        RequestType::GuestAccess => "Immediate setup",
        RequestType::CommunityInfo => "Immediate response",
        RequestType::GeneralInquiry => "Within 2 hours",
        RequestType::Emergency => "Immediate response",
    }
}
