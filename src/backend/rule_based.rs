//! Rule-based reply generation
//!
//! Deterministic keyword matching on the lowercased message, keyed first by
//! request type and then by keyword group. The first matching group in
//! declared order wins; there is no scoring.
//!
//! Never suspends, never fails. This is the fallback of last resort.

use super::{BackendKind, GenerationBackend};
use crate::property::PropertyProfile;
use crate::request::{RequestType, ResidentRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Sub-topic of a request, chosen by keyword group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Plumbing,
    Hvac,
    Electrical,
    GeneralMaintenance,
    Fitness,
    Pool,
    Clubhouse,
    AmenityList,
    Package,
    Guest,
    Events,
    Dining,
    LocalArea,
    General,
}

const MAINTENANCE_GROUPS: &[(&[&str], Topic)] = &[
    (&["leak", "water", "faucet", "toilet"], Topic::Plumbing),
    (&["heat", "cold", "hvac", "temperature", "air"], Topic::Hvac),
    (&["electric", "power", "outlet", "light"], Topic::Electrical),
];

const AMENITY_GROUPS: &[(&[&str], Topic)] = &[
    (&["gym", "fitness", "workout"], Topic::Fitness),
    (&["pool", "swim", "lap"], Topic::Pool),
    (&["clubhouse", "event", "party"], Topic::Clubhouse),
];

const COMMUNITY_GROUPS: &[(&[&str], Topic)] = &[
    (&["event", "social", "community"], Topic::Events),
    (&["restaurant", "food", "dining", "eat"], Topic::Dining),
];

/// First group with any keyword contained in the message
fn first_match(message: &str, groups: &[(&[&str], Topic)]) -> Option<Topic> {
    groups
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| message.contains(k)))
        .map(|(_, topic)| *topic)
}

fn topic_for(request_type: RequestType, message: &str) -> Topic {
    match request_type {
        RequestType::Maintenance => {
            first_match(message, MAINTENANCE_GROUPS).unwrap_or(Topic::GeneralMaintenance)
        }
        RequestType::AmenityBooking => {
            first_match(message, AMENITY_GROUPS).unwrap_or(Topic::AmenityList)
        }
        RequestType::CommunityInfo => {
            first_match(message, COMMUNITY_GROUPS).unwrap_or(Topic::LocalArea)
        }
        RequestType::PackageInquiry => Topic::Package,
        RequestType::GuestAccess => Topic::Guest,
        RequestType::GeneralInquiry | RequestType::Emergency => Topic::General,
    }
}

/// Keyword-driven template backend
#[derive(Debug, Clone)]
pub struct RuleBasedBackend {
    profile: Arc<PropertyProfile>,
}

impl RuleBasedBackend {
    pub fn new(profile: Arc<PropertyProfile>) -> Self {
        Self { profile }
    }

    /// Synchronous reply, shared with the local model's in-process fallback
    pub fn reply_for(&self, request: &ResidentRequest) -> String {
        let message = request.message().to_lowercase();
        let topic = topic_for(request.request_type(), &message);
        self.render(topic, request.unit_number())
    }

    fn render(&self, topic: Topic, unit: &str) -> String {
        let name = &self.profile.name;
        match topic {
            Topic::Plumbing => format!(
                "I understand you're experiencing a water-related issue in Unit {unit}. \
I've immediately notified our maintenance team, and someone will contact you within 2 hours \
to schedule a repair. For urgent water issues, we have emergency maintenance available 24/7. \
Is this causing any immediate damage that needs emergency attention?"
            ),
            Topic::Hvac => format!(
                "I see you're having HVAC concerns in Unit {unit}. Our climate control systems \
are monitored 24/7. I've logged your request and our maintenance team will investigate within \
24 hours. In the meantime, you can adjust settings on your smart thermostat. Would you like me \
to walk you through the controls?"
            ),
            Topic::Electrical => format!(
                "I've received your electrical issue report for Unit {unit}. For safety, I'm \
prioritizing this request. Our certified electrician will be notified immediately and should \
contact you within 4 hours. Please avoid using the affected outlets until it's resolved. If \
you're experiencing a complete power outage, please let me know immediately."
            ),
            Topic::GeneralMaintenance => format!(
                "Thank you for reporting this maintenance issue in Unit {unit}. I've created a \
work order and our team will assess the situation within 24 hours. You'll receive updates via \
the app as we progress. Is there anything else about this issue I should know?"
            ),
            Topic::Fitness => "I'd be happy to help you book the fitness center! Our 24/7 \
fitness center features state-of-the-art equipment. Peak hours are 6-9 AM and 5-8 PM. Would \
you prefer a time outside peak hours for a less crowded experience? I can also set up recurring \
bookings if you have a regular workout schedule."
                .to_string(),
            Topic::Pool => "Perfect timing for pool season! Our pool is open 6 AM to 10 PM \
daily. I can book you a lane for lap swimming or reserve poolside seating. We also have pool \
towels available. What time works best for you? I'll send you the pool rules and current \
temperature in the app."
                .to_string(),
            Topic::Clubhouse => "The clubhouse is perfect for gatherings! It accommodates up \
to 50 people and includes a full kitchen, AV system, and beautiful views. I can check \
availability and send you the booking details. Are you planning a private event? I can also \
recommend local catering services that other residents love."
                .to_string(),
            Topic::AmenityList => format!(
                "I can help you book any of our premium amenities: {}. Which one interests you? \
I'll check availability and get you all set up!",
                self.profile.amenities.join(", ")
            ),
            Topic::Package => format!(
                "Let me check on your packages for Unit {unit}. Our secure package room uses \
smart lockers with automatic notifications. You should receive an app notification when \
packages arrive. I'll verify the current status and send you an update within 15 minutes. If \
you're expecting something specific, I can track it with the carrier."
            ),
            Topic::Guest => format!(
                "I'll be glad to set up guest access! I can create temporary access codes for \
the main entrance and garage. Your guests will receive instructions via text. How many guests \
and what dates? I can also provide them with visitor parking information and a brief welcome \
guide to {name}'s amenities."
            ),
            Topic::Events => format!(
                "We have wonderful community events at {name}! This month features rooftop yoga \
sessions, wine tastings in the clubhouse, and our monthly resident mixer. I'll send you the full \
calendar. We also have a resident group chat for informal meetups. Would you like to join?"
            ),
            Topic::Dining => format!(
                "Great dining options near {name}! {}. I can recommend specific restaurants \
based on your preferences - Italian, sushi, casual dining, or fine dining. Would you like me to \
make a reservation somewhere special?",
                self.profile.local_area.dining
            ),
            Topic::LocalArea => format!(
                "The {name} community offers so much! Nearby you'll find {}; for shopping, {}; \
and for transit, {}. What specific information can I help you with? I know all the best local \
spots!",
                self.profile.local_area.parks,
                self.profile.local_area.shopping,
                self.profile.local_area.transit
            ),
            Topic::General => format!(
                "Hello! I'm Elysia, your personal concierge at {name}. I'm here 24/7 to help with \
maintenance requests, amenity bookings, package tracking, guest access, local recommendations, \
and anything else you need. How can I make your day at {name} better?"
            ),
        }
    }
}

#[async_trait]
impl GenerationBackend for RuleBasedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::RuleBased
    }

    async fn generate_reply(&self, request: &ResidentRequest) -> String {
        self.reply_for(request)
    }
}
