//! Prompt construction for model-backed variants
//!
//! All prompts share the same property context: facts from the profile, the
//! local date and time, and the request metadata.

use crate::property::PropertyProfile;
use crate::request::ResidentRequest;
use chrono::{NaiveDateTime, Timelike};

/// Delimiter after which the local model's reply begins
pub const REPLY_DELIMITER: &str = "Elysia:";

const GUIDELINES: &str = "\
Your Response Guidelines:
1. Be warm and professional, like a five-star hotel concierge
2. Acknowledge the specific request clearly
3. Provide actionable next steps
4. Offer additional assistance proactively
5. Use the property's amenities and services in your suggestions
6. Include relevant local knowledge when helpful
7. Always end with how you'll follow up";

/// Greeting word for the hour of day
///
/// morning 05-11, afternoon 12-16, evening otherwise.
pub fn time_of_day(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=16 => "afternoon",
        _ => "evening",
    }
}

/// Format as `Tuesday, March 04, 2025 at 09:05 AM`
pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format("%A, %B %d, %Y at %I:%M %p").to_string()
}

/// Persona and property facts, used as the system message for chat models
pub fn system_prompt(profile: &PropertyProfile, now: NaiveDateTime) -> String {
    format!(
        "You are Elysia, the AI concierge for {name} luxury apartments in {location}. \
You embody the highest standards of hospitality: warm, professional, knowledgeable and proactive.

Property Details:
- Name: {name}
- Location: {location}
- Management: {management}
- Available Amenities: {amenities}
- Local Highlights: {highlights}
- Current Time: {time} (good {time_of_day})

{guidelines}",
        name = profile.name,
        location = profile.location,
        management = profile.management_company,
        amenities = profile.amenities.join(", "),
        highlights = profile.local_highlights.join("; "),
        time = format_timestamp(now),
        time_of_day = time_of_day(now.hour()),
        guidelines = GUIDELINES,
    )
}

/// Request details, used as the user message for chat models
pub fn user_message(request: &ResidentRequest) -> String {
    format!(
        "Resident Information:
- Unit {unit}
- Request Type: {request_type}
- Priority: {priority}
- Preferred Contact: {contact}

Resident Request: \"{message}\"",
        unit = request.unit_number(),
        request_type = request.request_type(),
        priority = request.priority(),
        contact = request.preferred_contact(),
        message = request.message(),
    )
}

/// Single-string prompt for completion-style hosted APIs
pub fn concierge_prompt(
    profile: &PropertyProfile,
    request: &ResidentRequest,
    now: NaiveDateTime,
) -> String {
    format!(
        "{}\n\n{}\n\nResponse:",
        system_prompt(profile, now),
        user_message(request)
    )
}

/// Role-framed prompt for the local causal model
///
/// Ends with [`REPLY_DELIMITER`]; the text the model appends is the reply.
pub fn local_prompt(
    profile: &PropertyProfile,
    request: &ResidentRequest,
    now: NaiveDateTime,
) -> String {
    format!(
        "You are Elysia, a professional concierge at {name} luxury apartments in {location}. \
You are helpful, warm, and knowledgeable about apartment living. It is {time}.

Resident (Unit {unit}, {request_type}, {priority} priority): {message}

{delimiter}",
        name = profile.name,
        location = profile.location,
        time = format_timestamp(now),
        unit = request.unit_number(),
        request_type = request.request_type(),
        priority = request.priority(),
        message = request.message(),
        delimiter = REPLY_DELIMITER,
    )
}

/// Extract the reply from raw model output
///
/// Keeps the text after the last delimiter (or the whole output if the
/// runtime returned only the continuation), trimmed and cut to `max_chars`
/// characters. Returns `None` when nothing usable remains.
pub fn extract_reply(generated: &str, max_chars: usize) -> Option<String> {
    let tail = match generated.rfind(REPLY_DELIMITER) {
        Some(idx) => &generated[idx + REPLY_DELIMITER.len()..],
        None => generated,
    };
    let reply: String = tail.trim().chars().take(max_chars).collect();
    let reply = reply.trim_end().to_string();
    if reply.is_empty() { None } else { Some(reply) }
}
