// data models for trip requests and flight offers

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

// form defaults
const DEFAULT_SOURCE: &str = "BOM";
const DEFAULT_DESTINATION: &str = "DEL";
const DEFAULT_NUM_DAYS: u32 = 5;
const DEFAULT_ACTIVITIES: &str = "Relaxing on the beach, exploring historical sites";

pub const MIN_TRIP_DAYS: u32 = 1;
pub const MAX_TRIP_DAYS: u32 = 14;

const PROVIDER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const CARD_TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";
const BOOKING_URL_PREFIX: &str = "https://www.google.com/travel/flights?tfs=";
const NO_BOOKING_LINK: &str = "#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelTheme {
    CoupleGetaway,
    FamilyVacation,
    AdventureTrip,
    SoloExploration,
}

impl TravelTheme {
    pub fn label(self) -> &'static str {
        match self {
            TravelTheme::CoupleGetaway => "Couple Getaway",
            TravelTheme::FamilyVacation => "Family Vacation",
            TravelTheme::AdventureTrip => "Adventure Trip",
            TravelTheme::SoloExploration => "Solo Exploration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Economy,
    Standard,
    Luxury,
}

impl BudgetTier {
    pub fn label(self) -> &'static str {
        match self {
            BudgetTier::Economy => "Economy",
            BudgetTier::Standard => "Standard",
            BudgetTier::Luxury => "Luxury",
        }
    }
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}

fn default_num_days() -> u32 {
    DEFAULT_NUM_DAYS
}

fn default_activities() -> String {
    DEFAULT_ACTIVITIES.to_string()
}

/// Everything the user submits from the planning form.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_num_days")]
    pub num_days: u32,
    pub theme: TravelTheme,
    pub budget: BudgetTier,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    #[serde(default = "default_activities")]
    pub activity_preferences: String,
}

impl PlanRequest {
    pub fn trip(&self) -> TripRequest {
        TripRequest {
            source: self.source.trim().to_string(),
            destination: self.destination.trim().to_string(),
            departure_date: self.departure_date,
            return_date: self.return_date,
        }
    }

    pub fn welcome_message(&self) -> String {
        format!(
            "Your {} to {} is about to begin! Let's find the best flights, stays, and experiences for your unforgettable journey.",
            self.theme.label(),
            self.destination.trim()
        )
    }
}

/// Locations and dates of a round trip, fixed for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    pub source: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AirportTime {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FlightSegment {
    #[serde(default)]
    pub departure_airport: Option<AirportTime>,
    #[serde(default)]
    pub arrival_airport: Option<AirportTime>,
    #[serde(default)]
    pub airline: Option<String>,
}

/// One priced option as returned by the search provider. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FlightOffer {
    #[serde(default, deserialize_with = "lenient_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub total_duration: Option<u64>,
    #[serde(default, rename = "flights")]
    pub segments: Vec<FlightSegment>,
    #[serde(default)]
    pub airline_logo: Option<String>,
    #[serde(default)]
    pub departure_token: Option<String>,
    #[serde(default)]
    pub booking_token: Option<String>,
}

impl FlightOffer {
    /// Reads an offer without failing; a malformed entry degrades to an empty offer.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!("Unreadable flight offer, keeping it as empty: {}", e);
            FlightOffer::default()
        })
    }

    pub fn continuation_token(&self) -> Option<&str> {
        self.departure_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn airline(&self) -> Option<&str> {
        self.segments.first().and_then(|s| s.airline.as_deref())
    }

    pub fn departure_time(&self) -> Option<&str> {
        self.segments
            .first()
            .and_then(|s| s.departure_airport.as_ref())
            .and_then(|a| a.time.as_deref())
    }

    pub fn arrival_time(&self) -> Option<&str> {
        self.segments
            .last()
            .and_then(|s| s.arrival_airport.as_ref())
            .and_then(|a| a.time.as_deref())
    }
}

// prices arrive as numbers from one engine and text from another
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Opaque reference accepted by the booking page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReference(pub String);

impl BookingReference {
    pub fn url(&self) -> String {
        format!("{}{}", BOOKING_URL_PREFIX, self.0)
    }
}

/// Display-ready view of an offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightCard {
    pub airline_logo: String,
    pub airline: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub price: String,
    pub booking_link: String,
}

impl FlightCard {
    pub fn new(offer: &FlightOffer, booking: Option<&BookingReference>) -> Self {
        Self {
            airline_logo: offer.airline_logo.clone().unwrap_or_default(),
            airline: offer.airline().unwrap_or("Unknown Airline").to_string(),
            departure_time: format_datetime(offer.departure_time()),
            arrival_time: format_datetime(offer.arrival_time()),
            duration: offer
                .total_duration
                .map(|m| format!("{} min", m))
                .unwrap_or_else(|| "N/A".to_string()),
            price: offer
                .price
                .clone()
                .unwrap_or_else(|| "Not Available".to_string()),
            booking_link: booking
                .map(BookingReference::url)
                .unwrap_or_else(|| NO_BOOKING_LINK.to_string()),
        }
    }
}

// "2025-03-01 06:05" -> "01 Mar 2025, 06:05 AM"
pub fn format_datetime(raw: Option<&str>) -> String {
    match raw {
        Some(text) => NaiveDateTime::parse_from_str(text, PROVIDER_TIME_FORMAT)
            .map(|dt| dt.format(CARD_TIME_FORMAT).to_string())
            .unwrap_or_else(|_| text.to_string()),
        None => "N/A".to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub welcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<String>,
    pub warnings: Vec<String>,
    pub flights: Vec<FlightCard>,
    pub itinerary: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub serpapi_key_loaded: bool,
    pub llm_key_loaded: bool,
    pub maps_key_loaded: bool,
    pub model: String,
}
