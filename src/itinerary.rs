// itinerary request and the language model behind it

use crate::config::PlannerConfig;
use crate::models::{format_datetime, BudgetTier, FlightOffer, PlanRequest, TravelTheme};
use async_trait::async_trait;
use rig::prelude::*;
use rig::{agent::Agent, completion::Prompt, providers::openai};
use tracing::{error, info};

const NOT_AVAILABLE: &str = "Not available";

const PLANNER_INSTRUCTIONS: &str = "\
    You are a travel planner.\n\
    - Gather details about the user's travel preferences and budget.\n\
    - Create a detailed itinerary with scheduled activities and estimated costs.\n\
    - Ensure the itinerary includes transportation options and travel time estimates.\n\
    - Optimize the schedule for convenience and enjoyment.\n\
    - Present the itinerary in a structured format.";

#[derive(Debug, thiserror::Error)]
#[error("Language model error: {0}")]
pub struct ModelError(pub String);

#[async_trait]
pub trait ItineraryModel: Send + Sync {
    async fn complete(&self, request: &str) -> Result<String, ModelError>;
}

/// The facts a planning request is built from.
#[derive(Debug, Clone)]
pub struct ItineraryRequest<'a> {
    pub destination: &'a str,
    pub num_days: u32,
    pub theme: TravelTheme,
    pub budget: BudgetTier,
    pub activity_preferences: &'a str,
    pub flights: &'a [FlightOffer],
}

impl<'a> ItineraryRequest<'a> {
    pub fn new(request: &'a PlanRequest, flights: &'a [FlightOffer]) -> Self {
        Self {
            destination: request.destination.trim(),
            num_days: request.num_days,
            theme: request.theme,
            budget: request.budget,
            activity_preferences: &request.activity_preferences,
            flights,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Destination: {}\n\
             Trip duration: {} days\n\
             Travel theme: {}\n\
             Budget: {}\n\
             Preferred activities: {}\n\
             \n\
             Flight data:\n{}\n\
             \n\
             Rules:\n\
             - Use ONLY the flight data provided if available.\n\
             - If data is missing, say \"{}\".\n\
             - Do NOT invent airlines, prices, or timings.\n\
             \n\
             Create a realistic, day-wise travel itinerary.\n\
             Do not invent flight prices or airlines.",
            self.destination,
            self.num_days,
            self.theme.label(),
            self.budget.label(),
            self.activity_preferences,
            flight_facts(self.flights),
            NOT_AVAILABLE,
        )
    }
}

fn flight_facts(flights: &[FlightOffer]) -> String {
    if flights.is_empty() {
        return format!("- {}", NOT_AVAILABLE);
    }
    flights
        .iter()
        .enumerate()
        .map(|(i, offer)| {
            format!(
                "- Option {}: airline {}, departs {}, arrives {}, duration {}, price {}",
                i + 1,
                offer.airline().unwrap_or(NOT_AVAILABLE),
                fact_time(offer.departure_time()),
                fact_time(offer.arrival_time()),
                offer
                    .total_duration
                    .map(|m| format!("{} min", m))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                offer.price.as_deref().unwrap_or(NOT_AVAILABLE),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn fact_time(raw: Option<&str>) -> String {
    match raw {
        Some(_) => format_datetime(raw),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Planner agent served from an OpenAI-compatible endpoint.
pub struct RigItineraryModel {
    agent: Agent<openai::CompletionModel>,
}

impl RigItineraryModel {
    pub fn new(config: &PlannerConfig) -> Self {
        // an empty key sends the request without usable credentials
        let api_key = config.llm_api_key.as_deref().unwrap_or_default();
        let client = openai::Client::from_url(api_key, &config.llm_base_url);

        let agent = client
            .agent(&config.model_id)
            .preamble(PLANNER_INSTRUCTIONS)
            .max_tokens(config.max_tokens)
            .temperature(config.temperature)
            .build();

        info!("Planner agent initialized with model {}", config.model_id);
        Self { agent }
    }
}

#[async_trait]
impl ItineraryModel for RigItineraryModel {
    async fn complete(&self, request: &str) -> Result<String, ModelError> {
        match self.agent.prompt(request).await {
            Ok(response) => {
                info!("Agent successfully generated itinerary");
                Ok(response)
            }
            Err(e) => {
                error!("Agent execution failed: {}", e);
                Err(ModelError(e.to_string()))
            }
        }
    }
}
