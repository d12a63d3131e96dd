// end-to-end planning pipeline for one submission

use crate::booking::BookingLinkResolver;
use crate::config::PlannerConfig;
use crate::extract::{extract_offers, SearchResponse};
use crate::itinerary::{ItineraryModel, ItineraryRequest, ModelError};
use crate::models::{FlightCard, PlanRequest};
use crate::search::{provider_error, FlightQuery, SearchProvider};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const NO_FLIGHT_DATA: &str = "No flight data found in the search response.";
pub const NO_FLIGHTS_AVAILABLE: &str = "No flight data available.";

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug)]
pub struct PlanOutcome {
    pub provider_error: Option<String>,
    pub warnings: Vec<String>,
    pub flights: Vec<FlightCard>,
    pub itinerary: String,
}

pub struct TripPlanner {
    config: PlannerConfig,
    search: Arc<dyn SearchProvider>,
    resolver: BookingLinkResolver,
    model: Arc<dyn ItineraryModel>,
}

impl TripPlanner {
    pub fn with_resolver(
        config: PlannerConfig,
        search: Arc<dyn SearchProvider>,
        resolver: BookingLinkResolver,
        model: Arc<dyn ItineraryModel>,
    ) -> Self {
        Self {
            config,
            search,
            resolver,
            model,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Runs search, extraction, booking lookups and the itinerary call in sequence.
    /// Only a model failure aborts the run.
    pub async fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlannerError> {
        let trip = request.trip();
        info!(
            "Planning trip {} -> {} ({} to {})",
            trip.source, trip.destination, trip.departure_date, trip.return_date
        );

        let query = FlightQuery::round_trip(&trip, &self.config);
        let mut warnings = Vec::new();

        let (document, provider_error) = match self.search.search(&query).await {
            Ok(document) => {
                let provider_error = provider_error(&document);
                (document, provider_error)
            }
            Err(e) => {
                error!("Flight search failed: {}", e);
                (Value::Null, Some(e.to_string()))
            }
        };
        if let Some(message) = &provider_error {
            warn!("Search provider error: {}", message);
        }

        let response = SearchResponse::from_document(&document);
        if response.has_no_offer_data() {
            warnings.push(NO_FLIGHT_DATA.to_string());
        }

        let offers = extract_offers(&response);
        info!("Extracted {} flight offers", offers.len());
        if offers.is_empty() {
            warnings.push(NO_FLIGHTS_AVAILABLE.to_string());
        }

        let mut flights = Vec::with_capacity(offers.len());
        for (position, offer) in offers.iter().enumerate() {
            let booking = self.resolver.resolve(position, &query, offer).await;
            flights.push(FlightCard::new(offer, booking.as_ref()));
        }

        let itinerary_request = ItineraryRequest::new(request, &offers).render();
        let itinerary = self.model.complete(&itinerary_request).await?;
        info!("Itinerary generated, {} chars", itinerary.len());

        Ok(PlanOutcome {
            provider_error,
            warnings,
            flights,
            itinerary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::tests::StubProvider;
    use crate::models::{BudgetTier, TravelTheme};
    use crate::search::SearchError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Mutex;

    fn planner(search: Arc<StubProvider>, model: Arc<StubModel>) -> TripPlanner {
        let resolver = BookingLinkResolver::new(search.clone());
        TripPlanner::with_resolver(PlannerConfig::default(), search, resolver, model)
    }

    struct StubModel {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl StubModel {
        fn answering() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ItineraryModel for StubModel {
        async fn complete(&self, request: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(request.to_string());
            if self.fail {
                Err(ModelError("model unavailable".to_string()))
            } else {
                Ok("Day 1: arrive and explore.".to_string())
            }
        }
    }

    fn plan_request() -> PlanRequest {
        PlanRequest {
            source: "BOM".to_string(),
            destination: "DEL".to_string(),
            num_days: 3,
            theme: TravelTheme::FamilyVacation,
            budget: BudgetTier::Economy,
            departure_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            activity_preferences: "museums".to_string(),
        }
    }

    fn four_offers() -> Value {
        json!({
            "best_flights": [
                { "price": 100, "departure_token": "tok-a", "flights": [{ "airline": "A" }] },
                { "price": 200, "departure_token": "tok-b", "flights": [{ "airline": "B" }] },
                { "price": 300, "departure_token": "tok-c", "flights": [{ "airline": "C" }] },
                { "price": 400, "departure_token": "tok-d", "flights": [{ "airline": "D" }] }
            ]
        })
    }

    // follow-up searches echo the token back as the booking token at every position
    fn follow_up_for(token: &str) -> Value {
        let offers: Vec<Value> = (0..3)
            .map(|_| json!({ "booking_token": format!("book-{}", token) }))
            .collect();
        json!({ "best_flights": offers })
    }

    #[tokio::test]
    async fn top_three_offers_become_cards_with_their_own_links() {
        let search = Arc::new(StubProvider::new(|query| match &query.departure_token {
            None => Ok(four_offers()),
            Some(token) => Ok(follow_up_for(token)),
        }));
        let model = Arc::new(StubModel::answering());
        let planner = planner(search.clone(), model.clone());

        let outcome = planner.plan(&plan_request()).await.unwrap();

        let airlines: Vec<&str> = outcome.flights.iter().map(|c| c.airline.as_str()).collect();
        assert_eq!(airlines, vec!["A", "B", "C"]);
        let prices: Vec<&str> = outcome.flights.iter().map(|c| c.price.as_str()).collect();
        assert_eq!(prices, vec!["100", "200", "300"]);

        assert_eq!(
            search.tokens_seen(),
            vec![
                None,
                Some("tok-a".to_string()),
                Some("tok-b".to_string()),
                Some("tok-c".to_string()),
            ]
        );
        assert_eq!(
            outcome.flights[1].booking_link,
            "https://www.google.com/travel/flights?tfs=book-tok-b"
        );
        assert!(outcome.provider_error.is_none());
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.itinerary, "Day 1: arrive and explore.");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Option 3: airline C"));
        assert!(!prompts[0].contains("airline D"));
    }

    #[tokio::test]
    async fn provider_error_is_reported_and_run_continues() {
        let search = Arc::new(StubProvider::new(|_| Ok(json!({ "error": "rate limited" }))));
        let model = Arc::new(StubModel::answering());
        let planner = planner(search.clone(), model.clone());

        let outcome = planner.plan(&plan_request()).await.unwrap();

        assert_eq!(outcome.provider_error.as_deref(), Some("rate limited"));
        assert!(outcome.flights.is_empty());
        assert_eq!(
            outcome.warnings,
            vec![NO_FLIGHT_DATA.to_string(), NO_FLIGHTS_AVAILABLE.to_string()]
        );
        assert_eq!(search.call_count(), 1);
        assert!(model.prompts.lock().unwrap()[0].contains("Flight data:\n- Not available"));
    }

    #[tokio::test]
    async fn search_transport_failure_degrades_to_no_offers() {
        let search = Arc::new(StubProvider::new(|_| {
            Err(SearchError::Decode(
                serde_json::from_str::<Value>("not json").unwrap_err(),
            ))
        }));
        let planner = planner(search, Arc::new(StubModel::answering()));

        let outcome = planner.plan(&plan_request()).await.unwrap();

        assert!(outcome.provider_error.is_some());
        assert!(outcome.flights.is_empty());
    }

    #[tokio::test]
    async fn offers_without_tokens_get_placeholder_links() {
        let search = Arc::new(StubProvider::new(|_| {
            Ok(json!({ "best_flights": [{ "price": 100 }, { "price": 200 }] }))
        }));
        let planner = planner(search.clone(), Arc::new(StubModel::answering()));

        let outcome = planner.plan(&plan_request()).await.unwrap();

        assert_eq!(outcome.flights.len(), 2);
        assert!(outcome.flights.iter().all(|c| c.booking_link == "#"));
        assert_eq!(search.call_count(), 1);
    }

    #[tokio::test]
    async fn model_failure_aborts_the_run() {
        let search = Arc::new(StubProvider::new(|_| Ok(four_offers())));
        let planner = planner(search, Arc::new(StubModel::failing()));

        let result = planner.plan(&plan_request()).await;
        assert!(matches!(result, Err(PlannerError::Model(_))));
    }
}
