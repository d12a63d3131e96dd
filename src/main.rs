// trip planner api

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shuttle_axum::ShuttleAxum;
use shuttle_runtime::SecretStore;
use std::sync::Arc;
use tracing::{error, info};

mod booking;
mod config;
mod extract;
mod itinerary;
mod models;
mod planner;
mod search;

use booking::{BookingLinkResolver, FareCorrelation};
use config::{CorrelationStrategy, PlannerConfig};
use itinerary::RigItineraryModel;
use models::{PlanRequest, PlanResponse, StatusResponse, MAX_TRIP_DAYS, MIN_TRIP_DAYS};
use planner::{PlannerError, TripPlanner};
use search::SerpApiClient;

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Failed to generate plan - {0}")]
    Planner(#[from] PlannerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Planner(_) => (StatusCode::BAD_GATEWAY, "MODEL_ERROR"),
        };
        let body = Json(json!({ "error": kind, "message": self.to_string() }));
        (status, body).into_response()
    }
}

// main api endpoint
async fn generate_plan_handler(
    State(planner): State<Arc<TripPlanner>>,
    Json(payload): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    info!(
        "Received planning request: {} -> {}, {} days",
        payload.source, payload.destination, payload.num_days
    );

    validate_plan_request(&payload)?;

    let outcome = planner.plan(&payload).await.map_err(|e| {
        error!("Planning task failed: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Planning task completed: {} flight cards, itinerary {} chars",
        outcome.flights.len(),
        outcome.itinerary.len()
    );

    Ok(Json(PlanResponse {
        welcome: payload.welcome_message(),
        provider_error: outcome.provider_error,
        warnings: outcome.warnings,
        flights: outcome.flights,
        itinerary: outcome.itinerary,
    }))
}

// form bounds only; codes and dates go to the provider as typed
fn validate_plan_request(request: &PlanRequest) -> Result<(), ApiError> {
    if request.source.trim().is_empty() || request.destination.trim().is_empty() {
        return Err(ApiError::Validation(
            "Departure and destination codes are required".to_string(),
        ));
    }
    if !(MIN_TRIP_DAYS..=MAX_TRIP_DAYS).contains(&request.num_days) {
        return Err(ApiError::Validation(format!(
            "Trip duration must be between {} and {} days",
            MIN_TRIP_DAYS, MAX_TRIP_DAYS
        )));
    }
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// which credentials are loaded, never their values
async fn status_handler(State(planner): State<Arc<TripPlanner>>) -> Json<StatusResponse> {
    let config = planner.config();
    Json(StatusResponse {
        serpapi_key_loaded: config.serpapi_key.is_some(),
        llm_key_loaded: config.llm_api_key.is_some(),
        maps_key_loaded: config.maps_api_key.is_some(),
        model: config.model_id.clone(),
    })
}

// shuttle entry point
#[shuttle_runtime::main]
async fn axum(#[shuttle_runtime::Secrets] secret_store: SecretStore) -> ShuttleAxum {
    info!("Starting Trip Planner API v1.0");

    configure_api_keys(&secret_store);
    let config = PlannerConfig::from_env();

    let planner = build_planner(config)?;
    info!("Trip planner initialized");

    Ok(build_router(Arc::new(planner)).into())
}

// load secrets into env vars
fn configure_api_keys(secret_store: &SecretStore) {
    for key in config::SECRET_KEYS {
        if let Some(value) = secret_store.get(key) {
            std::env::set_var(key, value);
            info!("{} configured from secrets", key);
        }
    }
}

fn build_planner(config: PlannerConfig) -> anyhow::Result<TripPlanner> {
    let search = SerpApiClient::new(&config).context("Failed to create search client")?;
    let search = Arc::new(search);
    let model = RigItineraryModel::new(&config);

    let resolver = match config.correlation {
        CorrelationStrategy::Positional => BookingLinkResolver::new(search.clone()),
        CorrelationStrategy::Fare => {
            BookingLinkResolver::with_correlation(search.clone(), Box::new(FareCorrelation))
        }
    };
    info!("Booking links correlated by {} matching", config.correlation);

    Ok(TripPlanner::with_resolver(
        config,
        search,
        resolver,
        Arc::new(model),
    ))
}

// setup http routes
fn build_router(planner: Arc<TripPlanner>) -> Router {
    Router::new()
        .route("/generate-plan", post(generate_plan_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .with_state(planner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use models::{BudgetTier, TravelTheme};

    fn request_with_days(num_days: u32) -> PlanRequest {
        PlanRequest {
            source: "BOM".to_string(),
            destination: "DEL".to_string(),
            num_days,
            theme: TravelTheme::SoloExploration,
            budget: BudgetTier::Luxury,
            departure_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            activity_preferences: String::new(),
        }
    }

    #[test]
    fn trip_length_must_fit_the_form_range() {
        assert!(validate_plan_request(&request_with_days(1)).is_ok());
        assert!(validate_plan_request(&request_with_days(14)).is_ok());
        assert!(validate_plan_request(&request_with_days(0)).is_err());
        assert!(validate_plan_request(&request_with_days(15)).is_err());
    }

    #[test]
    fn blank_codes_are_rejected() {
        let mut request = request_with_days(3);
        request.destination = "  ".to_string();
        assert!(matches!(
            validate_plan_request(&request),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = ApiError::Validation("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_reports_loaded_keys_only() {
        let config = PlannerConfig {
            serpapi_key: Some("secret".to_string()),
            ..PlannerConfig::default()
        };
        let planner = Arc::new(build_planner(config).unwrap());

        let Json(status) = status_handler(State(planner)).await;
        let body = serde_json::to_value(&status).unwrap();

        assert_eq!(body["serpapi_key_loaded"], true);
        assert_eq!(body["llm_key_loaded"], false);
        assert_eq!(body["model"], "mistralai/Mistral-7B-Instruct-v0.3");
        assert!(!body.to_string().contains("secret"));
    }
}
