// flight search against the serpapi google flights engine

use crate::config::PlannerConfig;
use crate::models::TripRequest;
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

const ROUND_TRIP_ENGINE: &str = "google_flights";
const SEARCH_PATH: &str = "/search.json";
const ERROR_FIELD: &str = "error";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Search API returned error status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to parse search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A round-trip search as sent to the provider. Inputs are passed through unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightQuery {
    pub departure_id: String,
    pub arrival_id: String,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
    pub currency: String,
    pub locale: String,
    pub api_key: Option<String>,
    pub departure_token: Option<String>,
}

impl FlightQuery {
    pub fn round_trip(trip: &TripRequest, config: &PlannerConfig) -> Self {
        Self {
            departure_id: trip.source.clone(),
            arrival_id: trip.destination.clone(),
            outbound_date: trip.departure_date,
            return_date: trip.return_date,
            currency: config.currency.clone(),
            locale: config.locale.clone(),
            api_key: config.serpapi_key.clone(),
            departure_token: None,
        }
    }

    pub fn with_departure_token(mut self, token: &str) -> Self {
        self.departure_token = Some(token.to_string());
        self
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", ROUND_TRIP_ENGINE.to_string()),
            ("departure_id", self.departure_id.clone()),
            ("arrival_id", self.arrival_id.clone()),
            ("outbound_date", self.outbound_date.format("%Y-%m-%d").to_string()),
            ("return_date", self.return_date.format("%Y-%m-%d").to_string()),
            ("currency", self.currency.clone()),
            ("hl", self.locale.clone()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        if let Some(token) = &self.departure_token {
            params.push(("departure_token", token.clone()));
        }
        params
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns the provider's raw document, including documents that carry an error descriptor.
    async fn search(&self, query: &FlightQuery) -> Result<Value, SearchError>;
}

/// The provider's error descriptor, if the document carries one.
pub fn provider_error(document: &Value) -> Option<String> {
    match document.get(ERROR_FIELD)? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

pub struct SerpApiClient {
    http: Client,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(config: &PlannerConfig) -> Result<Self, SearchError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.serpapi_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &FlightQuery) -> Result<Value, SearchError> {
        let request = self
            .http
            .get(format!("{}{}", self.base_url, SEARCH_PATH))
            .query(&query.params())
            .build()?;

        info!("Executing flight search: {}", redact_api_key(request.url().as_str()));

        let response = self.http.execute(request).await?;
        let status = response.status();
        info!("Received search response status: {}", status);

        let body = response.text().await?;
        debug!("Search response body: {}", body);

        match serde_json::from_str::<Value>(&body) {
            Ok(document) if status.is_success() => Ok(document),
            // error documents are data for the caller, not transport failures
            Ok(document) if provider_error(&document).is_some() => {
                warn!("Search provider reported an error with status {}", status);
                Ok(document)
            }
            Ok(_) => Err(SearchError::Status { status, body }),
            Err(e) if status.is_success() => Err(SearchError::Decode(e)),
            Err(_) => Err(SearchError::Status { status, body }),
        }
    }
}

// hide credentials in logged urls
fn redact_api_key(url: &str) -> String {
    match Regex::new(r"api_key=[^&]*") {
        Ok(regex) => regex.replace_all(url, "api_key=***").into_owned(),
        Err(_) => url.to_string(),
    }
}
