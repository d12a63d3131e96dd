// process-wide settings, read once at startup

use std::time::Duration;
use tracing::{info, warn};

pub const SERPAPI_KEY: &str = "SERPAPI_KEY";
pub const HF_TOKEN: &str = "HF_TOKEN";
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const MODEL_ID: &str = "MODEL_ID";
pub const MAX_TOKENS: &str = "MAX_TOKENS";
pub const TEMPERATURE: &str = "TEMPERATURE";
pub const LLM_BASE_URL: &str = "LLM_BASE_URL";
pub const SERPAPI_BASE_URL: &str = "SERPAPI_BASE_URL";
pub const API_TIMEOUT_SECONDS: &str = "API_TIMEOUT_SECONDS";
pub const BOOKING_CORRELATION: &str = "BOOKING_CORRELATION";

/// Every setting that may come from shuttle secrets.
pub const SECRET_KEYS: [&str; 10] = [
    SERPAPI_KEY,
    HF_TOKEN,
    GOOGLE_API_KEY,
    MODEL_ID,
    MAX_TOKENS,
    TEMPERATURE,
    LLM_BASE_URL,
    SERPAPI_BASE_URL,
    API_TIMEOUT_SECONDS,
    BOOKING_CORRELATION,
];

const DEFAULT_MODEL_ID: &str = "mistralai/Mistral-7B-Instruct-v0.3";
const DEFAULT_MAX_TOKENS: u64 = 2048;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_LLM_BASE_URL: &str = "https://router.huggingface.co/v1";
const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_LOCALE: &str = "en";

/// How follow-up offers are matched to the offers first shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationStrategy {
    #[default]
    Positional,
    Fare,
}

impl std::str::FromStr for CorrelationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positional" | "position" => Ok(CorrelationStrategy::Positional),
            "fare" => Ok(CorrelationStrategy::Fare),
            other => Err(format!("unknown booking correlation '{}'", other)),
        }
    }
}

impl std::fmt::Display for CorrelationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationStrategy::Positional => write!(f, "positional"),
            CorrelationStrategy::Fare => write!(f, "fare"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub serpapi_key: Option<String>,
    pub llm_api_key: Option<String>,
    /// Loaded for parity with deployments that set it; nothing in the pipeline reads it.
    pub maps_api_key: Option<String>,
    pub model_id: String,
    pub max_tokens: u64,
    pub temperature: f64,
    pub llm_base_url: String,
    pub serpapi_base_url: String,
    pub timeout: Duration,
    pub correlation: CorrelationStrategy,
    pub currency: String,
    pub locale: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            llm_api_key: None,
            maps_api_key: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            serpapi_base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            correlation: CorrelationStrategy::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key source; missing credentials only warn.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let serpapi_key = credential(&lookup, SERPAPI_KEY);
        let llm_api_key = credential(&lookup, HF_TOKEN);
        let maps_api_key = credential(&lookup, GOOGLE_API_KEY);

        if serpapi_key.is_none() {
            warn!("{} not set - flight searches will be sent unauthenticated", SERPAPI_KEY);
        }
        if llm_api_key.is_none() {
            warn!("{} not set - model calls will be sent unauthenticated", HF_TOKEN);
        }

        let config = Self {
            serpapi_key,
            llm_api_key,
            maps_api_key,
            model_id: lookup(MODEL_ID)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.model_id),
            max_tokens: tunable(&lookup, MAX_TOKENS, defaults.max_tokens),
            temperature: tunable(&lookup, TEMPERATURE, defaults.temperature),
            llm_base_url: lookup(LLM_BASE_URL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.llm_base_url),
            serpapi_base_url: lookup(SERPAPI_BASE_URL)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.serpapi_base_url),
            timeout: Duration::from_secs(tunable(
                &lookup,
                API_TIMEOUT_SECONDS,
                DEFAULT_TIMEOUT_SECONDS,
            )),
            correlation: tunable(&lookup, BOOKING_CORRELATION, defaults.correlation),
            currency: defaults.currency,
            locale: defaults.locale,
        };

        info!(
            "Planner configured: model={}, max_tokens={}, temperature={}",
            config.model_id, config.max_tokens, config.temperature
        );
        config
    }
}

// empty values and template placeholders count as missing
fn credential<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !is_placeholder(v))
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with("your_") && value.ends_with("_here")
}

// tunable with fallback
fn tunable<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Invalid {} value '{}', using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
