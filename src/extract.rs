// offer extraction from the two search document layouts

use crate::models::FlightOffer;
use serde_json::Value;

/// How many offers are shown and resolved per submission.
pub const MAX_OFFERS: usize = 3;

const BEST_OFFERS_KEY: &str = "best_flights";
const ANSWER_BLOCKS_KEY: &str = "answer_box_list";
const FLIGHTS_BLOCK_TYPE: &str = "google_flights";

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerBlock {
    pub kind: Option<String>,
    pub offers: Vec<FlightOffer>,
}

impl AnswerBlock {
    fn from_value(value: &Value) -> Self {
        Self {
            kind: value.get("type").and_then(Value::as_str).map(str::to_string),
            offers: offers_in(value.get("flights")),
        }
    }

    pub fn is_flights(&self) -> bool {
        self.kind.as_deref() == Some(FLIGHTS_BLOCK_TYPE)
    }
}

/// The layouts a search document can take, decided by which top-level key is present.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResponse {
    BestOffers(Vec<FlightOffer>),
    AnswerBlocks(Vec<AnswerBlock>),
    Empty,
}

impl SearchResponse {
    pub fn from_document(document: &Value) -> Self {
        // presence of the key wins, even when its value is unusable
        if let Some(best) = document.get(BEST_OFFERS_KEY) {
            return SearchResponse::BestOffers(offers_in(Some(best)));
        }
        match document.get(ANSWER_BLOCKS_KEY) {
            Some(Value::Array(blocks)) => {
                SearchResponse::AnswerBlocks(blocks.iter().map(AnswerBlock::from_value).collect())
            }
            _ => SearchResponse::Empty,
        }
    }

    /// True when the document had neither offer layout, or only empty ones.
    pub fn has_no_offer_data(&self) -> bool {
        match self {
            SearchResponse::BestOffers(offers) => offers.is_empty(),
            SearchResponse::AnswerBlocks(blocks) => blocks.is_empty(),
            SearchResponse::Empty => true,
        }
    }
}

fn offers_in(value: Option<&Value>) -> Vec<FlightOffer> {
    match value {
        Some(Value::Array(items)) => items.iter().map(FlightOffer::from_value).collect(),
        _ => Vec::new(),
    }
}

/// Up to three offers in provider order. Best offers take precedence over answer blocks;
/// an empty result means "no offers found", never a failure.
pub fn extract_offers(response: &SearchResponse) -> Vec<FlightOffer> {
    match response {
        SearchResponse::BestOffers(offers) => offers.iter().take(MAX_OFFERS).cloned().collect(),
        SearchResponse::AnswerBlocks(blocks) => blocks
            .iter()
            .filter(|block| block.is_flights())
            .flat_map(|block| block.offers.iter())
            .take(MAX_OFFERS)
            .cloned()
            .collect(),
        SearchResponse::Empty => Vec::new(),
    }
}
