// booking link resolution through a follow-up search

use crate::extract::SearchResponse;
use crate::models::{BookingReference, FlightOffer};
use crate::search::{FlightQuery, SearchProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Picks the follow-up offer that stands for an offer from the first search.
pub trait BookingCorrelation: Send + Sync {
    fn select<'a>(
        &self,
        position: usize,
        original: &FlightOffer,
        follow_up: &'a [FlightOffer],
    ) -> Option<&'a FlightOffer>;
}

/// Same position in both responses.
///
/// Assumes the provider keeps the ordering of the original query when a departure
/// token is attached. Nothing here verifies that.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalCorrelation;

impl BookingCorrelation for PositionalCorrelation {
    fn select<'a>(
        &self,
        position: usize,
        _original: &FlightOffer,
        follow_up: &'a [FlightOffer],
    ) -> Option<&'a FlightOffer> {
        follow_up.get(position)
    }
}

/// First follow-up offer with the same price and total duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FareCorrelation;

impl BookingCorrelation for FareCorrelation {
    fn select<'a>(
        &self,
        _position: usize,
        original: &FlightOffer,
        follow_up: &'a [FlightOffer],
    ) -> Option<&'a FlightOffer> {
        if original.price.is_none() || original.total_duration.is_none() {
            return None;
        }
        follow_up.iter().find(|candidate| {
            candidate.price == original.price && candidate.total_duration == original.total_duration
        })
    }
}

pub struct BookingLinkResolver {
    provider: Arc<dyn SearchProvider>,
    correlation: Box<dyn BookingCorrelation>,
}

impl BookingLinkResolver {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self::with_correlation(provider, Box::new(PositionalCorrelation))
    }

    pub fn with_correlation(
        provider: Arc<dyn SearchProvider>,
        correlation: Box<dyn BookingCorrelation>,
    ) -> Self {
        Self {
            provider,
            correlation,
        }
    }

    /// Booking reference for the offer at `position` of the first search, or `None`.
    ///
    /// No search is made without a continuation token. Follow-up failures are logged
    /// and reported as `None`.
    pub async fn resolve(
        &self,
        position: usize,
        query: &FlightQuery,
        offer: &FlightOffer,
    ) -> Option<BookingReference> {
        let token = match offer.continuation_token() {
            Some(token) => token,
            None => {
                debug!("Offer {} has no departure token, skipping booking lookup", position);
                return None;
            }
        };

        let follow_up_query = query.clone().with_departure_token(token);
        let document = match self.provider.search(&follow_up_query).await {
            Ok(document) => document,
            Err(e) => {
                warn!("Error fetching booking link for offer {}: {}", position, e);
                return None;
            }
        };

        let follow_up = match SearchResponse::from_document(&document) {
            SearchResponse::BestOffers(offers) => offers,
            _ => {
                warn!(
                    "Booking lookup for offer {} returned no best offers",
                    position
                );
                return None;
            }
        };

        let booking = self
            .correlation
            .select(position, offer, &follow_up)
            .and_then(|matched| matched.booking_token.as_deref())
            .filter(|token| !token.trim().is_empty())
            .map(|token| BookingReference(token.to_string()));

        match &booking {
            Some(_) => info!("Resolved booking link for offer {}", position),
            None => info!("No booking link available for offer {}", position),
        }
        booking
    }
}
