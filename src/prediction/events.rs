//! Nearby-venue impact scoring.
//!
//! Each operational venue within [`EVENT_RADIUS_KM`] yields a dampened impact
//! from its category weight, distance, live popularity and rating. The overall
//! factor is the strongest single venue; simultaneous events do not stack.

use crate::geo::haversine_km;
use crate::parking::{NearbyVenue, ParkingLocation, PlaceType};
use crate::prediction::result::{SignificantVenue, round_to};
use std::collections::BTreeMap;

/// Venues beyond this distance have no influence.
pub const EVENT_RADIUS_KM: f64 = 1.0;
/// Fraction of a venue's raw deviation from 1.0 that is applied.
pub const IMPACT_DAMPENING: f64 = 0.5;
/// Venues above this dampened impact are reported.
pub const SIGNIFICANT_IMPACT: f64 = 1.1;
/// Rating counts at or above this carry full weight.
pub const RATING_COUNT_CAP: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EventImpact {
    /// Always >= 1.0.
    pub factor: f64,
    pub significant_venues: Vec<SignificantVenue>,
}

impl Default for EventImpact {
    fn default() -> Self {
        Self {
            factor: 1.0,
            significant_venues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventImpactScorer {
    venue_weights: BTreeMap<String, f64>,
}

impl EventImpactScorer {
    pub fn new(venue_weights: BTreeMap<String, f64>) -> Self {
        Self { venue_weights }
    }

    fn venue_weight(&self, place_type: PlaceType) -> f64 {
        self.venue_weights
            .get(place_type.as_str())
            .copied()
            .unwrap_or(1.0)
    }

    pub fn score(&self, lot: &ParkingLocation, venues: &[NearbyVenue]) -> EventImpact {
        let mut impact = EventImpact::default();

        for venue in venues.iter().filter(|venue| venue.is_operational) {
            let distance_km =
                haversine_km(lot.latitude, lot.longitude, venue.latitude, venue.longitude);
            if distance_km > EVENT_RADIUS_KM {
                continue;
            }

            let venue_impact = self.venue_impact(venue, distance_km);
            impact.factor = impact.factor.max(venue_impact);

            if venue_impact > SIGNIFICANT_IMPACT {
                impact.significant_venues.push(SignificantVenue {
                    name: venue.venue_name.clone(),
                    place_type: venue.place_type,
                    distance_km: round_to(distance_km, 2),
                    impact: round_to(venue_impact - 1.0, 2),
                });
            }
        }

        impact
    }

    /// Dampened impact of one venue at `distance_km` from the lot.
    pub fn venue_impact(&self, venue: &NearbyVenue, distance_km: f64) -> f64 {
        let distance_decay = 1.0 - distance_km / EVENT_RADIUS_KM;
        let popularity_factor = venue
            .current_popularity
            .map_or(1.0, |popularity| 1.0 + f64::from(popularity) / 100.0);
        let rating_factor = match (venue.rating, venue.user_ratings_total) {
            (Some(rating), Some(count)) => {
                let rating_weight = (f64::from(count) / RATING_COUNT_CAP).min(1.0);
                1.0 + ((rating / 5.0) - 0.5) * rating_weight
            }
            _ => 1.0,
        };

        let raw = self.venue_weight(venue.place_type)
            * distance_decay
            * popularity_factor
            * rating_factor;
        1.0 + (raw - 1.0) * IMPACT_DAMPENING
    }
}
