use crate::parking::PlaceType;
use serde::{Deserialize, Serialize};

/// Occupancy band shown to drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyStatus {
    Full,
    #[serde(rename = "Nearly Full")]
    NearlyFull,
    Moderate,
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Red,
    Orange,
    Yellow,
    Green,
}

impl OccupancyStatus {
    /// Classifies a clamped occupancy fraction. Lower bounds are inclusive.
    pub fn from_occupancy(occupancy: f64) -> Self {
        if occupancy >= 0.9 {
            OccupancyStatus::Full
        } else if occupancy >= 0.7 {
            OccupancyStatus::NearlyFull
        } else if occupancy >= 0.4 {
            OccupancyStatus::Moderate
        } else {
            OccupancyStatus::Available
        }
    }

    pub fn color(self) -> StatusColor {
        match self {
            OccupancyStatus::Full => StatusColor::Red,
            OccupancyStatus::NearlyFull => StatusColor::Orange,
            OccupancyStatus::Moderate => StatusColor::Yellow,
            OccupancyStatus::Available => StatusColor::Green,
        }
    }
}

/// Multiplicative factors applied to the base capacity, rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub seasonal: f64,
    pub time_impact: f64,
    pub weather_impact: f64,
    pub event_impact: f64,
    pub special_day: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantVenue {
    pub name: String,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    pub distance_km: f64,
    /// Impact above the neutral 1.0 baseline.
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDetails {
    pub time: String,
    pub weather: String,
    pub significant_venues: Vec<SignificantVenue>,
    pub season: String,
    pub lot_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub status: OccupancyStatus,
    pub color: StatusColor,
    /// Percentage, 0.0-100.0, one decimal.
    pub occupancy: f64,
    pub factors: FactorBreakdown,
    pub details: PredictionDetails,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_bands_use_inclusive_lower_bounds() {
        assert_eq!(OccupancyStatus::from_occupancy(0.90), OccupancyStatus::Full);
        assert_eq!(
            OccupancyStatus::from_occupancy(0.8999),
            OccupancyStatus::NearlyFull
        );
        assert_eq!(
            OccupancyStatus::from_occupancy(0.70),
            OccupancyStatus::NearlyFull
        );
        assert_eq!(
            OccupancyStatus::from_occupancy(0.6999),
            OccupancyStatus::Moderate
        );
        assert_eq!(OccupancyStatus::from_occupancy(0.40), OccupancyStatus::Moderate);
        assert_eq!(
            OccupancyStatus::from_occupancy(0.3999),
            OccupancyStatus::Available
        );
        assert_eq!(OccupancyStatus::from_occupancy(0.0), OccupancyStatus::Available);
    }

    #[test]
    fn colors_follow_status() {
        assert_eq!(OccupancyStatus::Full.color(), StatusColor::Red);
        assert_eq!(OccupancyStatus::NearlyFull.color(), StatusColor::Orange);
        assert_eq!(OccupancyStatus::Moderate.color(), StatusColor::Yellow);
        assert_eq!(OccupancyStatus::Available.color(), StatusColor::Green);
    }

    #[test]
    fn rounding_keeps_requested_decimals() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(67.25, 1), 67.3);
        assert_eq!(round_to(0.004, 2), 0.0);
    }

    #[test]
    fn result_serializes_with_flat_wire_names() {
        let result = PredictionResult {
            status: OccupancyStatus::NearlyFull,
            color: StatusColor::Orange,
            occupancy: 74.2,
            factors: FactorBreakdown {
                seasonal: 1.4,
                time_impact: 1.6,
                weather_impact: 1.0,
                event_impact: 1.0,
                special_day: 1.0,
                distance: 1.4,
            },
            details: PredictionDetails {
                time: "morning_rush".to_string(),
                weather: "Unknown".to_string(),
                significant_venues: vec![SignificantVenue {
                    name: "Houston Field House".to_string(),
                    place_type: PlaceType::Stadium,
                    distance_km: 0.12,
                    impact: 0.44,
                }],
                season: "September factor".to_string(),
                lot_type: "public".to_string(),
            },
        };

        let value = serde_json::to_value(result).expect("serialize prediction");
        assert_eq!(
            value,
            json!({
                "status": "Nearly Full",
                "color": "orange",
                "occupancy": 74.2,
                "factors": {
                    "seasonal": 1.4,
                    "time_impact": 1.6,
                    "weather_impact": 1.0,
                    "event_impact": 1.0,
                    "special_day": 1.0,
                    "distance": 1.4
                },
                "details": {
                    "time": "morning_rush",
                    "weather": "Unknown",
                    "significant_venues": [{
                        "name": "Houston Field House",
                        "type": "stadium",
                        "distance_km": 0.12,
                        "impact": 0.44
                    }],
                    "season": "September factor",
                    "lot_type": "public"
                }
            })
        );
    }
}
