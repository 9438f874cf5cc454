//! The occupancy model.
//!
//! Starts from a lot type's base capacity and applies seasonal, weekend, time,
//! weather, event, special-day and distance factors multiplicatively. Time,
//! weather and event factors are first blended toward neutral by the lot's
//! sensitivity: `1 + (raw - 1) * sensitivity`.

use crate::parking::{NearbyVenue, ParkingLocation, WeatherSignal};
use crate::prediction::events::EventImpactScorer;
use crate::prediction::noise::{DEFAULT_NOISE_STD_DEV, GaussianNoise, NoiseSource};
use crate::prediction::result::{
    FactorBreakdown, OccupancyStatus, PredictionDetails, PredictionResult, round_to,
};
use crate::prediction::tables::{DistanceZone, ModelTables};
use crate::prediction::{PredictionError, TablesError};
use std::fmt;
use time::{PrimitiveDateTime, Weekday};

pub const NORMAL_HOURS: &str = "Normal hours";
pub const UNKNOWN_WEATHER: &str = "Unknown";

/// Names the occasion a day belongs to (e.g. `game_day`), if any.
pub trait SpecialDayCalendar: Send + Sync + fmt::Debug {
    fn occasion(&self, timestamp: PrimitiveDateTime) -> Option<String>;
}

/// No occasions are known; the special-day factor stays neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpecialDays;

impl SpecialDayCalendar for NoSpecialDays {
    fn occasion(&self, _timestamp: PrimitiveDateTime) -> Option<String> {
        None
    }
}

/// Places a lot relative to the main campus attractions.
pub trait DistanceZoneClassifier: Send + Sync + fmt::Debug {
    fn classify(&self, location: &ParkingLocation) -> DistanceZone;
}

/// Treats every lot as central.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCentral;

impl DistanceZoneClassifier for AlwaysCentral {
    fn classify(&self, _location: &ParkingLocation) -> DistanceZone {
        DistanceZone::Central
    }
}

/// Raw (unblended) factor with a human-readable label.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorReading {
    pub factor: f64,
    pub description: String,
}

/// Pulls `raw` toward 1.0 (sensitivity < 1) or away from it (sensitivity > 1).
/// Unbounded; only the final occupancy is clamped.
pub fn blend(raw: f64, sensitivity: f64) -> f64 {
    1.0 + (raw - 1.0) * sensitivity
}

pub fn is_weekend(timestamp: PrimitiveDateTime) -> bool {
    matches!(timestamp.weekday(), Weekday::Saturday | Weekday::Sunday)
}

#[derive(Debug)]
pub struct OccupancyModel {
    tables: ModelTables,
    scorer: EventImpactScorer,
    noise: Box<dyn NoiseSource>,
    noise_std_dev: f64,
    special_days: Box<dyn SpecialDayCalendar>,
    distance_zones: Box<dyn DistanceZoneClassifier>,
}

impl OccupancyModel {
    /// Builds a model over validated tables with entropy-seeded jitter.
    pub fn new(tables: ModelTables) -> Result<Self, TablesError> {
        tables.validate()?;
        Ok(Self::from_valid_tables(tables))
    }

    pub fn with_defaults() -> Self {
        Self::from_valid_tables(ModelTables::default())
    }

    fn from_valid_tables(tables: ModelTables) -> Self {
        let scorer = EventImpactScorer::new(tables.venue_weights.clone());
        Self {
            tables,
            scorer,
            noise: Box::new(GaussianNoise::from_entropy()),
            noise_std_dev: DEFAULT_NOISE_STD_DEV,
            special_days: Box::new(NoSpecialDays),
            distance_zones: Box::new(AlwaysCentral),
        }
    }

    pub fn with_noise(mut self, noise: impl NoiseSource + 'static) -> Self {
        self.noise = Box::new(noise);
        self
    }

    /// Standard deviation of the jitter; zero disables it.
    pub fn with_noise_std_dev(mut self, std_dev: f64) -> Self {
        self.noise_std_dev = if std_dev.is_finite() {
            std_dev.max(0.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_special_days(mut self, calendar: impl SpecialDayCalendar + 'static) -> Self {
        self.special_days = Box::new(calendar);
        self
    }

    pub fn with_distance_zones(
        mut self,
        classifier: impl DistanceZoneClassifier + 'static,
    ) -> Self {
        self.distance_zones = Box::new(classifier);
        self
    }

    pub fn tables(&self) -> &ModelTables {
        &self.tables
    }

    pub fn noise_std_dev(&self) -> f64 {
        self.noise_std_dev
    }

    /// First declared period containing the hour wins; no match is neutral.
    pub fn time_factor(&self, timestamp: PrimitiveDateTime) -> FactorReading {
        let hour = timestamp.hour();
        self.tables
            .time_factors
            .periods(is_weekend(timestamp))
            .iter()
            .find(|period| period.contains(hour))
            .map(|period| FactorReading {
                factor: period.factor,
                description: period.name.clone(),
            })
            .unwrap_or_else(|| FactorReading {
                factor: 1.0,
                description: NORMAL_HOURS.to_string(),
            })
    }

    pub fn weather_factor(&self, signal: Option<&WeatherSignal>) -> FactorReading {
        match signal {
            Some(signal) => FactorReading {
                factor: self.tables.weather_factor(&signal.condition)
                    * self.tables.temperature_factor(signal.temperature_f),
                description: format!("{}, {:.1}°F", signal.condition, signal.temperature_f),
            },
            None => FactorReading {
                factor: 1.0,
                description: UNKNOWN_WEATHER.to_string(),
            },
        }
    }

    /// Estimates occupancy of `location` at local wall-clock `timestamp`.
    ///
    /// Unknown lot types use the `public` characteristics. A missing weather
    /// signal or empty venue list contributes a neutral factor.
    pub fn predict(
        &self,
        location: &ParkingLocation,
        lot_type: &str,
        timestamp: PrimitiveDateTime,
        weather: Option<&WeatherSignal>,
        venues: &[NearbyVenue],
    ) -> Result<PredictionResult, PredictionError> {
        let lot = self.tables.lot_characteristics(lot_type)?;
        let month = timestamp.month();
        let seasonal = self.tables.seasonal_factor(u8::from(month))?;

        let mut occupancy = lot.base_capacity * seasonal;
        if is_weekend(timestamp) {
            occupancy *= lot.weekend_modifier;
        }

        let time = self.time_factor(timestamp);
        let time_impact = blend(time.factor, lot.time_sensitivity);

        let weather = self.weather_factor(weather);
        let weather_impact = blend(weather.factor, lot.weather_sensitivity);

        let events = self.scorer.score(location, venues);
        let event_impact = blend(events.factor, lot.event_sensitivity);

        let special_day = self
            .special_days
            .occasion(timestamp)
            .map_or(1.0, |occasion| self.tables.special_day_factor(&occasion));
        let distance = self
            .tables
            .distance_factor(self.distance_zones.classify(location));

        occupancy *= time_impact * weather_impact * event_impact * special_day * distance;
        if self.noise_std_dev > 0.0 {
            occupancy += self.noise.sample(self.noise_std_dev);
        }
        let occupancy = occupancy.clamp(0.0, 1.0);

        let status = OccupancyStatus::from_occupancy(occupancy);
        Ok(PredictionResult {
            status,
            color: status.color(),
            occupancy: round_to(occupancy * 100.0, 1),
            factors: FactorBreakdown {
                seasonal: round_to(seasonal, 2),
                time_impact: round_to(time_impact, 2),
                weather_impact: round_to(weather_impact, 2),
                event_impact: round_to(event_impact, 2),
                special_day: round_to(special_day, 2),
                distance: round_to(distance, 2),
            },
            details: PredictionDetails {
                time: time.description,
                weather: weather.description,
                significant_venues: events.significant_venues,
                season: format!("{month} factor"),
                lot_type: lot_type.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::PlaceType;
    use crate::prediction::noise::{NoNoise, SequenceNoise};
    use crate::prediction::result::StatusColor;
    use time::macros::datetime;

    fn deterministic() -> OccupancyModel {
        OccupancyModel::with_defaults()
            .with_noise(NoNoise)
            .with_noise_std_dev(0.0)
    }

    fn lot() -> ParkingLocation {
        ParkingLocation {
            id: "mock_1".to_string(),
            name: "Test Parking Lot 1".to_string(),
            latitude: 42.731419,
            longitude: -73.675290,
            address: None,
            hours_of_operation: None,
            source: Some("mock_data".to_string()),
            fee: Some(true),
            access_type: Some("public".to_string()),
        }
    }

    // 2024-10-16 is a Wednesday, 2024-10-19 a Saturday.
    const WEDNESDAY_RUSH: PrimitiveDateTime = datetime!(2024-10-16 8:30);
    const SATURDAY_MORNING: PrimitiveDateTime = datetime!(2024-10-19 10:00);

    #[test]
    fn weekday_morning_rush_time_factor() {
        let reading = deterministic().time_factor(WEDNESDAY_RUSH);
        assert_eq!(reading.description, "morning_rush");
        assert_eq!(reading.factor, 1.6);
    }

    #[test]
    fn late_night_matches_across_midnight() {
        let model = deterministic();
        let before = model.time_factor(datetime!(2024-10-16 23:00));
        let after = model.time_factor(datetime!(2024-10-17 3:00));
        assert_eq!(before.description, "late_night");
        assert_eq!(after.description, "late_night");
        assert_eq!(before.factor, 0.2);
    }

    #[test]
    fn weekend_uses_weekend_periods() {
        let reading = deterministic().time_factor(SATURDAY_MORNING);
        assert_eq!(reading.description, "morning");
        assert_eq!(reading.factor, 0.5);
    }

    #[test]
    fn uncovered_hour_is_normal_hours() {
        let mut tables = ModelTables::default();
        tables.time_factors.weekday.retain(|period| period.name != "lunch_rush");
        let model = OccupancyModel::new(tables)
            .expect("valid tables")
            .with_noise_std_dev(0.0);

        let reading = model.time_factor(datetime!(2024-10-16 12:00));
        assert_eq!(reading.description, NORMAL_HOURS);
        assert_eq!(reading.factor, 1.0);
    }

    #[test]
    fn snow_and_deep_cold_compound() {
        let signal = WeatherSignal {
            condition: "Snow".to_string(),
            temperature_f: 10.0,
        };
        let reading = deterministic().weather_factor(Some(&signal));
        assert!((reading.factor - 2.4).abs() < 1e-12);
        assert_eq!(reading.description, "Snow, 10.0°F");
    }

    #[test]
    fn missing_weather_is_neutral() {
        let reading = deterministic().weather_factor(None);
        assert_eq!(reading.factor, 1.0);
        assert_eq!(reading.description, UNKNOWN_WEATHER);
    }

    #[test]
    fn blend_scales_deviation_from_neutral() {
        assert_eq!(blend(1.6, 1.0), 1.6);
        assert!((blend(1.6, 0.5) - 1.3).abs() < 1e-12);
        assert_eq!(blend(1.0, 3.0), 1.0);
        assert!((blend(0.2, 1.4) + 0.12).abs() < 1e-12);
    }

    #[test]
    fn busy_weekday_public_lot_saturates() -> Result<(), PredictionError> {
        let result = deterministic().predict(&lot(), "public", WEDNESDAY_RUSH, None, &[])?;

        // 0.7 * 1.2 * 1.6 * 1.4 > 1
        assert_eq!(result.occupancy, 100.0);
        assert_eq!(result.status, OccupancyStatus::Full);
        assert_eq!(result.color, StatusColor::Red);
        assert_eq!(result.factors.seasonal, 1.2);
        assert_eq!(result.factors.time_impact, 1.6);
        assert_eq!(result.factors.weather_impact, 1.0);
        assert_eq!(result.factors.event_impact, 1.0);
        assert_eq!(result.factors.special_day, 1.0);
        assert_eq!(result.factors.distance, 1.4);
        assert_eq!(result.details.time, "morning_rush");
        assert_eq!(result.details.weather, "Unknown");
        assert_eq!(result.details.season, "October factor");
        assert_eq!(result.details.lot_type, "public");
        Ok(())
    }

    #[test]
    fn faculty_lot_is_quiet_on_weekends() -> Result<(), PredictionError> {
        let result = deterministic().predict(&lot(), "faculty", SATURDAY_MORNING, None, &[])?;

        // 0.85 * 1.2 * 0.2 * (1 - 0.5 * 1.4) * 1.4 = 0.08568
        assert_eq!(result.occupancy, 8.6);
        assert_eq!(result.status, OccupancyStatus::Available);
        assert_eq!(result.color, StatusColor::Green);
        assert_eq!(result.factors.time_impact, 0.3);
        Ok(())
    }

    #[test]
    fn negative_blend_clamps_to_empty_lot() -> Result<(), PredictionError> {
        let result = deterministic().predict(
            &lot(),
            "faculty",
            datetime!(2024-10-16 23:30),
            None,
            &[],
        )?;
        assert_eq!(result.factors.time_impact, -0.12);
        assert_eq!(result.occupancy, 0.0);
        assert_eq!(result.status, OccupancyStatus::Available);
        Ok(())
    }

    #[test]
    fn jitter_on_negative_product_stays_empty() -> Result<(), PredictionError> {
        let model = OccupancyModel::with_defaults().with_noise(SequenceNoise::new(vec![0.02]));
        let result = model.predict(
            &lot(),
            "faculty",
            datetime!(2024-10-16 23:30),
            None,
            &[],
        )?;

        // 0.85 * 1.2 * -0.12 * 1.4 + 0.02 < 0
        assert_eq!(result.factors.time_impact, -0.12);
        assert_eq!(result.occupancy, 0.0);
        Ok(())
    }

    #[test]
    fn unknown_lot_type_uses_public_characteristics() -> Result<(), PredictionError> {
        let model = deterministic();
        let public = model.predict(&lot(), "public", SATURDAY_MORNING, None, &[])?;
        let unknown = model.predict(&lot(), "valet", SATURDAY_MORNING, None, &[])?;

        assert_eq!(unknown.occupancy, public.occupancy);
        assert_eq!(unknown.factors, public.factors);
        assert_eq!(unknown.details.lot_type, "valet");
        Ok(())
    }

    #[test]
    fn weather_and_events_are_blended_by_lot_sensitivity() -> Result<(), PredictionError> {
        let model = deterministic();
        let signal = WeatherSignal {
            condition: "Rain".to_string(),
            temperature_f: 50.0,
        };
        let stadium = NearbyVenue {
            name: "Field House".to_string(),
            venue_name: "Field House".to_string(),
            latitude: 42.731419,
            longitude: -73.675290,
            place_type: PlaceType::Stadium,
            is_operational: true,
            current_popularity: None,
            rating: None,
            user_ratings_total: None,
        };

        let result = model.predict(
            &lot(),
            "visitor",
            SATURDAY_MORNING,
            Some(&signal),
            std::slice::from_ref(&stadium),
        )?;

        // Rain 1.4 at 50°F -> 1 + 0.4 * 1.2; stadium on site 1.5 -> 1 + 0.5 * 1.5
        assert_eq!(result.factors.weather_impact, 1.48);
        assert_eq!(result.factors.event_impact, 1.75);
        assert_eq!(result.details.weather, "Rain, 50.0°F");
        assert_eq!(result.details.significant_venues.len(), 1);
        assert_eq!(result.details.significant_venues[0].impact, 0.5);
        Ok(())
    }

    #[test]
    fn hooks_feed_special_day_and_distance_factors() -> Result<(), PredictionError> {
        #[derive(Debug)]
        struct GameDay;
        impl SpecialDayCalendar for GameDay {
            fn occasion(&self, _timestamp: PrimitiveDateTime) -> Option<String> {
                Some("game_day".to_string())
            }
        }

        #[derive(Debug)]
        struct Remote;
        impl DistanceZoneClassifier for Remote {
            fn classify(&self, _location: &ParkingLocation) -> DistanceZone {
                DistanceZone::Remote
            }
        }

        let model = deterministic()
            .with_special_days(GameDay)
            .with_distance_zones(Remote);
        let result = model.predict(&lot(), "faculty", SATURDAY_MORNING, None, &[])?;

        assert_eq!(result.factors.special_day, 1.7);
        assert_eq!(result.factors.distance, 0.6);
        Ok(())
    }

    #[test]
    fn injected_noise_shifts_occupancy() -> Result<(), PredictionError> {
        let model = OccupancyModel::with_defaults().with_noise(SequenceNoise::new(vec![0.05]));
        let result = model.predict(&lot(), "faculty", SATURDAY_MORNING, None, &[])?;

        assert_eq!(result.occupancy, 13.6);
        Ok(())
    }

    #[test]
    fn zero_deviation_skips_the_noise_source() -> Result<(), PredictionError> {
        let model = OccupancyModel::with_defaults()
            .with_noise(SequenceNoise::new(vec![0.5]))
            .with_noise_std_dev(0.0);
        let result = model.predict(&lot(), "faculty", SATURDAY_MORNING, None, &[])?;

        assert_eq!(result.occupancy, 8.6);
        Ok(())
    }

    #[test]
    fn invalid_noise_deviation_disables_jitter() {
        assert_eq!(
            OccupancyModel::with_defaults()
                .with_noise_std_dev(f64::NAN)
                .noise_std_dev(),
            0.0
        );
        assert_eq!(
            OccupancyModel::with_defaults()
                .with_noise_std_dev(-1.0)
                .noise_std_dev(),
            0.0
        );
    }

    #[test]
    fn invalid_tables_are_rejected_at_construction() {
        let mut tables = ModelTables::default();
        tables.seasonal_factors[5] = -1.0;
        assert!(matches!(
            OccupancyModel::new(tables),
            Err(TablesError::Invalid(_))
        ));
    }
}
