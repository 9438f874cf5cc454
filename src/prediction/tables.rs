//! Lookup tables driving the occupancy model.
//!
//! The built-in values are hand-tuned for a university campus. A JSON file with
//! the same shape can replace them at startup (see [`super::load_tables_from_path`]).

use crate::parking::DEFAULT_LOT_TYPE;
use crate::prediction::{PredictionError, TablesError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named hour range with its occupancy multiplier.
///
/// Ranges are half-open `[start_hour, end_hour)`. A period whose start is after
/// its end wraps past midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub name: String,
    pub start_hour: u8,
    pub end_hour: u8,
    pub factor: f64,
}

impl TimePeriod {
    fn new(name: &str, start_hour: u8, end_hour: u8, factor: f64) -> Self {
        Self {
            name: name.to_string(),
            start_hour,
            end_hour,
            factor,
        }
    }

    pub fn contains(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Period tables per day type. Declaration order decides overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFactors {
    pub weekday: Vec<TimePeriod>,
    pub weekend: Vec<TimePeriod>,
}

impl TimeFactors {
    pub fn periods(&self, is_weekend: bool) -> &[TimePeriod] {
        if is_weekend {
            &self.weekend
        } else {
            &self.weekday
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LotCharacteristics {
    /// Baseline fill fraction, 0-1.
    pub base_capacity: f64,
    pub weather_sensitivity: f64,
    pub event_sensitivity: f64,
    pub time_sensitivity: f64,
    pub weekend_modifier: f64,
}

impl LotCharacteristics {
    fn factors(&self) -> [(&'static str, f64); 5] {
        [
            ("base_capacity", self.base_capacity),
            ("weather_sensitivity", self.weather_sensitivity),
            ("event_sensitivity", self.event_sensitivity),
            ("time_sensitivity", self.time_sensitivity),
            ("weekend_modifier", self.weekend_modifier),
        ]
    }
}

/// Temperature band in °F. `None` bounds stand for -∞ / +∞.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBand {
    pub min_f: Option<f64>,
    pub max_f: Option<f64>,
    pub factor: f64,
}

impl TemperatureBand {
    pub fn contains(&self, temperature_f: f64) -> bool {
        self.min_f.is_none_or(|min| temperature_f >= min)
            && self.max_f.is_none_or(|max| temperature_f < max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceZone {
    Central,
    Peripheral,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceFactors {
    pub central: f64,
    pub peripheral: f64,
    pub remote: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotSize {
    /// Fewer than 50 spaces.
    Small,
    Medium,
    /// More than 200 spaces.
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeFactors {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTables {
    pub time_factors: TimeFactors,
    pub lot_characteristics: BTreeMap<String, LotCharacteristics>,
    /// Indexed by month - 1.
    pub seasonal_factors: [f64; 12],
    pub weather_factors: BTreeMap<String, f64>,
    pub temperature_bands: Vec<TemperatureBand>,
    pub special_day_factors: BTreeMap<String, f64>,
    pub distance_factors: DistanceFactors,
    /// Not applied by the model yet; kept so lot sizes can be wired in later.
    pub size_factors: SizeFactors,
    pub venue_weights: BTreeMap<String, f64>,
}

impl ModelTables {
    /// Characteristics for `lot_type`, falling back to `public` for unknown types.
    pub fn lot_characteristics(
        &self,
        lot_type: &str,
    ) -> Result<&LotCharacteristics, PredictionError> {
        self.lot_characteristics
            .get(lot_type)
            .or_else(|| self.lot_characteristics.get(DEFAULT_LOT_TYPE))
            .ok_or_else(|| PredictionError::MissingLotCharacteristics(DEFAULT_LOT_TYPE.to_string()))
    }

    pub fn seasonal_factor(&self, month: u8) -> Result<f64, PredictionError> {
        match month {
            1..=12 => Ok(self.seasonal_factors[usize::from(month - 1)]),
            _ => Err(PredictionError::InvalidMonth(month)),
        }
    }

    /// Multiplier for a weather condition; unrecognized conditions are neutral.
    pub fn weather_factor(&self, condition: &str) -> f64 {
        self.weather_factors.get(condition).copied().unwrap_or(1.0)
    }

    /// Multiplier of the first band containing `temperature_f`, neutral if none does.
    pub fn temperature_factor(&self, temperature_f: f64) -> f64 {
        self.temperature_bands
            .iter()
            .find(|band| band.contains(temperature_f))
            .map(|band| band.factor)
            .unwrap_or(1.0)
    }

    pub fn special_day_factor(&self, occasion: &str) -> f64 {
        self.special_day_factors
            .get(occasion)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn distance_factor(&self, zone: DistanceZone) -> f64 {
        match zone {
            DistanceZone::Central => self.distance_factors.central,
            DistanceZone::Peripheral => self.distance_factors.peripheral,
            DistanceZone::Remote => self.distance_factors.remote,
        }
    }

    pub fn size_factor(&self, size: LotSize) -> f64 {
        match size {
            LotSize::Small => self.size_factors.small,
            LotSize::Medium => self.size_factors.medium,
            LotSize::Large => self.size_factors.large,
        }
    }

    /// Checks the structural guarantees the model relies on.
    pub fn validate(&self) -> Result<(), TablesError> {
        if !self.lot_characteristics.contains_key(DEFAULT_LOT_TYPE) {
            return Err(TablesError::Invalid(format!(
                "lot_characteristics must define `{DEFAULT_LOT_TYPE}`"
            )));
        }

        for (day_type, periods) in [
            ("weekday", &self.time_factors.weekday),
            ("weekend", &self.time_factors.weekend),
        ] {
            for period in periods {
                if period.start_hour > 24 || period.end_hour > 24 {
                    return Err(TablesError::Invalid(format!(
                        "{day_type} period `{}` has hours outside 0..=24",
                        period.name
                    )));
                }
                check_factor(&format!("{day_type}.{}", period.name), period.factor)?;
            }
        }

        for (lot_type, lot) in &self.lot_characteristics {
            for (field, value) in lot.factors() {
                check_factor(&format!("{lot_type}.{field}"), value)?;
            }
        }

        for (index, factor) in self.seasonal_factors.iter().enumerate() {
            check_factor(&format!("month {}", index + 1), *factor)?;
        }

        validate_bands(&self.temperature_bands)?;

        let named = self
            .weather_factors
            .iter()
            .chain(&self.special_day_factors)
            .chain(&self.venue_weights);
        for (name, factor) in named {
            check_factor(name, *factor)?;
        }

        let fixed = [
            ("distance.central", self.distance_factors.central),
            ("distance.peripheral", self.distance_factors.peripheral),
            ("distance.remote", self.distance_factors.remote),
            ("size.small", self.size_factors.small),
            ("size.medium", self.size_factors.medium),
            ("size.large", self.size_factors.large),
        ];
        for (name, factor) in fixed {
            check_factor(name, factor)?;
        }

        Ok(())
    }
}

fn check_factor(name: &str, value: f64) -> Result<(), TablesError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TablesError::Invalid(format!(
            "factor `{name}` must be finite and non-negative, got {value}"
        )))
    }
}

fn validate_bands(bands: &[TemperatureBand]) -> Result<(), TablesError> {
    let (Some(first), Some(last)) = (bands.first(), bands.last()) else {
        return Err(TablesError::Invalid(
            "temperature_bands must not be empty".to_string(),
        ));
    };
    if first.min_f.is_some() || last.max_f.is_some() {
        return Err(TablesError::Invalid(
            "temperature_bands must be unbounded at both ends".to_string(),
        ));
    }
    for pair in bands.windows(2) {
        match (pair[0].max_f, pair[1].min_f) {
            (Some(max), Some(min)) if max == min => {}
            _ => {
                return Err(TablesError::Invalid(format!(
                    "temperature_bands leave a gap or overlap near {:?}",
                    pair[0].max_f
                )));
            }
        }
    }
    for band in bands {
        check_factor("temperature band", band.factor)?;
    }
    Ok(())
}

fn named(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, factor)| ((*name).to_string(), *factor))
        .collect()
}

fn lot(
    base_capacity: f64,
    weather_sensitivity: f64,
    event_sensitivity: f64,
    time_sensitivity: f64,
    weekend_modifier: f64,
) -> LotCharacteristics {
    LotCharacteristics {
        base_capacity,
        weather_sensitivity,
        event_sensitivity,
        time_sensitivity,
        weekend_modifier,
    }
}

fn band(min_f: Option<f64>, max_f: Option<f64>, factor: f64) -> TemperatureBand {
    TemperatureBand {
        min_f,
        max_f,
        factor,
    }
}

impl Default for ModelTables {
    fn default() -> Self {
        let time_factors = TimeFactors {
            weekday: vec![
                TimePeriod::new("early_morning", 5, 7, 0.2),
                TimePeriod::new("morning_rush", 7, 9, 1.6),
                TimePeriod::new("mid_morning", 9, 11, 1.3),
                TimePeriod::new("lunch_rush", 11, 14, 1.2),
                TimePeriod::new("afternoon", 14, 16, 1.1),
                TimePeriod::new("afternoon_exit", 16, 18, 0.9),
                TimePeriod::new("evening", 18, 22, 0.6),
                TimePeriod::new("late_night", 22, 5, 0.2),
            ],
            weekend: vec![
                TimePeriod::new("early_hours", 5, 9, 0.2),
                TimePeriod::new("morning", 9, 12, 0.5),
                TimePeriod::new("afternoon", 12, 17, 0.7),
                TimePeriod::new("evening", 17, 22, 0.5),
                TimePeriod::new("late_night", 22, 5, 0.2),
            ],
        };

        let lot_characteristics = [
            ("public", lot(0.7, 1.0, 1.3, 1.0, 0.6)),
            ("private", lot(0.8, 0.7, 0.8, 1.2, 0.3)),
            ("visitor", lot(0.5, 1.2, 1.5, 0.9, 1.2)),
            ("faculty", lot(0.85, 0.6, 0.7, 1.4, 0.2)),
            ("resident", lot(0.9, 0.5, 0.6, 0.4, 0.9)),
        ]
        .into_iter()
        .map(|(name, lot)| (name.to_string(), lot))
        .collect();

        Self {
            time_factors,
            lot_characteristics,
            // Academic calendar: summer lull, September start-of-year peak.
            seasonal_factors: [1.1, 1.1, 1.0, 1.0, 0.9, 0.7, 0.7, 0.8, 1.4, 1.2, 1.1, 0.9],
            weather_factors: named(&[
                ("Clear", 1.0),
                ("Clouds", 1.0),
                ("Rain", 1.4),
                ("Snow", 1.6),
                ("Thunderstorm", 1.5),
                ("Mist", 1.1),
                ("Fog", 1.2),
                ("Drizzle", 1.2),
                ("Smoke", 1.3),
                ("Haze", 1.1),
            ]),
            temperature_bands: vec![
                band(None, Some(15.0), 1.5),
                band(Some(15.0), Some(32.0), 1.4),
                band(Some(32.0), Some(45.0), 1.2),
                band(Some(45.0), Some(65.0), 1.0),
                band(Some(65.0), Some(75.0), 0.9),
                band(Some(75.0), Some(85.0), 1.0),
                band(Some(85.0), None, 1.2),
            ],
            special_day_factors: named(&[
                ("holiday", 0.4),
                ("weekend", 0.6),
                ("academic_break", 0.5),
                ("exam_period", 1.3),
                ("move_in", 1.6),
                ("move_out", 1.6),
                ("career_fair", 1.5),
                ("orientation", 1.4),
                ("game_day", 1.7),
                ("graduation", 1.8),
            ]),
            distance_factors: DistanceFactors {
                central: 1.4,
                peripheral: 0.8,
                remote: 0.6,
            },
            size_factors: SizeFactors {
                small: 1.2,
                medium: 1.0,
                large: 0.8,
            },
            venue_weights: named(&[
                ("stadium", 2.0),
                ("convention_center", 1.8),
                ("university", 1.5),
                ("night_club", 1.4),
                ("movie_theater", 1.3),
                ("shopping_mall", 1.3),
                ("museum", 1.2),
                ("church", 1.2),
                ("restaurant", 1.1),
                ("other", 1.0),
            ]),
        }
    }
}
