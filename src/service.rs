//! Area predictions: gathers signals for every lot around a point and runs the model.

use crate::error::AppError;
use crate::prediction::{OccupancyModel, PredictionError, PredictionResult, local_now};
use crate::sources::Providers;
use crate::state::AppState;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use time::{PrimitiveDateTime, UtcOffset};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One lot's prediction as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotPrediction {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub lot_type: String,
    #[serde(flatten)]
    pub prediction: PredictionResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaSnapshot {
    pub lots: Vec<LotPrediction>,
    /// Local wall-clock time the predictions were made for.
    pub timestamp: PrimitiveDateTime,
    pub generated_at: SystemTime,
    /// True when at least one lot had a weather signal.
    pub weather_available: bool,
}

#[derive(Debug)]
pub struct ParkingService {
    model: OccupancyModel,
    providers: Providers,
    search_radius_m: u32,
    utc_offset: UtcOffset,
}

impl ParkingService {
    pub fn new(
        model: OccupancyModel,
        providers: Providers,
        search_radius_m: u32,
        utc_offset: UtcOffset,
    ) -> Self {
        Self {
            model,
            providers,
            search_radius_m,
            utc_offset,
        }
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    /// Predicts every lot within the search radius of a point at `timestamp`.
    pub async fn predict_area(
        &self,
        latitude: f64,
        longitude: f64,
        timestamp: PrimitiveDateTime,
    ) -> Result<AreaSnapshot, PredictionError> {
        let locations = self
            .providers
            .parking
            .locations(latitude, longitude, self.search_radius_m)
            .await;
        debug!(count = locations.len(), latitude, longitude, "Parking lots found");

        let mut lots = Vec::with_capacity(locations.len());
        let mut weather_available = false;
        for location in locations {
            let weather = self
                .providers
                .weather
                .current(location.latitude, location.longitude)
                .await;
            let venues = self
                .providers
                .venues
                .nearby(location.latitude, location.longitude, self.search_radius_m)
                .await;
            weather_available |= weather.is_some();

            let lot_type = location.lot_type().to_string();
            let prediction =
                self.model
                    .predict(&location, &lot_type, timestamp, weather.as_ref(), &venues)?;
            lots.push(LotPrediction {
                name: location.name,
                latitude: location.latitude,
                longitude: location.longitude,
                lot_type,
                prediction,
            });
        }

        Ok(AreaSnapshot {
            lots,
            timestamp,
            generated_at: SystemTime::now(),
            weather_available,
        })
    }

    /// Same as [`predict_area`](Self::predict_area) at the current local time.
    pub async fn predict_area_now(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AreaSnapshot, PredictionError> {
        self.predict_area(latitude, longitude, local_now(self.utc_offset))
            .await
    }
}

/// Recomputes the snapshot around `center` and stores it in the shared state.
pub async fn refresh_snapshot(
    service: &ParkingService,
    state: &RwLock<AppState>,
    center: (f64, f64),
) -> Result<usize, AppError> {
    let snapshot = service.predict_area_now(center.0, center.1).await?;
    let count = snapshot.lots.len();
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    guard.set_snapshot(snapshot)?;
    Ok(count)
}

/// Spawns the periodic campus refresh on the tokio runtime.
pub fn spawn_refresh_task(
    service: Arc<ParkingService>,
    state: Arc<RwLock<AppState>>,
    center: (f64, f64),
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match refresh_snapshot(&service, &state, center).await {
                Ok(count) => info!(lots = count, "Campus snapshot refreshed"),
                Err(e) => warn!("Error refreshing campus snapshot: {}", e),
            }
        }
    })
}
