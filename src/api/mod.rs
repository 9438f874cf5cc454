use crate::service::ParkingService;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

#[derive(Debug, Clone)]
pub struct ApiContext {
    pub state: Arc<RwLock<AppState>>,
    pub service: Arc<ParkingService>,
}

pub fn router(state: Arc<RwLock<AppState>>, service: Arc<ParkingService>) -> Router {
    Router::new()
        .route("/update_parking", post(handlers::update_parking))
        .route("/api/parking", get(handlers::get_parking))
        .route("/api/health", get(handlers::get_health))
        .with_state(ApiContext { state, service })
}
