pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod parking;
pub mod prediction;
pub mod service;
pub mod sources;
pub mod state;
