//! External signal sources.
//!
//! Each provider turns collaborator failures into an explicit "unavailable"
//! value (`None`, an empty list, or the mock lots) so the model never sees an
//! error from outside the process.

use crate::parking::{NearbyVenue, ParkingLocation, WeatherSignal};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub mod mock;
pub mod openweather;
pub mod places;

use mock::mock_parking_lots;
use openweather::OpenWeatherClient;
use places::PlacesClient;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("places API returned {status}: {message}")]
    Api { status: String, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug)]
pub enum WeatherProvider {
    Disabled,
    Fixed(WeatherSignal),
    OpenWeather(OpenWeatherClient),
}

impl WeatherProvider {
    /// Current conditions at a point, or `None` when unavailable.
    pub async fn current(&self, latitude: f64, longitude: f64) -> Option<WeatherSignal> {
        match self {
            WeatherProvider::Disabled => None,
            WeatherProvider::Fixed(signal) => Some(signal.clone()),
            WeatherProvider::OpenWeather(client) => {
                match client.current(latitude, longitude).await {
                    Ok(signal) => Some(signal),
                    Err(err) => {
                        warn!(error = %err, latitude, longitude, "Weather lookup failed");
                        None
                    }
                }
            }
        }
    }
}

#[derive(Debug)]
pub enum VenueProvider {
    Disabled,
    Fixed(Vec<NearbyVenue>),
    Places(PlacesClient),
}

impl VenueProvider {
    /// Venues around a point; empty when unavailable.
    pub async fn nearby(&self, latitude: f64, longitude: f64, radius_m: u32) -> Vec<NearbyVenue> {
        match self {
            VenueProvider::Disabled => Vec::new(),
            VenueProvider::Fixed(venues) => venues.clone(),
            VenueProvider::Places(client) => {
                match client.nearby_venues(latitude, longitude, radius_m).await {
                    Ok(venues) => venues,
                    Err(err) => {
                        warn!(error = %err, latitude, longitude, "Nearby venue lookup failed");
                        Vec::new()
                    }
                }
            }
        }
    }
}

#[derive(Debug)]
pub enum ParkingProvider {
    Mock,
    Fixed(Vec<ParkingLocation>),
    Places(PlacesClient),
}

impl ParkingProvider {
    /// Lots around a point. Live search failures fall back to the mock lots.
    pub async fn locations(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Vec<ParkingLocation> {
        match self {
            ParkingProvider::Mock => mock_parking_lots(),
            ParkingProvider::Fixed(lots) => lots.clone(),
            ParkingProvider::Places(client) => {
                match client.parking_lots(latitude, longitude, radius_m).await {
                    Ok(lots) => lots,
                    Err(err) => {
                        warn!(error = %err, "Parking lot search failed, falling back to mock data");
                        mock_parking_lots()
                    }
                }
            }
        }
    }
}

/// Resolved source settings; API keys already read from the environment.
#[derive(Debug, Clone, Default)]
pub struct SourceSettings {
    pub use_mock: bool,
    pub google_api_key: Option<String>,
    pub weather_api_key: Option<String>,
    pub places_base_url: String,
    pub weather_base_url: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct Providers {
    pub parking: ParkingProvider,
    pub weather: WeatherProvider,
    pub venues: VenueProvider,
}

impl Providers {
    pub fn from_settings(settings: &SourceSettings) -> Result<Self, SourceError> {
        let places = match &settings.google_api_key {
            Some(key) => Some(PlacesClient::new(
                &settings.places_base_url,
                key.clone(),
                settings.timeout,
            )?),
            None => {
                warn!("No Google API key configured, venue impact disabled");
                None
            }
        };

        let parking = match (&places, settings.use_mock) {
            (Some(client), false) => ParkingProvider::Places(client.clone()),
            (_, true) => {
                info!("Using mock parking lots");
                ParkingProvider::Mock
            }
            (None, false) => {
                warn!("Live lot search needs a Google API key, using mock parking lots");
                ParkingProvider::Mock
            }
        };

        let venues = match places {
            Some(client) => VenueProvider::Places(client),
            None => VenueProvider::Disabled,
        };

        let weather = match &settings.weather_api_key {
            Some(key) => WeatherProvider::OpenWeather(OpenWeatherClient::new(
                &settings.weather_base_url,
                key.clone(),
                settings.timeout,
            )?),
            None => {
                warn!("No weather API key configured, weather impact disabled");
                WeatherProvider::Disabled
            }
        };

        Ok(Self {
            parking,
            weather,
            venues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parking::PlaceType;

    fn settings() -> SourceSettings {
        SourceSettings {
            use_mock: false,
            google_api_key: None,
            weather_api_key: None,
            places_base_url: "http://127.0.0.1:9".to_string(),
            weather_base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn missing_keys_disable_live_sources() -> Result<(), SourceError> {
        let providers = Providers::from_settings(&settings())?;
        assert!(matches!(providers.parking, ParkingProvider::Mock));
        assert!(matches!(providers.weather, WeatherProvider::Disabled));
        assert!(matches!(providers.venues, VenueProvider::Disabled));
        Ok(())
    }

    #[test]
    fn keys_enable_live_sources_unless_mocked() -> Result<(), SourceError> {
        let mut settings = settings();
        settings.google_api_key = Some("g".to_string());
        settings.weather_api_key = Some("w".to_string());

        let live = Providers::from_settings(&settings)?;
        assert!(matches!(live.parking, ParkingProvider::Places(_)));
        assert!(matches!(live.venues, VenueProvider::Places(_)));
        assert!(matches!(live.weather, WeatherProvider::OpenWeather(_)));

        settings.use_mock = true;
        let mocked = Providers::from_settings(&settings)?;
        assert!(matches!(mocked.parking, ParkingProvider::Mock));
        assert!(matches!(mocked.venues, VenueProvider::Places(_)));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_sources_yield_unavailable_values() -> Result<(), SourceError> {
        let mut settings = settings();
        settings.google_api_key = Some("g".to_string());
        settings.weather_api_key = Some("w".to_string());
        let providers = Providers::from_settings(&settings)?;

        assert_eq!(providers.weather.current(42.73, -73.68).await, None);
        assert!(providers.venues.nearby(42.73, -73.68, 1000).await.is_empty());
        assert_eq!(
            providers.parking.locations(42.73, -73.68, 1000).await,
            mock_parking_lots()
        );
        Ok(())
    }

    #[tokio::test]
    async fn fixed_providers_return_their_values() {
        let signal = WeatherSignal {
            condition: "Clear".to_string(),
            temperature_f: 70.0,
        };
        let venue = NearbyVenue {
            name: "Chapel".to_string(),
            venue_name: "Chapel".to_string(),
            latitude: 42.73,
            longitude: -73.68,
            place_type: PlaceType::Church,
            is_operational: true,
            current_popularity: None,
            rating: None,
            user_ratings_total: None,
        };

        let weather = WeatherProvider::Fixed(signal.clone());
        let venues = VenueProvider::Fixed(vec![venue.clone()]);

        assert_eq!(weather.current(0.0, 0.0).await, Some(signal));
        assert_eq!(venues.nearby(0.0, 0.0, 1000).await, vec![venue]);
    }
}
