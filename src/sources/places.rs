//! Google Places web-service client: parking lot discovery and nearby venues.

use crate::parking::{DEFAULT_LOT_TYPE, NearbyVenue, ParkingLocation, PlaceType};
use crate::sources::SourceError;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";
pub const PLACES_SOURCE: &str = "google_places";
const UNKNOWN_VENUE: &str = "Unknown Venue";
const OPERATIONAL: &str = "OPERATIONAL";

#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Parking lots within `radius_m` of a point.
    pub async fn parking_lots(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Result<Vec<ParkingLocation>, SourceError> {
        let places = self
            .nearby_search(latitude, longitude, radius_m, Some("parking"))
            .await?;

        let mut lots = Vec::with_capacity(places.len());
        for place in places {
            let details = self.details(&place.place_id).await?;
            let hours = details
                .opening_hours
                .map(|hours| hours.weekday_text.join("; "))
                .filter(|text| !text.is_empty());
            lots.push(ParkingLocation {
                id: place.place_id,
                name: place.name,
                latitude: place.geometry.location.lat,
                longitude: place.geometry.location.lng,
                address: details.formatted_address,
                hours_of_operation: hours,
                source: Some(PLACES_SOURCE.to_string()),
                fee: None,
                access_type: Some(DEFAULT_LOT_TYPE.to_string()),
            });
        }
        Ok(lots)
    }

    /// Venues of a recognized category within `radius_m` of a point.
    pub async fn nearby_venues(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Result<Vec<NearbyVenue>, SourceError> {
        let places = self
            .nearby_search(latitude, longitude, radius_m, None)
            .await?;

        let mut venues = Vec::new();
        for place in places {
            let Some(place_type) =
                PlaceType::first_recognized(place.types.iter().map(String::as_str))
            else {
                continue;
            };
            let details = self.details(&place.place_id).await?;
            let name = details
                .name
                .clone()
                .unwrap_or_else(|| UNKNOWN_VENUE.to_string());
            venues.push(NearbyVenue {
                name: name.clone(),
                venue_name: name,
                latitude: place.geometry.location.lat,
                longitude: place.geometry.location.lng,
                place_type,
                is_operational: details.business_status.as_deref() == Some(OPERATIONAL),
                current_popularity: details.current_popularity,
                rating: details.rating,
                user_ratings_total: details.user_ratings_total,
            });
        }
        Ok(venues)
    }

    async fn nearby_search(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
        keyword: Option<&str>,
    ) -> Result<Vec<NearbyPlace>, SourceError> {
        let mut query = vec![
            ("location", format!("{latitude},{longitude}")),
            ("radius", radius_m.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(keyword) = keyword {
            query.push(("keyword", keyword.to_string()));
        }

        let response: NearbySearchResponse = self
            .get_json("/maps/api/place/nearbysearch/json", &query)
            .await?;
        check_api_status(&response.status, response.error_message)?;
        Ok(response.results)
    }

    async fn details(&self, place_id: &str) -> Result<PlaceDetails, SourceError> {
        let query = [
            ("place_id", place_id.to_string()),
            ("key", self.api_key.clone()),
        ];
        let response: DetailsResponse = self
            .get_json("/maps/api/place/details/json", &query)
            .await?;
        check_api_status(&response.status, response.error_message)?;
        response
            .result
            .ok_or_else(|| SourceError::Malformed(format!("no details for place {place_id}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }
}

impl fmt::Debug for PlacesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacesClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn check_api_status(status: &str, message: Option<String>) -> Result<(), SourceError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(SourceError::Api {
            status: other.to_string(),
            message: message.unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyPlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyPlace {
    place_id: String,
    name: String,
    geometry: Geometry,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceDetails>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    business_status: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_ratings_total: Option<u32>,
    #[serde(default)]
    current_popularity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}
