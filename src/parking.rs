use serde::{Deserialize, Serialize};
use std::fmt;

/// Lot type used when a location carries no access type.
pub const DEFAULT_LOT_TYPE: &str = "public";

/// A parking lot as reported by the lot-discovery source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLocation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub hours_of_operation: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub fee: Option<bool>,
    #[serde(default)]
    pub access_type: Option<String>,
}

impl ParkingLocation {
    /// Access type of the lot, defaulting to `public`.
    pub fn lot_type(&self) -> &str {
        self.access_type.as_deref().unwrap_or(DEFAULT_LOT_TYPE)
    }
}

/// Venue categories the event scorer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    Stadium,
    MovieTheater,
    ShoppingMall,
    Restaurant,
    NightClub,
    Museum,
    University,
    Church,
    ConventionCenter,
    Other,
}

impl PlaceType {
    pub const RECOGNIZED: [PlaceType; 9] = [
        PlaceType::Stadium,
        PlaceType::MovieTheater,
        PlaceType::ShoppingMall,
        PlaceType::Restaurant,
        PlaceType::NightClub,
        PlaceType::Museum,
        PlaceType::University,
        PlaceType::Church,
        PlaceType::ConventionCenter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlaceType::Stadium => "stadium",
            PlaceType::MovieTheater => "movie_theater",
            PlaceType::ShoppingMall => "shopping_mall",
            PlaceType::Restaurant => "restaurant",
            PlaceType::NightClub => "night_club",
            PlaceType::Museum => "museum",
            PlaceType::University => "university",
            PlaceType::Church => "church",
            PlaceType::ConventionCenter => "convention_center",
            PlaceType::Other => "other",
        }
    }

    /// Maps a raw place-type tag onto the recognized set; anything else is `Other`.
    pub fn from_tag(tag: &str) -> Self {
        Self::RECOGNIZED
            .into_iter()
            .find(|place_type| place_type.as_str() == tag)
            .unwrap_or(PlaceType::Other)
    }

    /// First recognized category among a place's tags, if any.
    pub fn first_recognized<'a>(tags: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        tags.into_iter()
            .map(Self::from_tag)
            .find(|place_type| *place_type != PlaceType::Other)
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A venue near a lot whose activity may push occupancy up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyVenue {
    pub name: String,
    pub venue_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place_type: PlaceType,
    pub is_operational: bool,
    /// Live busyness, 0-100.
    #[serde(default)]
    pub current_popularity: Option<u8>,
    /// Average rating, 0.0-5.0.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
}

/// Current conditions at a lot, as supplied by the weather source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSignal {
    pub condition: String,
    pub temperature_f: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_place_tag_maps_to_other() {
        assert_eq!(PlaceType::from_tag("stadium"), PlaceType::Stadium);
        assert_eq!(PlaceType::from_tag("car_wash"), PlaceType::Other);
    }

    #[test]
    fn first_recognized_skips_unknown_tags() {
        let tags = ["point_of_interest", "establishment", "museum", "church"];
        assert_eq!(
            PlaceType::first_recognized(tags),
            Some(PlaceType::Museum)
        );
        assert_eq!(PlaceType::first_recognized(["establishment"]), None);
    }

    #[test]
    fn lot_type_defaults_to_public() {
        let location = ParkingLocation {
            id: "lot-1".to_string(),
            name: "North Lot".to_string(),
            latitude: 42.73,
            longitude: -73.68,
            address: None,
            hours_of_operation: None,
            source: None,
            fee: None,
            access_type: None,
        };
        assert_eq!(location.lot_type(), "public");
    }
}
