use crate::parking::ParkingLocation;

pub const MOCK_SOURCE: &str = "mock_data";

/// Two fixed lots near the campus center, used when live lot search is off or failing.
pub fn mock_parking_lots() -> Vec<ParkingLocation> {
    vec![
        ParkingLocation {
            id: "mock_1".to_string(),
            name: "Test Parking Lot 1".to_string(),
            latitude: 42.731419,
            longitude: -73.675290,
            address: Some("Test Address 1".to_string()),
            hours_of_operation: Some("24/7".to_string()),
            source: Some(MOCK_SOURCE.to_string()),
            fee: Some(true),
            access_type: Some("public".to_string()),
        },
        ParkingLocation {
            id: "mock_2".to_string(),
            name: "Test Parking Lot 2".to_string(),
            latitude: 42.730760,
            longitude: -73.681901,
            address: Some("Test Address 2".to_string()),
            hours_of_operation: Some("9 AM - 5 PM".to_string()),
            source: Some(MOCK_SOURCE.to_string()),
            fee: Some(false),
            access_type: Some("public".to_string()),
        },
    ]
}
