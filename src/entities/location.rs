use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub description: String,
    pub coordinates: Coordinates,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(coordinates: Coordinates, description: String) -> Self {
        Self {
            description,
            coordinates,
        }
    }
}
