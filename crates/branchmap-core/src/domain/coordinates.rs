use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "latitude" });
        }
        if !lon.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "longitude" });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange { value: lat });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::LongitudeOutOfRange { value: lon });
        }
        Ok(Self { lat, lon })
    }

    /// Parses textual degrees as they appear in pages, CSV cells and
    /// geocoder responses.
    pub fn parse_pair(lat: &str, lon: &str) -> Result<Self, ValidationError> {
        Self::new(parse_degrees("latitude", lat)?, parse_degrees("longitude", lon)?)
    }

    /// Euclidean distance in degrees, the metric used throughout the analysis.
    pub fn degree_distance(self, other: Self) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }
}

fn parse_degrees(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: raw.to_owned(),
        })
}
