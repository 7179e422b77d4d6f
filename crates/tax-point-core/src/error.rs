use thiserror::Error;

use crate::types::TaxPointTag;

#[derive(Debug, Error)]
pub enum TaxPointError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Geo {geo_id} is tagged {tag:?}; only Departure or Arrival points can be traversed")]
    InvalidTaxPointTag { geo_id: usize, tag: TaxPointTag },

    #[error("Geo {geo_id} is outside a path of {path_len} points")]
    GeoOutOfRange { geo_id: usize, path_len: usize },

    #[error("Tax point properties cover {properties} points but the path has {geos}")]
    PropertiesMismatch { geos: usize, properties: usize },

    #[error("No flight usage backs geo {geo_id}")]
    FlightUsageMissing { geo_id: usize },

    #[error("Mileage lookup failed: {0}")]
    Mileage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TaxPointError {
    fn from(e: serde_json::Error) -> Self {
        TaxPointError::SerializationError(e.to_string())
    }
}
