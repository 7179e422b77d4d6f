//! Per-point facts computed by itinerary analysis before tax points are resolved.

use serde::{Deserialize, Serialize};

use crate::error::TaxPointError;
use crate::geo::GeoPath;
use crate::TaxPointResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxPointProperties {
    pub is_first: bool,
    pub is_last: bool,
    /// Open-jaw or surface break that does not count as a connection
    pub is_open: bool,
    pub is_fare_break: bool,
    /// `None` while another rule has yet to decide
    pub is_time_stopover: Option<bool>,
    pub is_extended_stopover: bool,
    /// Ground segment marker
    pub is_surface: bool,
}

impl TaxPointProperties {
    pub fn is_time_stopover(&self) -> bool {
        self.is_time_stopover == Some(true)
    }

    pub fn is_stopover(&self) -> bool {
        self.is_first
            || self.is_last
            || self.is_surface
            || self.is_time_stopover()
            || self.is_extended_stopover
    }
}

/// Index-aligned with `GeoPath::geos()`.
pub type TaxPointsProperties = Vec<TaxPointProperties>;

/// Baseline facts for a path: journey ends are first/last and fare breaks.
pub fn journey_properties(path: &GeoPath) -> TaxPointsProperties {
    let mut properties = vec![TaxPointProperties::default(); path.len()];
    if let Some(first) = properties.first_mut() {
        first.is_first = true;
        first.is_fare_break = true;
    }
    if let Some(last) = properties.last_mut() {
        last.is_last = true;
        last.is_fare_break = true;
    }
    properties
}

pub fn check_aligned(path: &GeoPath, properties: &[TaxPointProperties]) -> TaxPointResult<()> {
    if path.len() != properties.len() {
        return Err(TaxPointError::PropertiesMismatch {
            geos: path.len(),
            properties: properties.len(),
        });
    }
    Ok(())
}
