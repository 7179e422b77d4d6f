//! Collaborators the resolution core calls out to.
//!
//! Real deployments back these with mileage and location databases; the
//! in-memory implementations here are deterministic stand-ins driven by
//! tables passed in with the input.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TaxPointError;
use crate::geo::{FlightUsage, GeoPath};
use crate::types::{GeoId, LocType, LocZone, Miles};
use crate::TaxPointResult;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One entry of a mileage ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoIdMile {
    pub geo_id: GeoId,
    pub miles: Miles,
}

impl GeoIdMile {
    pub fn new(geo_id: GeoId, miles: Miles) -> Self {
        Self { geo_id, miles }
    }
}

pub trait MileageService {
    /// Points between `from` and `to` (either order, both inclusive) ranked by
    /// distance from `from`, furthest first. Ties keep the service's order.
    fn get_miles(
        &self,
        path: &GeoPath,
        flight_usages: &[FlightUsage],
        from: GeoId,
        to: GeoId,
        as_of: NaiveDateTime,
    ) -> TaxPointResult<Vec<GeoIdMile>>;
}

pub trait LocService {
    fn is_in_loc(&self, code: &str, zone: &LocZone, vendor: &str) -> bool;
}

/// Borrowed collaborators handed to every applicator.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub mileage: &'a dyn MileageService,
    pub loc: &'a dyn LocService,
}

impl<'a> Services<'a> {
    pub fn new(mileage: &'a dyn MileageService, loc: &'a dyn LocService) -> Self {
        Self { mileage, loc }
    }
}

// ---------------------------------------------------------------------------
// Cumulative mileage
// ---------------------------------------------------------------------------

/// Mileage ranking over per-point cumulative miles from the journey origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CumulativeMileage {
    pub miles: Vec<Miles>,
}

impl CumulativeMileage {
    pub fn new(miles: Vec<Miles>) -> Self {
        Self { miles }
    }
}

impl MileageService for CumulativeMileage {
    fn get_miles(
        &self,
        path: &GeoPath,
        _flight_usages: &[FlightUsage],
        from: GeoId,
        to: GeoId,
        _as_of: NaiveDateTime,
    ) -> TaxPointResult<Vec<GeoIdMile>> {
        if self.miles.len() != path.len() {
            return Err(TaxPointError::Mileage(format!(
                "{} cumulative distances for a path of {} points",
                self.miles.len(),
                path.len()
            )));
        }
        path.try_geo(from)?;
        path.try_geo(to)?;

        let origin = self.miles[from];
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        let mut ranking: Vec<GeoIdMile> = (low..=high)
            .map(|id| GeoIdMile::new(id, self.miles[id].abs_diff(origin)))
            .collect();
        // stable: equal distances stay in path order
        ranking.sort_by(|a, b| b.miles.cmp(&a.miles));
        Ok(ranking)
    }
}

// ---------------------------------------------------------------------------
// Static locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub city: String,
    pub nation: String,
    #[serde(default)]
    pub state: Option<String>,
    /// IATA area number, e.g. "1"
    #[serde(default)]
    pub area: Option<String>,
}

/// Location lookups against an in-memory table.
///
/// Zones are named sets of nations. A blank zone matches every location, an
/// unknown location matches nothing else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticLocService {
    #[serde(default)]
    pub locations: HashMap<String, LocationEntry>,
    #[serde(default)]
    pub zones: HashMap<String, Vec<String>>,
}

impl StaticLocService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, code: &str, city: &str, nation: &str) -> Self {
        self.locations.insert(
            code.to_string(),
            LocationEntry {
                city: city.to_string(),
                nation: nation.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_zone(mut self, zone: &str, nations: &[&str]) -> Self {
        self.zones.insert(
            zone.to_string(),
            nations.iter().map(|n| n.to_string()).collect(),
        );
        self
    }
}

impl LocService for StaticLocService {
    fn is_in_loc(&self, code: &str, zone: &LocZone, _vendor: &str) -> bool {
        if zone.is_blank() {
            return true;
        }
        let Some(entry) = self.locations.get(code) else {
            return false;
        };
        match zone.loc_type {
            LocType::Blank => true,
            LocType::Airport => code == zone.code,
            LocType::City => entry.city == zone.code,
            LocType::Nation => entry.nation == zone.code,
            LocType::StateProvince => entry.state.as_deref() == Some(zone.code.as_str()),
            LocType::Area => entry.area.as_deref() == Some(zone.code.as_str()),
            LocType::Zone => self
                .zones
                .get(&zone.code)
                .is_some_and(|nations| nations.iter().any(|n| *n == entry.nation)),
        }
    }
}
