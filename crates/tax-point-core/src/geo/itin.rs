use std::sync::OnceLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::TaxPointError;
use crate::geo::GeoPath;
use crate::types::GeoId;
use crate::TaxPointResult;

/// Schedule facts of one flight as flown in this itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightUsage {
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    /// Days between departure date and arrival date
    #[serde(default)]
    pub arrival_date_shift: i64,
}

impl FlightUsage {
    pub fn new(
        departure_date: NaiveDate,
        departure_time: NaiveTime,
        arrival_time: NaiveTime,
    ) -> Self {
        Self {
            departure_date,
            departure_time,
            arrival_time,
            arrival_date_shift: 0,
        }
    }

    pub fn with_arrival_date_shift(mut self, days: i64) -> Self {
        self.arrival_date_shift = days;
        self
    }

    pub fn mark_departure_date(&mut self, date: NaiveDate) {
        self.departure_date = date;
    }

    pub fn departure_date_time(&self) -> NaiveDateTime {
        self.departure_date.and_time(self.departure_time)
    }

    pub fn arrival_date_time(&self) -> NaiveDateTime {
        (self.departure_date + Duration::days(self.arrival_date_shift)).and_time(self.arrival_time)
    }
}

/// One itinerary: its path, the flights behind it and its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itin {
    pub geo_path: GeoPath,
    pub flight_usages: Vec<FlightUsage>,
    #[serde(default)]
    pub round_trip_or_open_jaw: bool,
    #[serde(skip)]
    turnaround: OnceLock<Option<GeoId>>,
}

impl Itin {
    pub fn new(geo_path: GeoPath, flight_usages: Vec<FlightUsage>) -> TaxPointResult<Self> {
        let itin = Self {
            geo_path,
            flight_usages,
            round_trip_or_open_jaw: false,
            turnaround: OnceLock::new(),
        };
        itin.validate()?;
        Ok(itin)
    }

    pub fn with_round_trip_or_open_jaw(mut self, round_trip_or_open_jaw: bool) -> Self {
        self.round_trip_or_open_jaw = round_trip_or_open_jaw;
        self
    }

    /// Every flight of the path needs exactly one usage.
    pub fn validate(&self) -> TaxPointResult<()> {
        if self.flight_usages.len() != self.geo_path.flight_count() {
            return Err(TaxPointError::InvalidInput {
                field: "flight_usages".into(),
                reason: format!(
                    "{} flight usages for a path of {} flights",
                    self.flight_usages.len(),
                    self.geo_path.flight_count()
                ),
            });
        }
        Ok(())
    }

    pub fn geo_path(&self) -> &GeoPath {
        &self.geo_path
    }

    pub fn flight_usages(&self) -> &[FlightUsage] {
        &self.flight_usages
    }

    pub fn flight_usage_for(&self, geo_id: GeoId) -> TaxPointResult<&FlightUsage> {
        self.flight_usages
            .get(geo_id / 2)
            .ok_or(TaxPointError::FlightUsageMissing { geo_id })
    }

    /// Departure of the first flight; mileage is looked up as of this moment.
    pub fn travel_origin(&self) -> TaxPointResult<NaiveDateTime> {
        Ok(self.flight_usage_for(0)?.departure_date_time())
    }

    /// Ground time between the arrival `arrival_id` and the departure that
    /// follows it. `None` at the journey destination or on a departure id.
    pub fn stop_duration(&self, arrival_id: GeoId) -> TaxPointResult<Option<Duration>> {
        if arrival_id % 2 == 0 || arrival_id + 1 >= self.geo_path.len() {
            return Ok(None);
        }
        let inbound = self.flight_usage_for(arrival_id)?;
        let outbound = self.flight_usage_for(arrival_id + 1)?;
        Ok(Some(outbound.departure_date_time() - inbound.arrival_date_time()))
    }

    /// Turnaround point of the journey, computed by `compute` on first use.
    pub fn turnaround_with(
        &self,
        compute: impl FnOnce() -> TaxPointResult<Option<GeoId>>,
    ) -> TaxPointResult<Option<GeoId>> {
        if let Some(turnaround) = self.turnaround.get() {
            return Ok(*turnaround);
        }
        let turnaround = compute()?;
        // a concurrent initialiser computed the same value from the same path
        let _ = self.turnaround.set(turnaround);
        Ok(turnaround)
    }
}
