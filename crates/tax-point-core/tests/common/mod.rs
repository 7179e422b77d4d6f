#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tax_point_core::geo::{FlightUsage, Geo, GeoPath, Itin, TaxPointProperties};
use tax_point_core::services::{GeoIdMile, LocService, MileageService};
use tax_point_core::{GeoId, LocZone, TaxPointError, TaxPointResult, UnticketedTransfer};

/// Mileage double answering only the lookups a test scripted.
#[derive(Default)]
pub struct ScriptedMileage {
    rankings: HashMap<(GeoId, GeoId), Vec<GeoIdMile>>,
    calls: RefCell<Vec<(GeoId, GeoId)>>,
}

impl ScriptedMileage {
    pub fn script(&mut self, from: GeoId, to: GeoId, ranking: &[(GeoId, u32)]) {
        let ranking = ranking.iter().map(|(id, miles)| GeoIdMile::new(*id, *miles)).collect();
        self.rankings.insert((from, to), ranking);
    }

    pub fn calls_to(&self, from: GeoId, to: GeoId) -> usize {
        self.calls.borrow().iter().filter(|c| **c == (from, to)).count()
    }
}

impl MileageService for ScriptedMileage {
    fn get_miles(
        &self,
        _path: &GeoPath,
        _flight_usages: &[FlightUsage],
        from: GeoId,
        to: GeoId,
        _as_of: NaiveDateTime,
    ) -> TaxPointResult<Vec<GeoIdMile>> {
        self.calls.borrow_mut().push((from, to));
        self.rankings
            .get(&(from, to))
            .cloned()
            .ok_or_else(|| TaxPointError::Mileage(format!("unexpected lookup {from} -> {to}")))
    }
}

/// Every location is in every zone.
pub struct AnyLoc;

impl LocService for AnyLoc {
    fn is_in_loc(&self, _code: &str, _zone: &LocZone, _vendor: &str) -> bool {
        true
    }
}

/// Points and flights of a test itinerary, mutable between applications.
pub struct TripBuilder {
    pub geos: Vec<Geo>,
    pub usages: Vec<FlightUsage>,
    pub properties: Vec<TaxPointProperties>,
    pub round_trip_or_open_jaw: bool,
}

impl TripBuilder {
    /// `num_geos` points, one flight a day from 2016-11-04, 08:00 to 21:00.
    pub fn new(num_geos: usize) -> Self {
        assert!(num_geos % 2 == 0);
        let geos = (0..num_geos)
            .map(|i| {
                let code = format!("P{i}");
                if i % 2 == 0 {
                    Geo::departure(&code, "")
                } else {
                    Geo::arrival(&code, "")
                }
            })
            .collect();
        let usages = (0..num_geos / 2)
            .map(|i| {
                FlightUsage::new(
                    NaiveDate::from_ymd_opt(2016, 11, 4 + i as u32).unwrap(),
                    NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
                )
            })
            .collect();
        let mut properties = vec![TaxPointProperties::default(); num_geos];
        properties[0].is_first = true;
        properties[0].is_fare_break = true;
        properties[num_geos - 1].is_last = true;
        properties[num_geos - 1].is_fare_break = true;
        Self {
            geos,
            usages,
            properties,
            round_trip_or_open_jaw: false,
        }
    }

    pub fn itin(&self) -> Itin {
        let path = GeoPath::new(self.geos.clone()).unwrap();
        Itin::new(path, self.usages.clone())
            .unwrap()
            .with_round_trip_or_open_jaw(self.round_trip_or_open_jaw)
    }

    pub fn set_loc(&mut self, id: GeoId, code: &str, nation: &str) {
        self.geos[id].loc.code = code.to_string();
        self.geos[id].loc.city_code = code.to_string();
        self.geos[id].loc.nation = nation.to_string();
    }

    pub fn set_nation(&mut self, id: GeoId, nation: &str) {
        self.geos[id].loc.nation = nation.to_string();
    }

    pub fn set_open(&mut self, a: GeoId, b: GeoId) {
        self.properties[a].is_open = true;
        self.properties[b].is_open = true;
    }

    pub fn set_fare_break(&mut self, a: GeoId, b: GeoId) {
        self.properties[a].is_fare_break = true;
        self.properties[b].is_fare_break = true;
    }

    pub fn set_stopover(&mut self, a: GeoId, b: GeoId) {
        self.set_time_stopover(a, b, true);
    }

    pub fn set_time_stopover(&mut self, a: GeoId, b: GeoId, stopover: bool) {
        self.properties[a].is_time_stopover = Some(stopover);
        self.properties[b].is_time_stopover = Some(stopover);
    }

    pub fn set_surface(&mut self, a: GeoId, b: GeoId) {
        self.properties[a].is_surface = true;
        self.properties[b].is_surface = true;
    }

    pub fn set_unticketed(&mut self, a: GeoId, b: GeoId, unticketed: bool) {
        let flag = if unticketed {
            UnticketedTransfer::Yes
        } else {
            UnticketedTransfer::No
        };
        self.geos[a].unticketed_transfer = flag;
        self.geos[b].unticketed_transfer = flag;
    }

    /// Pushes the departure of `flight` `days` later.
    pub fn delay_departure(&mut self, flight: usize, days: i64) {
        let date = self.usages[flight].departure_date + Duration::days(days);
        self.usages[flight].mark_departure_date(date);
    }
}
