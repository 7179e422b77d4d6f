use crate::error::TaxPointError;
use crate::geo::{Geo, GeoPath};
use crate::types::{GeoId, TaxPointTag};
use crate::TaxPointResult;

/// Walks from a point to the previous city (departures) or the next city
/// (arrivals), two linked points per step.
#[derive(Debug, Clone)]
pub struct TaxPointIterator<'a> {
    geo_path: &'a GeoPath,
    current: Option<GeoId>,
    backward: bool,
    ticketed_only: bool,
}

impl<'a> TaxPointIterator<'a> {
    pub fn new(geo_path: &'a GeoPath, start: GeoId, ticketed_only: bool) -> TaxPointResult<Self> {
        let geo = geo_path.try_geo(start)?;
        let backward = match geo.tag() {
            TaxPointTag::Departure => true,
            TaxPointTag::Arrival => false,
            tag => return Err(TaxPointError::InvalidTaxPointTag { geo_id: start, tag }),
        };
        Ok(Self {
            geo_path,
            current: Some(start),
            backward,
            ticketed_only,
        })
    }

    pub fn current(&self) -> Option<&'a Geo> {
        self.current.and_then(|id| self.geo_path.geo(id))
    }

    fn step(&self, geo: &'a Geo) -> Option<&'a Geo> {
        if self.backward {
            self.geo_path.prev(geo).and_then(|g| self.geo_path.prev(g))
        } else {
            self.geo_path.next(geo).and_then(|g| self.geo_path.next(g))
        }
    }

    /// Moves one city on and returns the new point, `None` once the path runs out.
    pub fn decrement(&mut self) -> Option<&'a Geo> {
        let mut geo = self.step(self.current()?);
        while let Some(candidate) = geo {
            if !(self.ticketed_only && candidate.is_unticketed()) {
                break;
            }
            tracing::trace!(geo_id = candidate.id(), "skipping unticketed point");
            geo = self.step(candidate);
        }
        self.current = geo.map(Geo::id);
        geo
    }
}

impl<'a> Iterator for TaxPointIterator<'a> {
    type Item = &'a Geo;

    fn next(&mut self) -> Option<Self::Item> {
        self.decrement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnticketedTransfer;

    fn path_of(flights: usize) -> GeoPath {
        let mut geos = Vec::new();
        for i in 0..flights {
            geos.push(Geo::departure(&format!("A{i}"), "US"));
            geos.push(Geo::arrival(&format!("A{}", i + 1), "US"));
        }
        GeoPath::new(geos).unwrap()
    }

    #[test]
    fn test_departure_walks_backward() {
        let path = path_of(4);
        let ids: Vec<GeoId> = TaxPointIterator::new(&path, 6, false)
            .unwrap()
            .map(Geo::id)
            .collect();
        assert_eq!(ids, vec![4, 2, 0]);
    }

    #[test]
    fn test_arrival_walks_forward() {
        let path = path_of(4);
        let ids: Vec<GeoId> = TaxPointIterator::new(&path, 1, false)
            .unwrap()
            .map(Geo::id)
            .collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[test]
    fn test_exhausts_within_half_the_path() {
        let path = path_of(5);
        let mut from_first = TaxPointIterator::new(&path, 0, false).unwrap();
        assert!(from_first.decrement().is_none());
        assert!(from_first.current().is_none());

        let mut from_last = TaxPointIterator::new(&path, path.last_id(), false).unwrap();
        let mut steps = 0;
        while from_last.decrement().is_some() {
            steps += 1;
        }
        assert!(steps <= path.len() / 2);
    }

    #[test]
    fn test_skips_unticketed_points() {
        let mut geos = path_of(4).geos().to_vec();
        geos[4] = geos[4].clone().with_unticketed_transfer(UnticketedTransfer::Yes);
        let path = GeoPath::new(geos).unwrap();

        let mut ticketed = TaxPointIterator::new(&path, 6, true).unwrap();
        assert_eq!(ticketed.decrement().map(Geo::id), Some(2));

        let mut any = TaxPointIterator::new(&path, 6, false).unwrap();
        assert_eq!(any.decrement().map(Geo::id), Some(4));
    }
}
