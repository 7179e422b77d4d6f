use tracing::trace;

use crate::geo::{GeoPath, TaxPointProperties};
use crate::points::utils::TaxPointRange;
use crate::points::validators::{FurthestValidator, PointValidator, TaxPointValidator};
use crate::rules::Loc2StopoverTag;
use crate::types::{Direction, GeoId};

/// One directional sweep over a path, starting next to `begin`.
///
/// The sweep lands on every other point, so it only ever sees points whose
/// tag is the sweep's target tag: arrivals outbound, departures inbound.
#[derive(Debug, Clone, Copy)]
pub struct TaxPointFinder<'a> {
    begin: GeoId,
    furthest: Option<GeoId>,
    properties: &'a [TaxPointProperties],
    ticketed_only: bool,
    direction: Direction,
    geo_path: &'a GeoPath,
}

impl<'a> TaxPointFinder<'a> {
    pub fn new(
        begin: GeoId,
        furthest: Option<GeoId>,
        properties: &'a [TaxPointProperties],
        ticketed_only: bool,
        direction: Direction,
        geo_path: &'a GeoPath,
    ) -> Self {
        Self {
            begin,
            furthest,
            properties,
            ticketed_only,
            direction,
            geo_path,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn find_with<V: TaxPointValidator>(&self, mut validator: V) -> Vec<Option<GeoId>> {
        let len = self.geo_path.len();
        let mut current = self.direction.advance(self.begin, 1, len);
        while let Some(id) = current {
            if validator.all_validated() {
                break;
            }
            let unticketed = self.geo_path.geo(id).is_some_and(|geo| geo.is_unticketed());
            if self.ticketed_only && unticketed {
                trace!(geo_id = id, "skipping unticketed point");
            } else {
                validator.consume(id, self.furthest);
            }
            current = self.direction.advance(id, 2, len);
        }
        validator.into_results()
    }

    /// Runs the validator the Loc2 stopover tag calls for. Subject windows
    /// match on fee breaks, itinerary windows on fare breaks.
    pub fn find(
        &self,
        loc2_stopover_tag: Loc2StopoverTag,
        fare_break_must_also_be_stopover: bool,
        ranges: &[TaxPointRange],
        match_fee_breaks: bool,
    ) -> Vec<Option<GeoId>> {
        let props = self.properties;
        let direction = self.direction;
        match loc2_stopover_tag {
            Loc2StopoverTag::Stopover => {
                self.find_with(PointValidator::stopover(props, ranges, direction))
            }
            Loc2StopoverTag::Furthest => self.find_with(FurthestValidator::new(ranges)),
            Loc2StopoverTag::FareBreak if match_fee_breaks => {
                self.find_with(PointValidator::fee_break(
                    props,
                    ranges,
                    direction,
                    fare_break_must_also_be_stopover,
                ))
            }
            Loc2StopoverTag::FareBreak => self.find_with(PointValidator::fare_break(
                props,
                ranges,
                direction,
                fare_break_must_also_be_stopover,
            )),
            Loc2StopoverTag::Blank => vec![None; ranges.len()],
        }
    }
}
