//! Matching policies fed one point at a time by the finder.
//!
//! Every validator keeps one slot per range. A slot is settled at most once,
//! either with the point that matched or with no result, and is never
//! revisited, so a sweep costs one pass over the path whatever the number of
//! ranges.

use tracing::trace;

use crate::geo::TaxPointProperties;
use crate::points::utils::{self, TaxPointRange};
use crate::types::{Direction, GeoId};

pub trait TaxPointValidator {
    /// Offer the next point of the sweep. `furthest` is the furthest point
    /// computed for the sweep, if any.
    fn consume(&mut self, id: GeoId, furthest: Option<GeoId>);

    fn all_validated(&self) -> bool;

    /// Per range, the matched point.
    fn into_results(self) -> Vec<Option<GeoId>>;
}

// ---------------------------------------------------------------------------
// Settlement bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Settlement {
    results: Vec<Option<GeoId>>,
    settled: Vec<bool>,
    remaining: usize,
}

impl Settlement {
    fn new(len: usize) -> Self {
        Self {
            results: vec![None; len],
            settled: vec![false; len],
            remaining: len,
        }
    }

    fn is_settled(&self, index: usize) -> bool {
        self.settled[index]
    }

    fn settle(&mut self, index: usize, result: Option<GeoId>) {
        if self.settled[index] {
            return;
        }
        self.settled[index] = true;
        self.results[index] = result;
        self.remaining -= 1;
    }

    fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

// ---------------------------------------------------------------------------
// Point-by-point policies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// First stopover.
    Stopover,
    /// First point strictly inside the window that is not a stopover.
    Connection,
    /// First fare break, optionally required to be a stopover or open point.
    FareBreak { must_be_stopover: bool },
    /// First fee break, optionally required to be a stopover.
    FeeBreak { must_be_stopover: bool },
}

enum Verdict {
    Match,
    Close,
    Continue,
}

/// Stopover, connection, fare-break and fee-break validation over one sweep.
#[derive(Debug, Clone)]
pub struct PointValidator<'a> {
    policy: MatchPolicy,
    properties: &'a [TaxPointProperties],
    ranges: Vec<TaxPointRange>,
    direction: Direction,
    settlement: Settlement,
}

impl<'a> PointValidator<'a> {
    pub fn new(
        policy: MatchPolicy,
        properties: &'a [TaxPointProperties],
        ranges: &[TaxPointRange],
        direction: Direction,
    ) -> Self {
        Self {
            policy,
            properties,
            ranges: ranges.to_vec(),
            direction,
            settlement: Settlement::new(ranges.len()),
        }
    }

    pub fn stopover(
        properties: &'a [TaxPointProperties],
        ranges: &[TaxPointRange],
        direction: Direction,
    ) -> Self {
        Self::new(MatchPolicy::Stopover, properties, ranges, direction)
    }

    pub fn connection(
        properties: &'a [TaxPointProperties],
        ranges: &[TaxPointRange],
        direction: Direction,
    ) -> Self {
        Self::new(MatchPolicy::Connection, properties, ranges, direction)
    }

    pub fn fare_break(
        properties: &'a [TaxPointProperties],
        ranges: &[TaxPointRange],
        direction: Direction,
        must_be_stopover: bool,
    ) -> Self {
        Self::new(MatchPolicy::FareBreak { must_be_stopover }, properties, ranges, direction)
    }

    pub fn fee_break(
        properties: &'a [TaxPointProperties],
        ranges: &[TaxPointRange],
        direction: Direction,
        must_be_stopover: bool,
    ) -> Self {
        Self::new(MatchPolicy::FeeBreak { must_be_stopover }, properties, ranges, direction)
    }

    fn verdict(&self, id: GeoId, range: &TaxPointRange) -> Verdict {
        let props = self.properties;
        if self.direction.is_past(range.end, id) {
            return Verdict::Close;
        }
        if range.is_subject() && utils::is_open(props, id, range) {
            return Verdict::Close;
        }
        let stopover = utils::counts_as_stopover(props, id, range);
        match self.policy {
            MatchPolicy::Stopover if stopover => Verdict::Match,
            MatchPolicy::Stopover => Verdict::Continue,
            MatchPolicy::Connection if id == range.end => Verdict::Close,
            MatchPolicy::Connection if stopover => Verdict::Continue,
            MatchPolicy::Connection => Verdict::Match,
            MatchPolicy::FareBreak { must_be_stopover } => {
                if !utils::is_fare_break(props, id, range) {
                    Verdict::Continue
                } else if must_be_stopover && !stopover {
                    Verdict::Close
                } else {
                    Verdict::Match
                }
            }
            MatchPolicy::FeeBreak { must_be_stopover } => {
                if !utils::is_fee_break(id, range) {
                    Verdict::Continue
                } else if must_be_stopover && !stopover {
                    Verdict::Close
                } else {
                    Verdict::Match
                }
            }
        }
    }
}

impl TaxPointValidator for PointValidator<'_> {
    fn consume(&mut self, id: GeoId, _furthest: Option<GeoId>) {
        for index in 0..self.ranges.len() {
            if self.settlement.is_settled(index) {
                continue;
            }
            let range = self.ranges[index];
            match self.verdict(id, &range) {
                Verdict::Match => {
                    trace!(geo_id = id, range = index, policy = ?self.policy, "range matched");
                    self.settlement.settle(index, Some(id));
                }
                Verdict::Close => {
                    trace!(geo_id = id, range = index, policy = ?self.policy, "range closed");
                    self.settlement.settle(index, None);
                }
                Verdict::Continue => {}
            }
        }
    }

    fn all_validated(&self) -> bool {
        self.settlement.is_done()
    }

    fn into_results(self) -> Vec<Option<GeoId>> {
        self.settlement.results
    }
}

// ---------------------------------------------------------------------------
// Furthest
// ---------------------------------------------------------------------------

/// Settles every range on the first point it is offered: ranges whose window
/// holds the precomputed furthest point get it, the rest get nothing.
#[derive(Debug, Clone)]
pub struct FurthestValidator {
    ranges: Vec<TaxPointRange>,
    settlement: Settlement,
}

impl FurthestValidator {
    pub fn new(ranges: &[TaxPointRange]) -> Self {
        Self {
            ranges: ranges.to_vec(),
            settlement: Settlement::new(ranges.len()),
        }
    }
}

impl TaxPointValidator for FurthestValidator {
    fn consume(&mut self, _id: GeoId, furthest: Option<GeoId>) {
        for (index, range) in self.ranges.iter().enumerate() {
            let result = furthest.filter(|f| range.contains(*f));
            self.settlement.settle(index, result);
        }
    }

    fn all_validated(&self) -> bool {
        self.settlement.is_done()
    }

    fn into_results(self) -> Vec<Option<GeoId>> {
        self.settlement.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(len: usize) -> Vec<TaxPointProperties> {
        let mut props = vec![TaxPointProperties::default(); len];
        props[0].is_first = true;
        props[0].is_fare_break = true;
        props[len - 1].is_last = true;
        props[len - 1].is_fare_break = true;
        props
    }

    fn feed<V: TaxPointValidator>(
        mut validator: V,
        ids: &[GeoId],
        furthest: Option<GeoId>,
    ) -> Vec<Option<GeoId>> {
        for id in ids {
            if validator.all_validated() {
                break;
            }
            validator.consume(*id, furthest);
        }
        validator.into_results()
    }

    #[test]
    fn test_stopover_settles_each_range_once() {
        let mut props = props(8);
        props[3].is_time_stopover = Some(true);
        let ranges = [
            TaxPointRange::journey(0, 7),
            TaxPointRange::subject(0, 1),
            TaxPointRange::subject(0, 5),
        ];
        let validator = PointValidator::stopover(&props, &ranges, Direction::Outbound);
        assert_eq!(feed(validator, &[1, 3, 5, 7], None), vec![Some(3), Some(1), Some(3)]);
    }

    #[test]
    fn test_open_point_closes_subject_but_not_journey() {
        let mut props = props(8);
        props[1].is_open = true;
        props[2].is_open = true;
        let ranges = [TaxPointRange::journey(0, 7), TaxPointRange::subject(0, 3)];
        let validator = PointValidator::stopover(&props, &ranges, Direction::Outbound);
        assert_eq!(feed(validator, &[1, 3, 5, 7], None), vec![Some(1), None]);
    }

    #[test]
    fn test_connection_stops_before_window_end() {
        let mut props = props(8);
        props[5].is_time_stopover = Some(true);
        let ranges = [TaxPointRange::subject(0, 5), TaxPointRange::subject(0, 1)];
        let validator = PointValidator::connection(&props, &ranges, Direction::Outbound);
        assert_eq!(feed(validator, &[1, 3, 5], None), vec![Some(1), None]);
    }

    #[test]
    fn test_fare_break_must_also_be_stopover() {
        let mut props = props(8);
        props[4].is_fare_break = true;
        let ranges = [TaxPointRange::journey(7, 0)];
        let strict = PointValidator::fare_break(&props, &ranges, Direction::Inbound, true);
        assert_eq!(feed(strict, &[6, 4, 2, 0], None), vec![None]);

        let relaxed = PointValidator::fare_break(&props, &ranges, Direction::Inbound, false);
        assert_eq!(feed(relaxed, &[6, 4, 2, 0], None), vec![Some(4)]);
    }

    #[test]
    fn test_fee_break_ignores_configured_fare_breaks() {
        let mut props = props(8);
        props[3].is_fare_break = true;
        let ranges = [TaxPointRange::subject(0, 5), TaxPointRange::subject(0, 3)];
        let validator = PointValidator::fee_break(&props, &ranges, Direction::Outbound, false);
        assert_eq!(feed(validator, &[1, 3, 5, 7], None), vec![Some(5), Some(3)]);
    }

    #[test]
    fn test_point_past_window_closes_range() {
        let props = props(8);
        // 3 was skipped by the sweep, so 5 is the first point seen past the end
        let ranges = [TaxPointRange::subject(0, 3)];
        let validator = PointValidator::fee_break(&props, &ranges, Direction::Outbound, false);
        assert_eq!(feed(validator, &[1, 5, 7], None), vec![None]);
    }

    #[test]
    fn test_furthest_is_single_shot() {
        let ranges = [
            TaxPointRange::journey(0, 7),
            TaxPointRange::subject(0, 3),
            TaxPointRange::subject(0, 5),
        ];
        let mut validator = FurthestValidator::new(&ranges);
        assert!(!validator.all_validated());
        validator.consume(1, Some(5));
        assert!(validator.all_validated());
        // later points change nothing
        validator.consume(3, Some(3));
        assert_eq!(validator.into_results(), vec![Some(5), None, Some(5)]);
    }
}
