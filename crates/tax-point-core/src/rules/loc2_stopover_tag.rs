//! Loc2 resolution from Loc1 by stopover, fare break or furthest point.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::TaxPointError;
use crate::geo::properties::check_aligned;
use crate::geo::{Itin, TaxPointProperties};
use crate::payment::{PaymentDetail, SubjectRef};
use crate::points::{TaxPointFinder, TaxPointRange};
use crate::rules::strategies::{self, FurthestWindow};
use crate::rules::{BusinessRuleApplicator, Loc2StopoverTag, TaxMatchingApplTag};
use crate::services::Services;
use crate::types::{Direction, GeoId, RuleId};
use crate::TaxPointResult;

pub const DEFAULT_LONG_STOP_THRESHOLD_HOURS: i64 = 48;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPointLoc2StopoverTagRule {
    pub loc2_stopover_tag: Loc2StopoverTag,
    #[serde(default)]
    pub tax_matching_appl_tag: TaxMatchingApplTag,
    /// Minimum stop for matching tag "07"
    #[serde(default = "default_long_stop_threshold_hours")]
    pub long_stop_threshold_hours: i64,
}

fn default_long_stop_threshold_hours() -> i64 {
    DEFAULT_LONG_STOP_THRESHOLD_HOURS
}

/// Converts a long stop threshold in hours, rejecting negative values and
/// values no duration can hold.
pub fn long_stop_threshold(hours: i64) -> TaxPointResult<Duration> {
    let invalid = |reason: &str| TaxPointError::InvalidInput {
        field: "long_stop_threshold_hours".into(),
        reason: reason.into(),
    };
    if hours < 0 {
        return Err(invalid("must not be negative"));
    }
    Duration::try_hours(hours).ok_or_else(|| invalid("too large for a duration"))
}

impl TaxPointLoc2StopoverTagRule {
    pub fn new(
        loc2_stopover_tag: Loc2StopoverTag,
        tax_matching_appl_tag: TaxMatchingApplTag,
    ) -> Self {
        Self {
            loc2_stopover_tag,
            tax_matching_appl_tag,
            long_stop_threshold_hours: DEFAULT_LONG_STOP_THRESHOLD_HOURS,
        }
    }

    pub fn with_long_stop_threshold_hours(mut self, hours: i64) -> Self {
        self.long_stop_threshold_hours = hours;
        self
    }

    pub fn applicator<'a>(
        &'a self,
        itin: &'a Itin,
        services: Services<'a>,
    ) -> TaxPointLoc2StopoverTagApplicator<'a> {
        TaxPointLoc2StopoverTagApplicator::new(self, itin, services)
    }
}

pub struct TaxPointLoc2StopoverTagApplicator<'a> {
    rule: &'a TaxPointLoc2StopoverTagRule,
    itin: &'a Itin,
    services: Services<'a>,
}

impl<'a> TaxPointLoc2StopoverTagApplicator<'a> {
    pub fn new(
        rule: &'a TaxPointLoc2StopoverTagRule,
        itin: &'a Itin,
        services: Services<'a>,
    ) -> Self {
        Self { rule, itin, services }
    }

    fn fare_break_must_also_be_stopover(&self) -> bool {
        self.rule.tax_matching_appl_tag == TaxMatchingApplTag::FareBreakMustAlsoBeStopover
    }

    /// Resolves Loc2 for every window sharing the search begin `begin`.
    fn resolve(
        &self,
        begin: GeoId,
        ranges: &[TaxPointRange],
        match_fee_breaks: bool,
        properties: &[TaxPointProperties],
        ticketed_only: bool,
    ) -> TaxPointResult<Vec<Option<GeoId>>> {
        let geo_path = self.itin.geo_path();
        let direction = Direction::from_tag(begin, geo_path.try_geo(begin)?.tag())?;
        let furthest = match self.rule.loc2_stopover_tag {
            Loc2StopoverTag::Furthest => {
                self.furthest_point(begin, direction, properties, ticketed_only)?
            }
            _ => None,
        };
        trace!(begin, ?direction, ?furthest, ranges = ranges.len(), "tax point sweep");
        let finder = TaxPointFinder::new(
            begin,
            furthest,
            properties,
            ticketed_only,
            direction,
            geo_path,
        );
        Ok(finder.find(
            self.rule.loc2_stopover_tag,
            self.fare_break_must_also_be_stopover(),
            ranges,
            match_fee_breaks,
        ))
    }

    fn furthest_point(
        &self,
        begin: GeoId,
        direction: Direction,
        properties: &[TaxPointProperties],
        ticketed_only: bool,
    ) -> TaxPointResult<Option<GeoId>> {
        let geo_path = self.itin.geo_path();
        let end = match &self.rule.tax_matching_appl_tag {
            TaxMatchingApplTag::LastDomesticBeforeLongStop => {
                let threshold = long_stop_threshold(self.rule.long_stop_threshold_hours)?;
                return strategies::last_domestic_before_long_stop(
                    self.itin,
                    begin,
                    direction,
                    ticketed_only,
                    threshold,
                );
            }
            TaxMatchingApplTag::FurthestInDirectionOfTravel => {
                let turnaround = self.turnaround()?;
                strategies::direction_of_travel_end(geo_path, begin, direction, turnaround)
            }
            TaxMatchingApplTag::FurthestBeforeDomesticStop => {
                strategies::domestic_stop_window_end(geo_path, properties, begin, direction)
            }
            _ => self.next_fare_break(begin, direction, properties, ticketed_only),
        };

        let ranking = self.services.mileage.get_miles(
            geo_path,
            self.itin.flight_usages(),
            begin,
            end,
            self.itin.travel_origin()?,
        )?;
        let window = FurthestWindow {
            begin,
            end,
            direction,
            ticketed_only,
        };
        Ok(strategies::first_furthest_candidate(&ranking, geo_path, &window))
    }

    /// Plain furthest searches stay inside the fare component of Loc1.
    fn next_fare_break(
        &self,
        begin: GeoId,
        direction: Direction,
        properties: &[TaxPointProperties],
        ticketed_only: bool,
    ) -> GeoId {
        let geo_path = self.itin.geo_path();
        let journey_end = geo_path.journey_end(direction);
        let finder =
            TaxPointFinder::new(begin, None, properties, ticketed_only, direction, geo_path);
        finder
            .find(
                Loc2StopoverTag::FareBreak,
                false,
                &[TaxPointRange::journey(begin, journey_end)],
                false,
            )
            .first()
            .copied()
            .flatten()
            .unwrap_or(journey_end)
    }

    /// Cached on the itinerary: every rule sees the same turnaround.
    fn turnaround(&self) -> TaxPointResult<Option<GeoId>> {
        if !self.itin.round_trip_or_open_jaw {
            return Ok(None);
        }
        let geo_path = self.itin.geo_path();
        self.itin.turnaround_with(|| {
            let ranking = self.services.mileage.get_miles(
                geo_path,
                self.itin.flight_usages(),
                geo_path.first_id(),
                geo_path.last_id(),
                self.itin.travel_origin()?,
            )?;
            let turnaround = strategies::turnaround_from_ranking(&ranking, geo_path);
            debug!(?turnaround, "journey turnaround");
            Ok(turnaround)
        })
    }

    /// Loc2 of every live segment subject. Subjects sharing a begin point
    /// share one sweep.
    fn resolve_subjects(
        &self,
        payment: &PaymentDetail,
    ) -> TaxPointResult<Vec<(SubjectRef, Option<GeoId>)>> {
        let geo_path = self.itin.geo_path();
        check_aligned(geo_path, &payment.properties)?;
        let props = &payment.properties;
        let ticketed_only = payment.ticketed_only();

        let mut resolved = Vec::new();
        let mut groups: BTreeMap<GeoId, Vec<(SubjectRef, TaxPointRange)>> = BTreeMap::new();
        for subject in payment.live_segment_subjects() {
            match subject {
                SubjectRef::Itinerary => {
                    let begin = payment.itinerary.begin;
                    let direction = Direction::from_tag(begin, geo_path.try_geo(begin)?.tag())?;
                    let range = TaxPointRange::journey(begin, geo_path.journey_end(direction));
                    let results = self.resolve(begin, &[range], false, props, ticketed_only)?;
                    resolved.push((subject, results.first().copied().flatten()));
                }
                SubjectRef::OptionalService(i) => {
                    let detail = &payment.optional_services[i].detail;
                    let begin_tag = geo_path.try_geo(detail.begin)?.tag();
                    let direction = Direction::from_tag(detail.begin, begin_tag)?;
                    let end = detail.end.unwrap_or_else(|| geo_path.journey_end(direction));
                    groups
                        .entry(detail.begin)
                        .or_default()
                        .push((subject, TaxPointRange::subject(detail.begin, end)));
                }
                SubjectRef::YqYr(i) => {
                    let (begin, end) = payment.yq_yrs.ranges[i];
                    groups
                        .entry(begin)
                        .or_default()
                        .push((subject, TaxPointRange::subject(begin, end)));
                }
            }
        }

        for (begin, members) in groups {
            let ranges: Vec<TaxPointRange> = members.iter().map(|(_, range)| *range).collect();
            let results = self.resolve(begin, &ranges, true, props, ticketed_only)?;
            resolved.extend(members.into_iter().map(|(subject, _)| subject).zip(results));
        }
        Ok(resolved)
    }

    fn write_back(&self, payment: &mut PaymentDetail, subject: SubjectRef, result: Option<GeoId>) {
        match result {
            Some(loc2) => {
                if let Some(detail) = payment.detail_mut(subject) {
                    detail.resolve_loc2(loc2);
                }
            }
            None => payment.fail_subject(subject, RuleId::TaxPointLoc2StopoverTag),
        }
    }
}

impl BusinessRuleApplicator for TaxPointLoc2StopoverTagApplicator<'_> {
    fn rule_id(&self) -> RuleId {
        RuleId::TaxPointLoc2StopoverTag
    }

    fn apply(&self, payment: &mut PaymentDetail) -> TaxPointResult<bool> {
        if self.rule.loc2_stopover_tag == Loc2StopoverTag::Blank {
            return Ok(true);
        }
        let resolved = self.resolve_subjects(payment)?;
        for (subject, result) in resolved {
            self.write_back(payment, subject, result);
        }

        let passed = !payment.is_failed_completely();
        if !passed {
            debug!(rule = ?self.rule_id(), "every subject failed");
        }
        Ok(passed)
    }
}
