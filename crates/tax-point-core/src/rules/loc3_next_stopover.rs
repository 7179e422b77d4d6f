use serde::{Deserialize, Serialize};

use crate::geo::properties::check_aligned;
use crate::geo::Itin;
use crate::payment::{PaymentDetail, SubjectRef};
use crate::points::{PointValidator, TaxPointFinder, TaxPointRange};
use crate::rules::BusinessRuleApplicator;
use crate::services::Services;
use crate::types::{Direction, GeoId, LocZone, RuleId};
use crate::TaxPointResult;

/// Loc3 is the next stopover after Loc1 and must lie in `zone`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPointLoc3AsNextStopoverRule {
    pub zone: LocZone,
    #[serde(default)]
    pub vendor: String,
}

impl TaxPointLoc3AsNextStopoverRule {
    pub fn new(zone: LocZone, vendor: &str) -> Self {
        Self {
            zone,
            vendor: vendor.to_string(),
        }
    }

    pub fn applicator<'a>(
        &'a self,
        itin: &'a Itin,
        services: Services<'a>,
    ) -> TaxPointLoc3AsNextStopoverApplicator<'a> {
        TaxPointLoc3AsNextStopoverApplicator {
            rule: self,
            itin,
            services,
        }
    }
}

pub struct TaxPointLoc3AsNextStopoverApplicator<'a> {
    rule: &'a TaxPointLoc3AsNextStopoverRule,
    itin: &'a Itin,
    services: Services<'a>,
}

/// Loc3 and the Loc2 derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution {
    loc2: GeoId,
    loc3: GeoId,
}

impl TaxPointLoc3AsNextStopoverApplicator<'_> {
    fn resolve(
        &self,
        payment: &PaymentDetail,
        subject: SubjectRef,
    ) -> TaxPointResult<Option<Resolution>> {
        let geo_path = self.itin.geo_path();
        let Some(detail) = payment.detail(subject) else {
            return Ok(None);
        };
        let begin = detail.begin;
        let direction = Direction::from_tag(begin, geo_path.try_geo(begin)?.tag())?;
        let journey_end = geo_path.journey_end(direction);
        let window = match subject {
            SubjectRef::Itinerary => TaxPointRange::journey(begin, journey_end),
            _ => TaxPointRange::subject(begin, detail.end.unwrap_or(journey_end)),
        };
        let props = &payment.properties;
        let ticketed_only = payment.ticketed_only();
        let finder = TaxPointFinder::new(begin, None, props, ticketed_only, direction, geo_path);

        let stopover = finder.find_with(PointValidator::stopover(props, &[window], direction));
        let Some(loc3) = stopover.first().copied().flatten() else {
            return Ok(None);
        };
        let code = &geo_path.try_geo(loc3)?.loc.code;
        if !self.services.loc.is_in_loc(code, &self.rule.zone, &self.rule.vendor) {
            return Ok(None);
        }

        let between = [TaxPointRange::subject(begin, loc3)];
        let connection = finder.find_with(PointValidator::connection(props, &between, direction));
        let loc2 = connection.first().copied().flatten().unwrap_or(loc3);
        Ok(Some(Resolution { loc2, loc3 }))
    }
}

impl BusinessRuleApplicator for TaxPointLoc3AsNextStopoverApplicator<'_> {
    fn rule_id(&self) -> RuleId {
        RuleId::TaxPointLoc3AsNextStopover
    }

    fn apply(&self, payment: &mut PaymentDetail) -> TaxPointResult<bool> {
        check_aligned(self.itin.geo_path(), &payment.properties)?;
        let subjects: Vec<SubjectRef> = payment
            .live_segment_subjects()
            .into_iter()
            .filter(|s| !matches!(s, SubjectRef::YqYr(_)))
            .collect();
        for subject in subjects {
            match self.resolve(payment, subject)? {
                Some(resolution) => {
                    if let Some(detail) = payment.detail_mut(subject) {
                        detail.loc3 = Some(resolution.loc3);
                        detail.resolve_loc2(resolution.loc2);
                    }
                }
                None => payment.fail_subject(subject, self.rule_id()),
            }
        }
        Ok(!payment.is_failed_completely())
    }
}
