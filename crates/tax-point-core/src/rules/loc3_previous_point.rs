use serde::{Deserialize, Serialize};

use crate::geo::Itin;
use crate::payment::{PaymentDetail, SubjectRef};
use crate::points::TaxPointIterator;
use crate::rules::BusinessRuleApplicator;
use crate::services::Services;
use crate::types::{GeoId, LocZone, RuleId};
use crate::TaxPointResult;

/// Loc3 is the city right before a departure Loc1 (or right after an
/// arrival Loc1) and must lie in `zone`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPointLoc3AsPreviousPointRule {
    pub zone: LocZone,
    #[serde(default)]
    pub vendor: String,
}

impl TaxPointLoc3AsPreviousPointRule {
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
    ) -> TaxPointLoc3AsPreviousPointApplicator<'a> {
        TaxPointLoc3AsPreviousPointApplicator {
            rule: self,
            itin,
            services,
        }
    }
}

pub struct TaxPointLoc3AsPreviousPointApplicator<'a> {
    rule: &'a TaxPointLoc3AsPreviousPointRule,
    itin: &'a Itin,
    services: Services<'a>,
}

impl TaxPointLoc3AsPreviousPointApplicator<'_> {
    fn previous_point(&self, begin: GeoId, ticketed_only: bool) -> TaxPointResult<Option<GeoId>> {
        let mut iterator = TaxPointIterator::new(self.itin.geo_path(), begin, ticketed_only)?;
        let Some(geo) = iterator.decrement() else {
            return Ok(None);
        };
        let in_zone = self
            .services
            .loc
            .is_in_loc(&geo.loc.code, &self.rule.zone, &self.rule.vendor);
        Ok(in_zone.then_some(geo.id()))
    }
}

impl BusinessRuleApplicator for TaxPointLoc3AsPreviousPointApplicator<'_> {
    fn rule_id(&self) -> RuleId {
        RuleId::TaxPointLoc3AsPreviousPoint
    }

    fn apply(&self, payment: &mut PaymentDetail) -> TaxPointResult<bool> {
        let ticketed_only = payment.ticketed_only();
        let subjects = payment
            .live_segment_subjects()
            .into_iter()
            .filter(|s| !matches!(s, SubjectRef::YqYr(_)));
        for subject in subjects {
            let Some(begin) = payment.detail(subject).map(|d| d.begin) else {
                continue;
            };
            match self.previous_point(begin, ticketed_only)? {
                Some(loc3) => {
                    if let Some(detail) = payment.detail_mut(subject) {
                        detail.loc3 = Some(loc3);
                    }
                }
                None => payment.fail_subject(subject, self.rule_id()),
            }
        }
        Ok(!payment.is_failed_completely())
    }
}
