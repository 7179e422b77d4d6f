use serde::{Deserialize, Serialize};

use crate::geo::Itin;
use crate::payment::PaymentDetail;
use crate::rules::BusinessRuleApplicator;
use crate::services::Services;
use crate::types::{LocZone, RuleId};
use crate::TaxPointResult;

/// Loc1 must lie in `zone`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPointLoc1Rule {
    pub zone: LocZone,
    #[serde(default)]
    pub vendor: String,
}

impl TaxPointLoc1Rule {
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
    ) -> TaxPointLoc1Applicator<'a> {
        TaxPointLoc1Applicator {
            rule: self,
            itin,
            services,
        }
    }
}

pub struct TaxPointLoc1Applicator<'a> {
    rule: &'a TaxPointLoc1Rule,
    itin: &'a Itin,
    services: Services<'a>,
}

impl BusinessRuleApplicator for TaxPointLoc1Applicator<'_> {
    fn rule_id(&self) -> RuleId {
        RuleId::TaxPointLoc1
    }

    fn apply(&self, payment: &mut PaymentDetail) -> TaxPointResult<bool> {
        let geo_path = self.itin.geo_path();
        for subject in payment.live_subjects() {
            let Some(begin) = payment.detail(subject).map(|d| d.begin) else {
                continue;
            };
            let code = &geo_path.try_geo(begin)?.loc.code;
            if !self.services.loc.is_in_loc(code, &self.rule.zone, &self.rule.vendor) {
                payment.fail_subject(subject, self.rule_id());
            }
        }
        Ok(!payment.is_failed_completely())
    }
}
