use serde::{Deserialize, Serialize};

use crate::geo::Itin;
use crate::payment::PaymentDetail;
use crate::rules::BusinessRuleApplicator;
use crate::services::Services;
use crate::types::{LocZone, RuleId};
use crate::TaxPointResult;

/// The resolved Loc2 must exist and lie in `zone`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPointLoc2Rule {
    pub zone: LocZone,
    #[serde(default)]
    pub vendor: String,
}

impl TaxPointLoc2Rule {
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
    ) -> TaxPointLoc2Applicator<'a> {
        TaxPointLoc2Applicator {
            rule: self,
            itin,
            services,
        }
    }
}

pub struct TaxPointLoc2Applicator<'a> {
    rule: &'a TaxPointLoc2Rule,
    itin: &'a Itin,
    services: Services<'a>,
}

impl BusinessRuleApplicator for TaxPointLoc2Applicator<'_> {
    fn rule_id(&self) -> RuleId {
        RuleId::TaxPointLoc2
    }

    fn apply(&self, payment: &mut PaymentDetail) -> TaxPointResult<bool> {
        let geo_path = self.itin.geo_path();
        for subject in payment.live_subjects() {
            let matches = match payment.detail(subject).and_then(|d| d.loc2) {
                Some(loc2) => {
                    let code = &geo_path.try_geo(loc2)?.loc.code;
                    self.services.loc.is_in_loc(code, &self.rule.zone, &self.rule.vendor)
                }
                None => false,
            };
            if !matches {
                payment.fail_subject(subject, self.rule_id());
            }
        }
        Ok(!payment.is_failed_completely())
    }
}
