//! Rule-chain construction and the end-to-end tax point resolution entry point.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TaxPointError;
use crate::geo::properties::{check_aligned, journey_properties};
use crate::geo::{Itin, TaxPointsProperties};
use crate::payment::{
    OptionalService, OptionalServiceTag, PaymentDetail, SubjectDetail, TaxableYqYr,
};
use crate::rules::loc2_stopover_tag::{long_stop_threshold, DEFAULT_LONG_STOP_THRESHOLD_HOURS};
use crate::rules::{
    BusinessRuleApplicator, Loc2StopoverTag, Loc3GeoType, TaxMatchingApplTag, TaxPointLoc1Rule,
    TaxPointLoc2Rule, TaxPointLoc2StopoverTagRule, TaxPointLoc3AsNextStopoverRule,
    TaxPointLoc3AsPreviousPointRule,
};
use crate::services::{CumulativeMileage, Services, StaticLocService};
use crate::types::{
    with_metadata, ComputationOutput, GeoId, LocZone, Miles, RuleId, TicketedPointTag,
};
use crate::TaxPointResult;

// ---------------------------------------------------------------------------
// Rules record
// ---------------------------------------------------------------------------

/// The already-parsed tax rule fields tax point resolution consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesRecord {
    #[serde(default)]
    pub loc1_zone: LocZone,
    #[serde(default)]
    pub loc2_zone: LocZone,
    #[serde(default)]
    pub loc3_zone: LocZone,
    #[serde(default)]
    pub loc2_stopover_tag: Loc2StopoverTag,
    #[serde(default)]
    pub tax_matching_appl_tag: TaxMatchingApplTag,
    #[serde(default)]
    pub loc3_geo_type: Loc3GeoType,
    #[serde(default)]
    pub vendor: String,
    #[serde(default = "default_long_stop_threshold_hours")]
    pub long_stop_threshold_hours: i64,
}

fn default_long_stop_threshold_hours() -> i64 {
    DEFAULT_LONG_STOP_THRESHOLD_HOURS
}

impl Default for RulesRecord {
    fn default() -> Self {
        Self {
            loc1_zone: LocZone::default(),
            loc2_zone: LocZone::default(),
            loc3_zone: LocZone::default(),
            loc2_stopover_tag: Loc2StopoverTag::Blank,
            tax_matching_appl_tag: TaxMatchingApplTag::Blank,
            loc3_geo_type: Loc3GeoType::Blank,
            vendor: String::new(),
            long_stop_threshold_hours: DEFAULT_LONG_STOP_THRESHOLD_HOURS,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxPointRule {
    Loc1(TaxPointLoc1Rule),
    Loc2StopoverTag(TaxPointLoc2StopoverTagRule),
    Loc2(TaxPointLoc2Rule),
    Loc3AsNextStopover(TaxPointLoc3AsNextStopoverRule),
    Loc3AsPreviousPoint(TaxPointLoc3AsPreviousPointRule),
}

impl TaxPointRule {
    pub fn rule_id(&self) -> RuleId {
        match self {
            TaxPointRule::Loc1(_) => RuleId::TaxPointLoc1,
            TaxPointRule::Loc2StopoverTag(_) => RuleId::TaxPointLoc2StopoverTag,
            TaxPointRule::Loc2(_) => RuleId::TaxPointLoc2,
            TaxPointRule::Loc3AsNextStopover(_) => RuleId::TaxPointLoc3AsNextStopover,
            TaxPointRule::Loc3AsPreviousPoint(_) => RuleId::TaxPointLoc3AsPreviousPoint,
        }
    }

    pub fn apply(
        &self,
        itin: &Itin,
        services: Services<'_>,
        payment: &mut PaymentDetail,
    ) -> TaxPointResult<bool> {
        match self {
            TaxPointRule::Loc1(rule) => rule.applicator(itin, services).apply(payment),
            TaxPointRule::Loc2StopoverTag(rule) => rule.applicator(itin, services).apply(payment),
            TaxPointRule::Loc2(rule) => rule.applicator(itin, services).apply(payment),
            TaxPointRule::Loc3AsNextStopover(rule) => {
                rule.applicator(itin, services).apply(payment)
            }
            TaxPointRule::Loc3AsPreviousPoint(rule) => {
                rule.applicator(itin, services).apply(payment)
            }
        }
    }
}

/// Tax point rules a record calls for, in evaluation order.
pub fn build_rules(record: &RulesRecord) -> Vec<TaxPointRule> {
    let mut rules = Vec::new();
    if !record.loc1_zone.is_blank() {
        rules.push(TaxPointRule::Loc1(TaxPointLoc1Rule::new(
            record.loc1_zone.clone(),
            &record.vendor,
        )));
    }
    let has_stopover_tag = record.loc2_stopover_tag != Loc2StopoverTag::Blank;
    if has_stopover_tag && record.loc3_geo_type != Loc3GeoType::Stopover {
        rules.push(TaxPointRule::Loc2StopoverTag(
            TaxPointLoc2StopoverTagRule::new(
                record.loc2_stopover_tag,
                record.tax_matching_appl_tag.clone(),
            )
            .with_long_stop_threshold_hours(record.long_stop_threshold_hours),
        ));
    }
    match record.loc3_geo_type {
        Loc3GeoType::Stopover => rules.push(TaxPointRule::Loc3AsNextStopover(
            TaxPointLoc3AsNextStopoverRule::new(record.loc3_zone.clone(), &record.vendor),
        )),
        Loc3GeoType::Point => rules.push(TaxPointRule::Loc3AsPreviousPoint(
            TaxPointLoc3AsPreviousPointRule::new(record.loc3_zone.clone(), &record.vendor),
        )),
        Loc3GeoType::Blank => {}
    }
    if has_stopover_tag || !record.loc2_zone.is_blank() {
        rules.push(TaxPointRule::Loc2(TaxPointLoc2Rule::new(
            record.loc2_zone.clone(),
            &record.vendor,
        )));
    }
    rules
}

/// Runs `rules` in order. Stops at the first rule that leaves no subject of
/// the payment standing and returns its id.
pub fn apply_rules(
    rules: &[TaxPointRule],
    itin: &Itin,
    services: Services<'_>,
    payment: &mut PaymentDetail,
) -> TaxPointResult<Option<RuleId>> {
    for rule in rules {
        if !rule.apply(itin, services, payment)? {
            debug!(rule = ?rule.rule_id(), "payment failed");
            return Ok(Some(rule.rule_id()));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionalServiceInput {
    pub service_type: OptionalServiceTag,
    pub begin: GeoId,
    pub end: GeoId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YqYrInput {
    pub item: TaxableYqYr,
    pub begin: GeoId,
    pub end: GeoId,
}

/// The payment being evaluated: its Loc1 and the subjects it taxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub begin: GeoId,
    pub end: GeoId,
    #[serde(default)]
    pub ticketed_point_tag: TicketedPointTag,
    #[serde(default)]
    pub optional_services: Vec<OptionalServiceInput>,
    #[serde(default)]
    pub yq_yrs: Vec<YqYrInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxPointResolutionInput {
    pub itin: Itin,
    /// Per-point facts; derived from the journey ends when absent
    #[serde(default)]
    pub properties: Option<TaxPointsProperties>,
    pub payment: PaymentInput,
    pub rules: RulesRecord,
    /// Cumulative miles from the journey origin, one entry per point
    #[serde(default)]
    pub cumulative_miles: Vec<Miles>,
    #[serde(default)]
    pub locations: StaticLocService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxPointResolutionOutput {
    /// False when a rule failed every subject
    pub applies: bool,
    pub failed_at: Option<RuleId>,
    pub rules_applied: Vec<RuleId>,
    pub itinerary: SubjectDetail,
    pub optional_services: Vec<SubjectDetail>,
    pub yq_yrs: Vec<SubjectDetail>,
}

fn validate_input(input: &TaxPointResolutionInput) -> TaxPointResult<()> {
    input.itin.validate()?;
    let geo_path = input.itin.geo_path();
    geo_path.try_geo(input.payment.begin)?;
    geo_path.try_geo(input.payment.end)?;
    for service in &input.payment.optional_services {
        geo_path.try_geo(service.begin)?;
        geo_path.try_geo(service.end)?;
    }
    for yq_yr in &input.payment.yq_yrs {
        geo_path.try_geo(yq_yr.begin)?;
        geo_path.try_geo(yq_yr.end)?;
    }
    long_stop_threshold(input.rules.long_stop_threshold_hours).map_err(|e| match e {
        TaxPointError::InvalidInput { reason, .. } => TaxPointError::InvalidInput {
            field: "rules.long_stop_threshold_hours".into(),
            reason,
        },
        other => other,
    })?;
    if !input.cumulative_miles.is_empty() && input.cumulative_miles.len() != geo_path.len() {
        return Err(TaxPointError::InvalidInput {
            field: "cumulative_miles".into(),
            reason: format!(
                "expected {} entries, got {}",
                geo_path.len(),
                input.cumulative_miles.len()
            ),
        });
    }
    Ok(())
}

/// Resolves Loc1/Loc2/Loc3 for every subject of one payment against one
/// tax rule record.
pub fn resolve_tax_points(
    input: &TaxPointResolutionInput,
) -> TaxPointResult<ComputationOutput<TaxPointResolutionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;
    let geo_path = input.itin.geo_path();

    let properties = match &input.properties {
        Some(properties) => {
            check_aligned(geo_path, properties)?;
            properties.clone()
        }
        None => {
            warnings.push(
                "No tax point properties supplied; only journey ends are stopovers and fare breaks"
                    .into(),
            );
            journey_properties(geo_path)
        }
    };

    let rules = build_rules(&input.rules);
    if rules.is_empty() {
        warnings.push("Rules record selects no tax point rule".into());
    }
    let needs_mileage = rules.iter().any(|rule| {
        matches!(
            rule,
            TaxPointRule::Loc2StopoverTag(r) if r.loc2_stopover_tag == Loc2StopoverTag::Furthest
        )
    });
    if needs_mileage && input.cumulative_miles.is_empty() {
        return Err(TaxPointError::InvalidInput {
            field: "cumulative_miles".into(),
            reason: "furthest point resolution needs cumulative mileage".into(),
        });
    }

    let payment_input = &input.payment;
    let mut payment = PaymentDetail::new(
        payment_input.begin,
        payment_input.end,
        payment_input.ticketed_point_tag,
        properties,
    );
    for service in &payment_input.optional_services {
        payment = payment.with_optional_service(OptionalService::new(
            service.service_type,
            service.begin,
            service.end,
        ));
    }
    for yq_yr in &payment_input.yq_yrs {
        payment = payment.with_yq_yr(yq_yr.item.clone(), yq_yr.begin, yq_yr.end);
    }

    let mileage = CumulativeMileage::new(input.cumulative_miles.clone());
    let services = Services::new(&mileage, &input.locations);
    let failed_at = apply_rules(&rules, &input.itin, services, &mut payment)?;

    let failed = payment.failed_subject_count();
    if failed_at.is_none() && failed > 0 {
        warnings.push(format!(
            "{failed} of {} subjects failed; the remaining ones stay taxable",
            payment.subject_count()
        ));
    }

    let output = TaxPointResolutionOutput {
        applies: failed_at.is_none(),
        failed_at,
        rules_applied: rules.iter().map(TaxPointRule::rule_id).collect(),
        itinerary: payment.itinerary.clone(),
        optional_services: payment.optional_services.iter().map(|s| s.detail.clone()).collect(),
        yq_yrs: payment.yq_yrs.details.clone(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tax point resolution: Loc1 check, Loc2 by stopover/fare break/furthest point, \
         Loc3 by next stopover or previous point",
        &input.rules,
        warnings,
        elapsed,
        output,
    ))
}
