//! The independent subjects a payment taxes: the itinerary itself, each
//! optional service and each YQ/YR charge.

use serde::{Deserialize, Serialize};

use crate::types::{GeoId, Money, RuleId};

// ---------------------------------------------------------------------------
// Subject detail
// ---------------------------------------------------------------------------

/// Resolved tax points and failure slot of one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDetail {
    pub begin: GeoId,
    pub end: Option<GeoId>,
    pub loc2: Option<GeoId>,
    pub loc3: Option<GeoId>,
    pub failed_rule: Option<RuleId>,
}

impl SubjectDetail {
    /// Loc2 starts out at the end point.
    pub fn new(begin: GeoId, end: Option<GeoId>) -> Self {
        Self {
            begin,
            end,
            loc2: end,
            loc3: None,
            failed_rule: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed_rule.is_some()
    }

    /// Records `rule` as the cause unless an earlier rule already failed
    /// the subject. Returns whether this call failed it.
    pub fn fail(&mut self, rule: RuleId) -> bool {
        if self.failed_rule.is_some() {
            return false;
        }
        self.failed_rule = Some(rule);
        true
    }

    pub fn resolve_loc2(&mut self, geo_id: GeoId) {
        self.loc2 = Some(geo_id);
        self.end = Some(geo_id);
    }
}

// ---------------------------------------------------------------------------
// Optional services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionalServiceTag {
    #[default]
    Blank,
    FlightRelated,
    TicketRelated,
    Merchandise,
    FareRelated,
    PrePaid,
    BaggageCharge,
}

impl OptionalServiceTag {
    /// Charges priced per segment get their own tax points.
    pub fn is_segment_related(self) -> bool {
        matches!(
            self,
            OptionalServiceTag::FlightRelated
                | OptionalServiceTag::PrePaid
                | OptionalServiceTag::BaggageCharge
        )
    }
}

/// An ancillary charge such as a baggage fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalService {
    pub service_type: OptionalServiceTag,
    pub detail: SubjectDetail,
}

impl OptionalService {
    pub fn new(service_type: OptionalServiceTag, begin: GeoId, end: GeoId) -> Self {
        Self {
            service_type,
            detail: SubjectDetail::new(begin, Some(end)),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.detail.is_failed()
    }
}

// ---------------------------------------------------------------------------
// YQ/YR charges
// ---------------------------------------------------------------------------

/// Carrier-imposed surcharge kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YqYrType {
    #[default]
    F,
    I,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxableYqYr {
    /// "YQ" or "YR"
    pub code: String,
    pub yq_yr_type: YqYrType,
    pub tax_included: bool,
    pub amount: Money,
}

impl TaxableYqYr {
    pub fn new(code: &str, yq_yr_type: YqYrType, tax_included: bool, amount: Money) -> Self {
        Self {
            code: code.to_string(),
            yq_yr_type,
            tax_included,
            amount,
        }
    }
}

/// YQ/YR charges held as parallel arrays: item, window and resolution share an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxableYqYrs {
    pub subjects: Vec<TaxableYqYr>,
    pub ranges: Vec<(GeoId, GeoId)>,
    pub details: Vec<SubjectDetail>,
}

impl TaxableYqYrs {
    /// Adds a charge covering `begin..=end`. Its Loc2 stays unresolved
    /// until a Loc2 rule runs.
    pub fn push(&mut self, item: TaxableYqYr, begin: GeoId, end: GeoId) {
        self.subjects.push(item);
        self.ranges.push((begin, end));
        self.details.push(SubjectDetail::new(begin, None));
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn is_failed_rule(&self, index: usize) -> bool {
        self.details.get(index).is_some_and(SubjectDetail::is_failed)
    }

    pub fn are_all_failed(&self) -> bool {
        self.details.iter().all(SubjectDetail::is_failed)
    }
}
