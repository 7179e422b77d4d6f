//! Tax point rules and the applicators that resolve and check Loc1/Loc2/Loc3.

pub mod loc1;
pub mod loc2;
pub mod loc2_stopover_tag;
pub mod loc3_next_stopover;
pub mod loc3_previous_point;
pub mod strategies;

use serde::{Deserialize, Serialize};

use crate::payment::PaymentDetail;
use crate::types::RuleId;
use crate::TaxPointResult;

pub use loc1::{TaxPointLoc1Applicator, TaxPointLoc1Rule};
pub use loc2::{TaxPointLoc2Applicator, TaxPointLoc2Rule};
pub use loc2_stopover_tag::{TaxPointLoc2StopoverTagApplicator, TaxPointLoc2StopoverTagRule};
pub use loc3_next_stopover::{
    TaxPointLoc3AsNextStopoverApplicator, TaxPointLoc3AsNextStopoverRule,
};
pub use loc3_previous_point::{
    TaxPointLoc3AsPreviousPointApplicator, TaxPointLoc3AsPreviousPointRule,
};

// ---------------------------------------------------------------------------
// Rule vocabulary
// ---------------------------------------------------------------------------

/// How Loc2 is found from Loc1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Loc2StopoverTag {
    #[default]
    Blank,
    Stopover,
    FareBreak,
    Furthest,
}

/// Matching application tag of a tax rule, refining the Loc2 search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaxMatchingApplTag {
    #[default]
    Blank,
    /// "03": furthest point, never across the turnaround of a round trip
    FurthestInDirectionOfTravel,
    /// "05": furthest point before a domestic stopover that follows an international leg
    FurthestBeforeDomesticStop,
    /// "06": the fare break must also be a stopover
    FareBreakMustAlsoBeStopover,
    /// "07": last domestic point of a stretch holding a long stop
    LastDomesticBeforeLongStop,
    Other(String),
}

impl TaxMatchingApplTag {
    pub fn code(&self) -> &str {
        match self {
            TaxMatchingApplTag::Blank => "",
            TaxMatchingApplTag::FurthestInDirectionOfTravel => "03",
            TaxMatchingApplTag::FurthestBeforeDomesticStop => "05",
            TaxMatchingApplTag::FareBreakMustAlsoBeStopover => "06",
            TaxMatchingApplTag::LastDomesticBeforeLongStop => "07",
            TaxMatchingApplTag::Other(code) => code,
        }
    }
}

impl From<&str> for TaxMatchingApplTag {
    fn from(code: &str) -> Self {
        match code.trim() {
            "" => TaxMatchingApplTag::Blank,
            "03" => TaxMatchingApplTag::FurthestInDirectionOfTravel,
            "05" => TaxMatchingApplTag::FurthestBeforeDomesticStop,
            "06" => TaxMatchingApplTag::FareBreakMustAlsoBeStopover,
            "07" => TaxMatchingApplTag::LastDomesticBeforeLongStop,
            other => TaxMatchingApplTag::Other(other.to_string()),
        }
    }
}

impl From<String> for TaxMatchingApplTag {
    fn from(code: String) -> Self {
        TaxMatchingApplTag::from(code.as_str())
    }
}

impl From<TaxMatchingApplTag> for String {
    fn from(tag: TaxMatchingApplTag) -> Self {
        tag.code().to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Loc3GeoType {
    #[default]
    Blank,
    Stopover,
    Point,
}

// ---------------------------------------------------------------------------
// Applicators
// ---------------------------------------------------------------------------

pub trait BusinessRuleApplicator {
    fn rule_id(&self) -> RuleId;

    /// Resolves and checks this rule for every live subject of `payment`.
    /// Returns false only once every subject of the payment has failed.
    fn apply(&self, payment: &mut PaymentDetail) -> TaxPointResult<bool>;
}
