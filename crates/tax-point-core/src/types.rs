use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxPointError;
use crate::TaxPointResult;

/// Monetary amounts (YQ/YR charges). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Position of a point inside its `GeoPath`.
pub type GeoId = usize;

/// Cumulative great-circle miles.
pub type Miles = u32;

/// Event a point represents, or the event a tax is levied on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxPointTag {
    Sale,
    #[default]
    Departure,
    Arrival,
    Delivery,
}

/// Sweep direction over a path. Departure taxes look forward, arrival taxes backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    /// Derive the sweep direction from the tag of the point a search starts on.
    pub fn from_tag(geo_id: GeoId, tag: TaxPointTag) -> TaxPointResult<Self> {
        match tag {
            TaxPointTag::Departure => Ok(Direction::Outbound),
            TaxPointTag::Arrival => Ok(Direction::Inbound),
            other => Err(TaxPointError::InvalidTaxPointTag { geo_id, tag: other }),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Outbound => Direction::Inbound,
            Direction::Inbound => Direction::Outbound,
        }
    }

    /// Tag carried by the points a sweep in this direction lands on.
    pub fn target_tag(self) -> TaxPointTag {
        match self {
            Direction::Outbound => TaxPointTag::Arrival,
            Direction::Inbound => TaxPointTag::Departure,
        }
    }

    /// Move `steps` points away from `id`; `None` once the move leaves `[0, len)`.
    pub fn advance(self, id: GeoId, steps: usize, len: usize) -> Option<GeoId> {
        let next = match self {
            Direction::Outbound => id.checked_add(steps)?,
            Direction::Inbound => id.checked_sub(steps)?,
        };
        (next < len).then_some(next)
    }

    /// True when `candidate` lies strictly past `origin` in this direction.
    pub fn is_past(self, origin: GeoId, candidate: GeoId) -> bool {
        match self {
            Direction::Outbound => candidate > origin,
            Direction::Inbound => candidate < origin,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketedPointTag {
    #[default]
    MatchTicketedAndUnticketedPoints,
    MatchTicketedPointsOnly,
}

impl TicketedPointTag {
    pub fn ticketed_only(self) -> bool {
        self == TicketedPointTag::MatchTicketedPointsOnly
    }
}

/// Whether a connection is an unticketed (technical) transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnticketedTransfer {
    #[default]
    No,
    Yes,
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocType {
    #[default]
    Blank,
    Area,
    Zone,
    Nation,
    StateProvince,
    City,
    Airport,
}

/// A location predicate from a tax rule record, e.g. `Nation "BS"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocZone {
    #[serde(default)]
    pub loc_type: LocType,
    #[serde(default)]
    pub code: String,
}

impl LocZone {
    pub fn new(loc_type: LocType, code: &str) -> Self {
        Self {
            loc_type,
            code: code.to_string(),
        }
    }

    pub fn nation(code: &str) -> Self {
        Self::new(LocType::Nation, code)
    }

    pub fn is_blank(&self) -> bool {
        self.loc_type == LocType::Blank
    }
}

/// Identifies the rule that failed a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleId {
    TaxPointLoc1,
    TaxPointLoc2StopoverTag,
    TaxPointLoc2,
    TaxPointLoc3AsNextStopover,
    TaxPointLoc3AsPreviousPoint,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_tag() {
        assert_eq!(
            Direction::from_tag(0, TaxPointTag::Departure).unwrap(),
            Direction::Outbound
        );
        assert_eq!(
            Direction::from_tag(3, TaxPointTag::Arrival).unwrap(),
            Direction::Inbound
        );
        assert!(matches!(
            Direction::from_tag(2, TaxPointTag::Sale),
            Err(TaxPointError::InvalidTaxPointTag { geo_id: 2, .. })
        ));
    }

    #[test]
    fn test_direction_advance_stays_inside_path() {
        assert_eq!(Direction::Outbound.advance(5, 2, 8), Some(7));
        assert_eq!(Direction::Outbound.advance(6, 2, 8), None);
        assert_eq!(Direction::Inbound.advance(1, 2, 8), None);
        assert_eq!(Direction::Inbound.advance(7, 1, 8), Some(6));
    }
}
