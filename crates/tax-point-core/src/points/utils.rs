//! Point predicates shared by the validators.

use serde::{Deserialize, Serialize};

use crate::geo::TaxPointProperties;
use crate::types::GeoId;

/// How a window treats its own end and the open points inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeScope {
    /// Itinerary-level window running to the end of the path. Open points
    /// count as stopovers and configured fare breaks apply.
    Journey,
    /// Window of an optional service or YQ/YR charge. Its end is both a
    /// stopover and a fee break, and an open point inside closes it.
    Subject,
}

/// One subject's window over the path. `begin > end` is a reversed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPointRange {
    pub begin: GeoId,
    pub end: GeoId,
    pub scope: RangeScope,
}

impl TaxPointRange {
    pub fn journey(begin: GeoId, end: GeoId) -> Self {
        Self {
            begin,
            end,
            scope: RangeScope::Journey,
        }
    }

    pub fn subject(begin: GeoId, end: GeoId) -> Self {
        Self {
            begin,
            end,
            scope: RangeScope::Subject,
        }
    }

    pub fn low(&self) -> GeoId {
        self.begin.min(self.end)
    }

    pub fn high(&self) -> GeoId {
        self.begin.max(self.end)
    }

    pub fn contains(&self, id: GeoId) -> bool {
        (self.low()..=self.high()).contains(&id)
    }

    pub fn is_endpoint(&self, id: GeoId) -> bool {
        id == self.begin || id == self.end
    }

    pub fn is_subject(&self) -> bool {
        self.scope == RangeScope::Subject
    }
}

pub fn is_stopover(properties: &[TaxPointProperties], id: GeoId) -> bool {
    properties.get(id).is_some_and(TaxPointProperties::is_stopover)
}

/// Open break that is not one of the window's own endpoints.
pub fn is_open(properties: &[TaxPointProperties], id: GeoId, range: &TaxPointRange) -> bool {
    !range.is_endpoint(id) && properties.get(id).is_some_and(|p| p.is_open)
}

pub fn is_fare_break(properties: &[TaxPointProperties], id: GeoId, range: &TaxPointRange) -> bool {
    range.is_endpoint(id) || properties.get(id).is_some_and(|p| p.is_fare_break)
}

/// A fee is priced as ending where its own window ends.
pub fn is_fee_break(id: GeoId, range: &TaxPointRange) -> bool {
    id == range.end
}

/// Stopover as seen from a window: journeys also stop at open points,
/// subjects also stop at their own end.
pub fn counts_as_stopover(
    properties: &[TaxPointProperties],
    id: GeoId,
    range: &TaxPointRange,
) -> bool {
    if is_stopover(properties, id) {
        return true;
    }
    match range.scope {
        RangeScope::Journey => properties.get(id).is_some_and(|p| p.is_open),
        RangeScope::Subject => id == range.end,
    }
}
