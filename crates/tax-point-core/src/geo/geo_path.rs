//! The ordered sequence of tax-relevant points of one itinerary.
//!
//! Every flight contributes two points, its departure then its arrival, so
//! departures sit at even ids and arrivals at odd ids. Neighbours are kept as
//! indices into the owning path rather than references.

use serde::{Deserialize, Serialize};

use crate::error::TaxPointError;
use crate::types::{Direction, GeoId, TaxPointTag, UnticketedTransfer};
use crate::TaxPointResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    /// Airport code, e.g. "NAS"
    pub code: String,
    /// City code; equals the airport code for single-airport cities
    #[serde(default)]
    pub city_code: String,
    /// ISO nation code, e.g. "BS"
    #[serde(default)]
    pub nation: String,
    pub tag: TaxPointTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geo {
    #[serde(default)]
    id: GeoId,
    pub loc: Loc,
    #[serde(default)]
    pub unticketed_transfer: UnticketedTransfer,
    #[serde(skip)]
    prev: Option<GeoId>,
    #[serde(skip)]
    next: Option<GeoId>,
}

impl Geo {
    pub fn new(loc: Loc) -> Self {
        Self {
            id: 0,
            loc,
            unticketed_transfer: UnticketedTransfer::No,
            prev: None,
            next: None,
        }
    }

    pub fn departure(code: &str, nation: &str) -> Self {
        Self::new(Loc {
            code: code.to_string(),
            city_code: code.to_string(),
            nation: nation.to_string(),
            tag: TaxPointTag::Departure,
        })
    }

    pub fn arrival(code: &str, nation: &str) -> Self {
        Self::new(Loc {
            code: code.to_string(),
            city_code: code.to_string(),
            nation: nation.to_string(),
            tag: TaxPointTag::Arrival,
        })
    }

    pub fn with_unticketed_transfer(mut self, unticketed: UnticketedTransfer) -> Self {
        self.unticketed_transfer = unticketed;
        self
    }

    pub fn with_city(mut self, city_code: &str) -> Self {
        self.loc.city_code = city_code.to_string();
        self
    }

    pub fn id(&self) -> GeoId {
        self.id
    }

    pub fn tag(&self) -> TaxPointTag {
        self.loc.tag
    }

    pub fn nation(&self) -> &str {
        &self.loc.nation
    }

    pub fn is_departure(&self) -> bool {
        self.loc.tag == TaxPointTag::Departure
    }

    pub fn is_arrival(&self) -> bool {
        self.loc.tag == TaxPointTag::Arrival
    }

    pub fn is_unticketed(&self) -> bool {
        self.unticketed_transfer == UnticketedTransfer::Yes
    }

    pub fn prev_id(&self) -> Option<GeoId> {
        self.prev
    }

    pub fn next_id(&self) -> Option<GeoId> {
        self.next
    }

    pub fn is_first(&self) -> bool {
        self.prev.is_none()
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Immutable once built: points are linked on construction and never
/// inserted or removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Geo>", into = "Vec<Geo>")]
pub struct GeoPath {
    geos: Vec<Geo>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl GeoPath {
    /// Link `geos` into a path. Departures must sit at even positions and
    /// arrivals at odd ones.
    pub fn new(mut geos: Vec<Geo>) -> TaxPointResult<Self> {
        if geos.is_empty() || geos.len() % 2 != 0 {
            return Err(TaxPointError::InvalidInput {
                field: "geos".into(),
                reason: format!(
                    "a path needs a departure and an arrival per flight, got {} points",
                    geos.len()
                ),
            });
        }

        let len = geos.len();
        for (i, geo) in geos.iter_mut().enumerate() {
            let expected = if i % 2 == 0 {
                TaxPointTag::Departure
            } else {
                TaxPointTag::Arrival
            };
            if geo.loc.tag != expected {
                return Err(TaxPointError::InvalidInput {
                    field: format!("geos[{}].tag", i),
                    reason: format!("expected {:?}, found {:?}", expected, geo.loc.tag),
                });
            }
            geo.id = i;
            geo.prev = i.checked_sub(1);
            geo.next = (i + 1 < len).then_some(i + 1);
        }

        Ok(Self { geos })
    }

    /// Build a path from `(origin, destination)` pairs of `(code, nation)`.
    pub fn from_flights(flights: &[((&str, &str), (&str, &str))]) -> TaxPointResult<Self> {
        let geos = flights
            .iter()
            .flat_map(|&((from, from_nation), (to, to_nation))| {
                [Geo::departure(from, from_nation), Geo::arrival(to, to_nation)]
            })
            .collect();
        Self::new(geos)
    }
}

impl TryFrom<Vec<Geo>> for GeoPath {
    type Error = TaxPointError;

    fn try_from(geos: Vec<Geo>) -> Result<Self, Self::Error> {
        GeoPath::new(geos)
    }
}

impl From<GeoPath> for Vec<Geo> {
    fn from(path: GeoPath) -> Self {
        path.geos
    }
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

impl GeoPath {
    pub fn geos(&self) -> &[Geo] {
        &self.geos
    }

    pub fn len(&self) -> usize {
        self.geos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geos.is_empty()
    }

    pub fn flight_count(&self) -> usize {
        self.geos.len() / 2
    }

    pub fn geo(&self, id: GeoId) -> Option<&Geo> {
        self.geos.get(id)
    }

    pub fn try_geo(&self, id: GeoId) -> TaxPointResult<&Geo> {
        self.geos.get(id).ok_or(TaxPointError::GeoOutOfRange {
            geo_id: id,
            path_len: self.geos.len(),
        })
    }

    pub fn prev(&self, geo: &Geo) -> Option<&Geo> {
        geo.prev.and_then(|id| self.geos.get(id))
    }

    pub fn next(&self, geo: &Geo) -> Option<&Geo> {
        geo.next.and_then(|id| self.geos.get(id))
    }

    pub fn first_id(&self) -> GeoId {
        0
    }

    pub fn last_id(&self) -> GeoId {
        self.geos.len().saturating_sub(1)
    }

    /// Last point reachable from anywhere on the path in `direction`.
    pub fn journey_end(&self, direction: Direction) -> GeoId {
        match direction {
            Direction::Outbound => self.last_id(),
            Direction::Inbound => self.first_id(),
        }
    }

    /// The point of the same flight on the other side of `id`.
    pub fn flight_partner(&self, id: GeoId) -> Option<GeoId> {
        let partner = if id % 2 == 0 { id + 1 } else { id - 1 };
        (partner < self.geos.len()).then_some(partner)
    }

    /// True when `a` and `b` lie in different nations.
    pub fn crosses_border(&self, a: GeoId, b: GeoId) -> bool {
        match (self.geo(a), self.geo(b)) {
            (Some(x), Some(y)) => x.nation() != y.nation(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
