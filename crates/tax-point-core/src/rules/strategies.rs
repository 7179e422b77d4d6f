//! Pure helpers behind the Loc2 furthest-point variants. They take resolved
//! facts (path, properties, mileage ranking, flight times) and never touch
//! the payment.

use chrono::Duration;
use tracing::trace;

use crate::geo::{GeoPath, Itin, TaxPointProperties};
use crate::services::GeoIdMile;
use crate::types::{Direction, GeoId, TaxPointTag};
use crate::TaxPointResult;

/// Where a furthest-point search may look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FurthestWindow {
    pub begin: GeoId,
    pub end: GeoId,
    pub direction: Direction,
    pub ticketed_only: bool,
}

/// First ranked point the sweep could land on: target tag of the direction,
/// strictly past the search begin, inside the window.
///
/// The far side of a ground gap never carries the target tag, so surface
/// destinations are never candidates.
pub fn first_furthest_candidate(
    ranking: &[GeoIdMile],
    geo_path: &GeoPath,
    window: &FurthestWindow,
) -> Option<GeoId> {
    let low = window.begin.min(window.end);
    let high = window.begin.max(window.end);
    ranking.iter().map(|m| m.geo_id).find(|&id| {
        let Some(geo) = geo_path.geo(id) else {
            return false;
        };
        let eligible = geo.tag() == window.direction.target_tag()
            && window.direction.is_past(window.begin, id)
            && (low..=high).contains(&id)
            && !(window.ticketed_only && geo.is_unticketed());
        if !eligible {
            trace!(geo_id = id, "furthest candidate rejected");
        }
        eligible
    })
}

/// The turnaround of a round trip: the furthest arrival of the whole journey.
pub fn turnaround_from_ranking(ranking: &[GeoIdMile], geo_path: &GeoPath) -> Option<GeoId> {
    ranking
        .iter()
        .map(|m| m.geo_id)
        .find(|&id| geo_path.geo(id).is_some_and(|g| g.tag() == TaxPointTag::Arrival))
}

/// End of a direction-of-travel search that must stay on Loc1's side of the turnaround.
pub fn direction_of_travel_end(
    geo_path: &GeoPath,
    begin: GeoId,
    direction: Direction,
    turnaround: Option<GeoId>,
) -> GeoId {
    match (direction, turnaround) {
        (Direction::Outbound, Some(t)) if begin < t => t,
        (Direction::Inbound, Some(t)) if begin > t => t,
        _ => geo_path.journey_end(direction),
    }
}

/// Cuts the search window just before the first domestic stopover reached
/// from another nation, e.g. MUC-DUB-FRA-KUL stops the search at DUB when
/// FRA is a stopover.
pub fn domestic_stop_window_end(
    geo_path: &GeoPath,
    properties: &[TaxPointProperties],
    begin: GeoId,
    direction: Direction,
) -> GeoId {
    let len = geo_path.len();
    let Some(home) = geo_path.geo(begin).map(|g| g.nation()) else {
        return geo_path.journey_end(direction);
    };
    let mut current = direction.advance(begin, 1, len);
    while let Some(id) = current {
        let stopover = properties.get(id).is_some_and(TaxPointProperties::is_stopover);
        let domestic = geo_path.geo(id).is_some_and(|g| g.nation() == home);
        if stopover && domestic {
            if let Some(before) = direction.opposite().advance(id, 1, len) {
                if geo_path.crosses_border(before, id) {
                    trace!(
                        geo_id = id,
                        window_end = before,
                        "domestic stopover cuts furthest window"
                    );
                    return before;
                }
            }
        }
        current = direction.advance(id, 2, len);
    }
    geo_path.journey_end(direction)
}

/// Ground time at the stop between `a` and `b`, two points of adjacent flights.
fn stop_between(itin: &Itin, a: GeoId, b: GeoId) -> TaxPointResult<Option<Duration>> {
    itin.stop_duration(a.min(b))
}

/// Last point of the domestic stretch Loc1 belongs to, provided some stop
/// along that stretch (Loc1's own stop included) lasts at least `threshold`.
///
/// The stretch ends at the first point, or the first adjoining point, in
/// another nation. Unticketed points are passed over when only ticketed
/// points match.
pub fn last_domestic_before_long_stop(
    itin: &Itin,
    begin: GeoId,
    direction: Direction,
    ticketed_only: bool,
    threshold: Duration,
) -> TaxPointResult<Option<GeoId>> {
    let geo_path = itin.geo_path();
    let len = geo_path.len();
    let home = geo_path.try_geo(begin)?.nation();
    let is_home = |id: GeoId| geo_path.geo(id).is_some_and(|g| g.nation() == home);

    let mut long_stop = false;
    if let Some(before) = direction.opposite().advance(begin, 1, len) {
        if is_home(before) {
            long_stop = stop_between(itin, before, begin)?.is_some_and(|d| d >= threshold);
        }
    }

    let mut last = None;
    let mut current = direction.advance(begin, 1, len);
    while let Some(id) = current {
        current = direction.advance(id, 2, len);
        if ticketed_only && geo_path.geo(id).is_some_and(|g| g.is_unticketed()) {
            continue;
        }
        if !is_home(id) {
            break;
        }
        last = Some(id);
        let Some(after) = direction.advance(id, 1, len) else {
            break;
        };
        if !is_home(after) {
            break;
        }
        if stop_between(itin, id, after)?.is_some_and(|d| d >= threshold) {
            trace!(geo_id = id, "long stop inside domestic stretch");
            long_stop = true;
        }
    }
    Ok(if long_stop { last } else { None })
}
