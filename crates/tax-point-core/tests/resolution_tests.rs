mod common;

use common::TripBuilder;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_point_core::payment::{OptionalServiceTag, TaxableYqYr, YqYrType};
use tax_point_core::resolution::{
    resolve_tax_points, OptionalServiceInput, PaymentInput, RulesRecord, TaxPointResolutionInput,
    YqYrInput,
};
use tax_point_core::rules::{Loc2StopoverTag, Loc3GeoType, TaxMatchingApplTag};
use tax_point_core::services::StaticLocService;
use tax_point_core::{GeoId, LocZone, RuleId, TaxPointError, TicketedPointTag};

// ===========================================================================
// Fixtures
// ===========================================================================

/// MUC-DUB-FRA-KUL-BKK
fn europe_asia_trip() -> TripBuilder {
    let mut trip = TripBuilder::new(8);
    let cities = [
        ("MUC", "DE"),
        ("DUB", "IE"),
        ("DUB", "IE"),
        ("FRA", "DE"),
        ("FRA", "DE"),
        ("KUL", "MY"),
        ("KUL", "MY"),
        ("BKK", "TH"),
    ];
    for (id, (code, nation)) in cities.iter().enumerate() {
        trip.set_loc(id, code, nation);
    }
    trip
}

fn europe_asia_locations() -> StaticLocService {
    StaticLocService::new()
        .with_location("MUC", "MUC", "DE")
        .with_location("DUB", "DUB", "IE")
        .with_location("FRA", "FRA", "DE")
        .with_location("KUL", "KUL", "MY")
        .with_location("BKK", "BKK", "TH")
}

fn payment(begin: GeoId, end: GeoId) -> PaymentInput {
    PaymentInput {
        begin,
        end,
        ticketed_point_tag: TicketedPointTag::default(),
        optional_services: Vec::new(),
        yq_yrs: Vec::new(),
    }
}

fn input(trip: &TripBuilder, payment: PaymentInput, rules: RulesRecord) -> TaxPointResolutionInput {
    TaxPointResolutionInput {
        itin: trip.itin(),
        properties: Some(trip.properties.clone()),
        payment,
        rules,
        cumulative_miles: vec![0, 900, 900, 1500, 1500, 7000, 7000, 7700],
        locations: europe_asia_locations(),
    }
}

// ===========================================================================
// End to end
// ===========================================================================

#[test]
fn test_resolve_from_json() {
    // MIA-NAS-FLL, departure tax of the Bahamas
    let json = r#"{
        "itin": {
            "geo_path": [
                {"loc": {"code": "MIA", "nation": "US", "tag": "Departure"}},
                {"loc": {"code": "NAS", "nation": "BS", "tag": "Arrival"}},
                {"loc": {"code": "NAS", "nation": "BS", "tag": "Departure"}},
                {"loc": {"code": "FLL", "nation": "US", "tag": "Arrival"}}
            ],
            "flight_usages": [
                {
                    "departure_date": "2016-11-04",
                    "departure_time": "08:00:00",
                    "arrival_time": "09:05:00"
                },
                {
                    "departure_date": "2016-11-09",
                    "departure_time": "15:30:00",
                    "arrival_time": "16:20:00"
                }
            ]
        },
        "payment": {"begin": 2, "end": 3},
        "rules": {
            "loc1_zone": {"loc_type": "Nation", "code": "BS"},
            "loc2_zone": {"loc_type": "Nation", "code": "US"},
            "loc2_stopover_tag": "Stopover"
        },
        "locations": {
            "locations": {
                "MIA": {"city": "MIA", "nation": "US"},
                "NAS": {"city": "NAS", "nation": "BS"},
                "FLL": {"city": "FLL", "nation": "US"}
            }
        }
    }"#;
    let input: TaxPointResolutionInput = serde_json::from_str(json).unwrap();
    let output = resolve_tax_points(&input).unwrap();
    let result = &output.result;

    assert!(result.applies);
    assert_eq!(result.failed_at, None);
    assert_eq!(
        result.rules_applied,
        vec![RuleId::TaxPointLoc1, RuleId::TaxPointLoc2StopoverTag, RuleId::TaxPointLoc2]
    );
    assert_eq!(result.itinerary.begin, 2);
    assert_eq!(result.itinerary.loc2, Some(3));
    assert!(output.warnings.iter().any(|w| w.contains("No tax point properties")));
    assert_eq!(output.metadata.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_output_serializes() {
    let trip = europe_asia_trip();
    let rules = RulesRecord {
        loc2_stopover_tag: Loc2StopoverTag::FareBreak,
        ..Default::default()
    };
    let output = resolve_tax_points(&input(&trip, payment(0, 1), rules)).unwrap();
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["result"]["itinerary"]["loc2"], 7);
    assert_eq!(json["assumptions"]["loc2_stopover_tag"], "FareBreak");
}

#[test]
fn test_resolve_furthest_with_cumulative_miles() {
    let trip = europe_asia_trip();
    let rules = RulesRecord {
        loc2_stopover_tag: Loc2StopoverTag::Furthest,
        ..Default::default()
    };
    let output = resolve_tax_points(&input(&trip, payment(0, 1), rules)).unwrap();
    assert_eq!(output.result.itinerary.loc2, Some(7));
    assert!(output.warnings.is_empty());
}

#[test]
fn test_resolve_furthest_before_domestic_stop() {
    let mut trip = europe_asia_trip();
    trip.set_stopover(3, 4);
    let rules = RulesRecord {
        loc2_stopover_tag: Loc2StopoverTag::Furthest,
        tax_matching_appl_tag: TaxMatchingApplTag::from("05"),
        ..Default::default()
    };
    let output = resolve_tax_points(&input(&trip, payment(0, 1), rules)).unwrap();
    assert_eq!(output.result.itinerary.loc2, Some(1));
}

#[test]
fn test_resolve_loc3_next_stopover() {
    let mut trip = europe_asia_trip();
    trip.set_stopover(5, 6);
    let rules = RulesRecord {
        loc1_zone: LocZone::nation("DE"),
        loc2_stopover_tag: Loc2StopoverTag::Stopover,
        loc3_geo_type: Loc3GeoType::Stopover,
        loc3_zone: LocZone::nation("MY"),
        ..Default::default()
    };
    let output = resolve_tax_points(&input(&trip, payment(0, 1), rules)).unwrap();
    let result = &output.result;
    assert_eq!(
        result.rules_applied,
        vec![RuleId::TaxPointLoc1, RuleId::TaxPointLoc3AsNextStopover, RuleId::TaxPointLoc2]
    );
    assert!(result.applies);
    assert_eq!(result.itinerary.loc3, Some(5));
    assert_eq!(result.itinerary.loc2, Some(1));
}

#[test]
fn test_resolve_loc3_previous_point() {
    let trip = europe_asia_trip();
    let rules = RulesRecord {
        loc2_stopover_tag: Loc2StopoverTag::Stopover,
        loc3_geo_type: Loc3GeoType::Point,
        loc3_zone: LocZone::nation("IE"),
        ..Default::default()
    };
    let output = resolve_tax_points(&input(&trip, payment(4, 5), rules)).unwrap();
    let result = &output.result;
    assert_eq!(
        result.rules_applied,
        vec![
            RuleId::TaxPointLoc2StopoverTag,
            RuleId::TaxPointLoc3AsPreviousPoint,
            RuleId::TaxPointLoc2
        ]
    );
    assert_eq!(result.itinerary.loc3, Some(2));
    assert_eq!(result.itinerary.loc2, Some(7));
}

#[test]
fn test_first_rule_failing_everything_stops_the_chain() {
    let trip = europe_asia_trip();
    let rules = RulesRecord {
        loc1_zone: LocZone::nation("MY"),
        loc2_stopover_tag: Loc2StopoverTag::Stopover,
        ..Default::default()
    };
    let output = resolve_tax_points(&input(&trip, payment(0, 1), rules)).unwrap();
    let result = &output.result;
    assert!(!result.applies);
    assert_eq!(result.failed_at, Some(RuleId::TaxPointLoc1));
    assert_eq!(result.itinerary.failed_rule, Some(RuleId::TaxPointLoc1));
    // Loc2 is never searched
    assert_eq!(result.itinerary.loc2, Some(1));
}

#[test]
fn test_partial_failure_is_reported() {
    let mut trip = europe_asia_trip();
    trip.set_open(3, 4);
    let mut payment = payment(0, 1);
    payment.optional_services.push(OptionalServiceInput {
        service_type: OptionalServiceTag::BaggageCharge,
        begin: 0,
        end: 5,
    });
    payment.yq_yrs.push(YqYrInput {
        item: TaxableYqYr::new("YQ", YqYrType::F, false, dec!(125.00)),
        begin: 0,
        end: 3,
    });
    let rules = RulesRecord {
        loc2_stopover_tag: Loc2StopoverTag::Stopover,
        ..Default::default()
    };
    let output = resolve_tax_points(&input(&trip, payment, rules)).unwrap();
    let result = &output.result;

    assert!(result.applies);
    assert_eq!(result.itinerary.loc2, Some(3));
    // the open point inside the baggage window closes it
    assert_eq!(
        result.optional_services[0].failed_rule,
        Some(RuleId::TaxPointLoc2StopoverTag)
    );
    assert_eq!(result.yq_yrs[0].loc2, Some(3));
    assert!(output.warnings.iter().any(|w| w.contains("1 of 3 subjects failed")));
}

#[test]
fn test_blank_record_applies_everywhere() {
    let trip = europe_asia_trip();
    let output = resolve_tax_points(&input(&trip, payment(2, 3), RulesRecord::default())).unwrap();
    assert!(output.result.applies);
    assert!(output.result.rules_applied.is_empty());
    assert!(output.warnings.iter().any(|w| w.contains("selects no tax point rule")));
}

// ===========================================================================
// Input validation
// ===========================================================================

#[test]
fn test_furthest_without_mileage_is_rejected() {
    let trip = europe_asia_trip();
    let rules = RulesRecord {
        loc2_stopover_tag: Loc2StopoverTag::Furthest,
        ..Default::default()
    };
    let mut input = input(&trip, payment(0, 1), rules);
    input.cumulative_miles.clear();
    let err = resolve_tax_points(&input).unwrap_err();
    assert!(matches!(
        err,
        TaxPointError::InvalidInput { ref field, .. } if field == "cumulative_miles"
    ));
}

#[test]
fn test_short_mileage_table_is_rejected() {
    let trip = europe_asia_trip();
    let mut input = input(&trip, payment(0, 1), RulesRecord::default());
    input.cumulative_miles.pop();
    assert!(matches!(
        resolve_tax_points(&input),
        Err(TaxPointError::InvalidInput { .. })
    ));
}

#[test]
fn test_payment_outside_path_is_rejected() {
    let trip = europe_asia_trip();
    let input = input(&trip, payment(8, 9), RulesRecord::default());
    assert!(matches!(
        resolve_tax_points(&input),
        Err(TaxPointError::GeoOutOfRange { geo_id: 8, path_len: 8 })
    ));
}

#[test]
fn test_misaligned_properties_are_rejected() {
    let trip = europe_asia_trip();
    let mut input = input(&trip, payment(0, 1), RulesRecord::default());
    input.properties.as_mut().unwrap().pop();
    assert!(matches!(
        resolve_tax_points(&input),
        Err(TaxPointError::PropertiesMismatch { geos: 8, properties: 7 })
    ));
}

#[test]
fn test_negative_long_stop_threshold_is_rejected() {
    let trip = europe_asia_trip();
    let rules = RulesRecord {
        long_stop_threshold_hours: -1,
        ..Default::default()
    };
    assert!(matches!(
        resolve_tax_points(&input(&trip, payment(0, 1), rules)),
        Err(TaxPointError::InvalidInput { .. })
    ));
}

#[test]
fn test_unrepresentable_long_stop_threshold_is_rejected() {
    let trip = europe_asia_trip();
    let rules = RulesRecord {
        loc2_stopover_tag: Loc2StopoverTag::Furthest,
        tax_matching_appl_tag: TaxMatchingApplTag::from("07"),
        long_stop_threshold_hours: i64::MAX,
        ..Default::default()
    };
    let result = resolve_tax_points(&input(&trip, payment(0, 1), rules));
    assert!(matches!(
        result,
        Err(TaxPointError::InvalidInput { ref field, .. })
            if field == "rules.long_stop_threshold_hours"
    ));
}
