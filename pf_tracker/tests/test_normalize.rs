/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

use serde_json::json;
use uom::si::{length::foot, velocity::knot};
use pf_tracker::{
    ObserverState, RawObservation,
    normalize::{PositionalLayout, normalize_payload, normalize_body},
    errors::PfTrackerError
};

/// payload normalization tests
/// run with "cargo test --test test_normalize -- --nocapture"

fn stockholm ()->ObserverState { ObserverState::new( 59.3293, 18.0686, 0.0) }

fn find<'a> (list: &'a [RawObservation], id: &str)->&'a RawObservation {
    list.iter().find( |o| o.id == id).unwrap()
}

#[test]
fn test_fr24_zone_payload() {
    let payload = json!({
        "full_count": 12345,
        "version": 4,
        "2f1a": ["4CA1B2", 59.35, 18.10, 270, 35000, 450, "1234", "F-ESSA1", "A320", "SE-ROA", 1700000000, "ARN", "CPH", "SK123", 0, 0, "SAS123", 0, "SAS"],
        "2f1b": ["", 59.30, 18.00, 90, 12000, 250, "", "", "B738", "LN-NOA", 1700000000, "OSL", "ARN", "DY4321", 0, 0, "", 0, "NAX"],
        "2f1c": ["BAD", "N/A", 18.0, 0, 0, 0],
        "stats": { "total": { "ads-b": 10 } }
    });

    let list = normalize_payload( &payload, PositionalLayout::Fr24Feed, &stockholm(), 10).unwrap();
    for o in &list { println!("{o}"); }
    assert_eq!( list.len(), 2);
    assert_eq!( list[0].id, "4CA1B2"); // nearest first

    let a = find( &list, "4CA1B2");
    assert_eq!( a.callsign.as_deref(), Some("SAS123"));
    assert_eq!( a.aircraft_type.as_deref(), Some("A320"));
    assert_eq!( a.registration.as_deref(), Some("SE-ROA"));
    assert_eq!( a.origin.as_deref(), Some("ARN"));
    assert_eq!( a.destination.as_deref(), Some("CPH"));
    assert!( (a.altitude.unwrap().get::<foot>() - 35000.0).abs() < 1e-6);
    assert!( (a.speed.unwrap().get::<knot>() - 450.0).abs() < 1e-6);
    assert_eq!( a.heading.unwrap().degrees(), 270.0);

    let b = find( &list, "2f1b"); // no id in record -> entry key
    assert_eq!( b.callsign.as_deref(), Some("DY4321")); // no callsign -> flight number
}

#[test]
fn test_object_list_with_placeholders() {
    let payload = json!({
        "aircraft": [
            { "hex": "abc123", "lat": "59.36", "lon": 18.07, "alt": "N/A", "call": "-", "gspeed": "420", "track": "181.5", "type": "" },
            { "icao": "nullisland", "lat": 0, "lon": 0 },
            { "id": "onobserver", "lat": 59.3293, "lon": 18.0686 },
            { "id": "nolat", "lon": 18.1 },
            { "lat": 59.4, "longitude": 18.2, "registration": "SE-RSA" }
        ]
    });

    let list = normalize_payload( &payload, PositionalLayout::Fr24Feed, &stockholm(), 10).unwrap();
    assert_eq!( list.len(), 2);

    let a = find( &list, "abc123");
    assert!( a.altitude.is_none());
    assert!( a.callsign.is_none());
    assert!( a.aircraft_type.is_none());
    assert!( (a.speed.unwrap().get::<knot>() - 420.0).abs() < 1e-6);
    assert_eq!( a.heading.unwrap().degrees(), 181.5);

    let b = find( &list, "aircraft-4"); // synthesized from list index
    assert_eq!( b.registration.as_deref(), Some("SE-RSA"));
}

#[test]
fn test_mixed_top_level_array() {
    let payload = json!([
        { "hex": "abc123", "latitude": 59.36, "lng": 18.07 },
        [ "def456", 59.31, 18.05 ],
        42
    ]);

    let list = normalize_payload( &payload, PositionalLayout::Fr24Feed, &stockholm(), 10).unwrap();
    assert_eq!( list.len(), 2);
    assert_eq!( list[0].id, "def456");
    assert_eq!( list[1].id, "abc123");
    assert!( list[0].altitude.is_none());
}

#[test]
fn test_opensky_states() {
    let payload = json!({
        "time": 1700000000,
        "states": [
            ["4b1805", "SWR123  ", "Switzerland", 1700000000, 1700000000, 18.1, 59.4, 10000.0, false, 200.0, 90.0, 0.0, null, 10100.0, "1000", false, 0],
            ["4b1806", "", "Switzerland", 1700000000, 1700000000, null, null, null, true, 0.0, 0.0, 0.0, null, null, null, false, 0]
        ]
    });

    let list = normalize_payload( &payload, PositionalLayout::Fr24Feed, &stockholm(), 10).unwrap();
    assert_eq!( list.len(), 1);

    let a = &list[0];
    assert_eq!( a.id, "4b1805");
    assert_eq!( a.callsign.as_deref(), Some("SWR123"));
    assert_eq!( a.latitude, 59.4);
    assert_eq!( a.longitude, 18.1);
    assert!( (a.altitude.unwrap().get::<foot>() - 32808.4).abs() < 0.1);
    assert!( (a.speed.unwrap().get::<knot>() - 388.77).abs() < 0.01);
}

#[test]
fn test_nearest_cap() {
    let records: Vec<_> = (0..15).rev().map( |i| {
        json!({ "id": format!("ac-{i}"), "lat": 59.3293 + 0.01 * (i+1) as f64, "lon": 18.0686 })
    }).collect();
    let payload = json!({ "data": records });

    let list = normalize_payload( &payload, PositionalLayout::Fr24Feed, &stockholm(), 10).unwrap();
    let ids: Vec<&str> = list.iter().map( |o| o.id.as_str()).collect();
    let expected: Vec<String> = (0..10).map( |i| format!("ac-{i}")).collect();
    assert_eq!( ids, expected);
}

#[test]
fn test_unusable_bodies() {
    let observer = stockholm();

    match normalize_body( b"<html>bad gateway</html>", PositionalLayout::Fr24Feed, &observer, 10) {
        Err(PfTrackerError::SerdeError(_)) => {}
        other => panic!("expected JSON error, got {other:?}")
    }
    match normalize_body( br#"{"message":"invalid token"}"#, PositionalLayout::Fr24Feed, &observer, 10) {
        Err(PfTrackerError::UnknownPayload(_)) => {}
        other => panic!("expected unknown payload, got {other:?}")
    }

    // error reports with an ok status are not an empty aircraft list
    match normalize_body( br#"{"errors":["rate limit exceeded"]}"#, PositionalLayout::Fr24Feed, &observer, 10) {
        Err(PfTrackerError::UnknownPayload(_)) => {}
        other => panic!("expected unknown payload, got {other:?}")
    }

    // known shape without aircraft is a valid (empty) result
    let list = normalize_body( br#"{"full_count":0,"version":4}"#, PositionalLayout::Fr24Feed, &observer, 10).unwrap();
    assert!( list.is_empty());
}
