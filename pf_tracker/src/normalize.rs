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

//! turning whatever an upstream provider sends into [RawObservation]s.
//!
//! We don't get to choose the payload format - depending on the endpoint we see lists of objects,
//! lists of positional arrays (FR24 feed records, OpenSky state vectors) or objects keyed by some
//! provider id. Each response is first classified into a [Payload] shape and then normalized with the
//! matching extractor. Fields that are missing or hold placeholders stay unknown (`None`)

use serde::{Serialize,Deserialize};
use serde_json::{Map, Value};
use uom::si::f64::{Length,Velocity};
use pf_common::{
    angle::Angle360,
    geo::{GeoPos, distance_km},
    uom::{feet, meters, knots, meters_per_second}
};
use crate::{RawObservation, ObserverState, errors::{Result, PfTrackerError}};

/// how to interpret array records
#[derive(Deserialize,Serialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
pub enum PositionalLayout {
    /// `[id, lat, lon, track, alt_ft, speed_kt, squawk, radar, type, reg, time, from, to, flight, on_ground, vspeed, callsign, ..]`
    #[default]
    Fr24Feed,

    /// `[icao24, callsign, origin_country, time_position, last_contact, lon, lat, baro_alt_m, on_ground, velocity_ms, true_track, ..]`
    OpenSky,
}

impl PositionalLayout {
    /// (latitude,longitude) indices of array records
    pub fn lat_lon_indices (&self)->(usize,usize) {
        match self {
            PositionalLayout::Fr24Feed => (1,2),
            PositionalLayout::OpenSky => (6,5),
        }
    }
}

/// top level keys of keyed (FR24 zone) payloads that are not aircraft
const BOOKKEEPING_KEYS: [&str;3] = ["full_count", "version", "stats"];

/// the recognized payload shapes
#[derive(Debug)]
pub enum Payload<'a> {
    /// `[..]`, `{"aircraft":[..]}` or `{"data":[..]}` - elements are objects or positional arrays
    List(&'a [Value]),

    /// `{"states":[..]}` - OpenSky state vectors
    StateVectors(&'a [Value]),

    /// `{"<key>": <object|array>, ..}` - entry keys are fallback ids
    Keyed(Vec<(&'a str, &'a Value)>),
}

impl<'a> Payload<'a> {
    pub fn shape_name (&self)->&'static str {
        match self {
            Payload::List(_) => "list",
            Payload::StateVectors(_) => "state-vectors",
            Payload::Keyed(_) => "keyed",
        }
    }

    pub fn len (&self)->usize {
        match self {
            Payload::List(a) | Payload::StateVectors(a) => a.len(),
            Payload::Keyed(v) => v.len()
        }
    }
}

/// find out what kind of payload we got, failing if it isn't any of the known shapes.
/// The layout decides which array values of keyed payloads count as aircraft entries
pub fn classify (value: &Value, layout: PositionalLayout)->Result<Payload<'_>> {
    match value {
        Value::Array(list) => Ok( Payload::List( list.as_slice())),
        Value::Object(map) => {
            if let Some(Value::Array(list)) = map.get("aircraft") { return Ok( Payload::List( list.as_slice())) }
            if let Some(Value::Array(list)) = map.get("data") { return Ok( Payload::List( list.as_slice())) }
            match map.get("states") {
                Some(Value::Array(list)) => return Ok( Payload::StateVectors( list.as_slice())),
                Some(Value::Null) => return Ok( Payload::StateVectors( &[])), // OpenSky reports "nothing in area" as null
                _ => {}
            }

            let entries: Vec<(&str,&Value)> = map.iter()
                .filter( |(k,v)| !BOOKKEEPING_KEYS.contains( &k.as_str()) && is_entry( v, layout))
                .map( |(k,v)| (k.as_str(), v))
                .collect();

            if entries.is_empty() && !map.keys().any( |k| BOOKKEEPING_KEYS.contains( &k.as_str())) {
                Err( PfTrackerError::UnknownPayload( format!("object without aircraft entries: {:?}", map.keys().take(8).collect::<Vec<_>>())))
            } else {
                Ok( Payload::Keyed(entries))
            }
        }
        other => Err( PfTrackerError::UnknownPayload( format!("top level {}", json_type_name(other))))
    }
}

/// arrays and objects that carry numeric coordinates
fn is_entry (v: &Value, layout: PositionalLayout)->bool {
    match v {
        Value::Array(a) => {
            let (i_lat,i_lon) = layout.lat_lon_indices();
            a.get(i_lat).and_then( opt_f64).is_some() && a.get(i_lon).and_then( opt_f64).is_some()
        }
        Value::Object(o) => {
            find_field( o, LAT_KEYS).and_then( opt_f64).is_some() && find_field( o, LON_KEYS).and_then( opt_f64).is_some()
        }
        _ => false
    }
}

fn json_type_name (v: &Value)->&'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// parse, classify and normalize a response body. This only fails if the body is not JSON or
/// has an unknown shape - individual records that can't be used are silently skipped
pub fn normalize_body (body: &[u8], layout: PositionalLayout, observer: &ObserverState, max_observations: usize)->Result<Vec<RawObservation>> {
    let value: Value = serde_json::from_slice( body)?;
    normalize_payload( &value, layout, observer, max_observations)
}

pub fn normalize_payload (value: &Value, layout: PositionalLayout, observer: &ObserverState, max_observations: usize)->Result<Vec<RawObservation>> {
    let payload = classify( value, layout)?;
    let observations = extract_observations( &payload, layout);
    Ok( select_nearest( observations, observer, max_observations))
}

/// all records of a payload that have a position (validity not yet checked)
pub fn extract_observations (payload: &Payload, layout: PositionalLayout)->Vec<RawObservation> {
    match payload {
        Payload::List(list) => {
            list.iter().enumerate().filter_map( |(i,v)| extract_entry( v, None, i, layout)).collect()
        }
        Payload::StateVectors(list) => {
            list.iter().enumerate().filter_map( |(i,v)| extract_entry( v, None, i, PositionalLayout::OpenSky)).collect()
        }
        Payload::Keyed(entries) => {
            entries.iter().enumerate().filter_map( |(i,(k,v))| extract_entry( v, Some(k), i, layout)).collect()
        }
    }
}

fn extract_entry (v: &Value, key: Option<&str>, idx: usize, layout: PositionalLayout)->Option<RawObservation> {
    match v {
        Value::Object(o) => from_object( o, key, idx),
        Value::Array(a) => from_positional( a.as_slice(), key, idx, layout),
        _ => None
    }
}

/// drop observations we can't place and keep the `max` ones closest to the observer (stable wrt. input order)
pub fn select_nearest (observations: Vec<RawObservation>, observer: &ObserverState, max: usize)->Vec<RawObservation> {
    let obs_pos = observer.position();
    let mut list: Vec<(f64,RawObservation)> = observations.into_iter()
        .filter( |o| is_usable_position( &o.position(), &obs_pos))
        .map( |o| (distance_km( &obs_pos, &o.position()), o))
        .collect();

    list.sort_by( |a,b| a.0.total_cmp( &b.0));
    list.truncate( max);
    list.into_iter().map( |(_,o)| o).collect()
}

/// a position we can use: valid ranges, not (0,0) and not exactly where the observer is
/// (which is the typical result of a field extraction that fell back to the request coordinates)
pub fn is_usable_position (pos: &GeoPos, observer: &GeoPos)->bool {
    pos.is_valid() && !pos.is_null_island() && pos != observer
}

/* #region field extraction ***********************************************************************************/

const ID_KEYS: &[&str] = &["hex", "icao", "icao24", "fr24_id", "id"];
const LAT_KEYS: &[&str] = &["lat", "latitude"];
const LON_KEYS: &[&str] = &["lon", "lng", "longitude"];
const ALT_KEYS: &[&str] = &["alt", "altitude"];
const SPD_KEYS: &[&str] = &["spd", "speed", "gspeed"];
const HDG_KEYS: &[&str] = &["hdg", "heading", "track"];
const CALLSIGN_KEYS: &[&str] = &["call", "callsign", "flight"];
const TYPE_KEYS: &[&str] = &["aircraft_type", "type", "aircraft"];
const REG_KEYS: &[&str] = &["reg", "registration"];
const ORIGIN_KEYS: &[&str] = &["from", "origin", "orig_iata"];
const DEST_KEYS: &[&str] = &["to", "destination", "dest_iata"];
const IMAGE_KEYS: &[&str] = &["image", "image_url"];

fn is_placeholder (s: &str)->bool {
    s.is_empty() || s == "-" || s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("null")
}

/// first alias that has a value that isn't a placeholder
fn find_field<'a> (o: &'a Map<String,Value>, keys: &[&str])->Option<&'a Value> {
    keys.iter().filter_map( |k| o.get(*k)).find( |v| !is_unknown(v))
}

fn is_unknown (v: &Value)->bool {
    match v {
        Value::Null => true,
        Value::String(s) => is_placeholder( s.trim()),
        _ => false
    }
}

/// numbers and numeric strings
pub fn opt_f64 (v: &Value)->Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if is_placeholder(s) { None } else { s.parse::<f64>().ok() }
        }
        _ => None
    };
    x.filter( |x| x.is_finite())
}

/// strings and numbers (ids are sometimes numeric)
pub fn opt_string (v: &Value)->Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            if is_placeholder(s) { None } else { Some(s.to_string()) }
        }
        Value::Number(n) => Some( n.to_string()),
        _ => None
    }
}

fn fallback_id (key: Option<&str>, idx: usize)->String {
    match key {
        Some(k) if !is_placeholder(k.trim()) => k.trim().to_string(),
        _ => format!("aircraft-{idx}")
    }
}

fn from_object (o: &Map<String,Value>, key: Option<&str>, idx: usize)->Option<RawObservation> {
    let latitude = find_field( o, LAT_KEYS).and_then( opt_f64)?;
    let longitude = find_field( o, LON_KEYS).and_then( opt_f64)?;
    let id = find_field( o, ID_KEYS).and_then( opt_string).unwrap_or_else( || fallback_id( key, idx));

    let str_field = |keys: &[&str]| find_field( o, keys).and_then( opt_string);

    Some( RawObservation {
        id,
        latitude,
        longitude,
        altitude: find_field( o, ALT_KEYS).and_then( opt_f64).map( feet),
        speed: find_field( o, SPD_KEYS).and_then( opt_f64).map( knots),
        heading: find_field( o, HDG_KEYS).and_then( opt_f64).map( Angle360::from_degrees),
        callsign: str_field( CALLSIGN_KEYS),
        aircraft_type: str_field( TYPE_KEYS),
        registration: str_field( REG_KEYS),
        origin: str_field( ORIGIN_KEYS),
        destination: str_field( DEST_KEYS),
        image_url: str_field( IMAGE_KEYS),
    })
}

fn from_positional (a: &[Value], key: Option<&str>, idx: usize, layout: PositionalLayout)->Option<RawObservation> {
    let num = |i: usize| a.get(i).and_then( opt_f64);
    let string = |i: usize| a.get(i).and_then( opt_string);

    match layout {
        PositionalLayout::Fr24Feed => {
            Some( RawObservation {
                id: string(0).unwrap_or_else( || fallback_id( key, idx)),
                latitude: num(1)?,
                longitude: num(2)?,
                heading: num(3).map( Angle360::from_degrees),
                altitude: num(4).map( feet),
                speed: num(5).map( knots),
                aircraft_type: string(8),
                registration: string(9),
                origin: string(11),
                destination: string(12),
                callsign: string(16).or_else( || string(13)),
                image_url: None,
            })
        }
        PositionalLayout::OpenSky => {
            Some( RawObservation {
                id: string(0).unwrap_or_else( || fallback_id( key, idx)),
                callsign: string(1),
                longitude: num(5)?,
                latitude: num(6)?,
                altitude: num(7).map( meters),
                speed: num(9).map( meters_per_second),
                heading: num(10).map( Angle360::from_degrees),
                aircraft_type: None,
                registration: None,
                origin: None,
                destination: None,
                image_url: None,
            })
        }
    }
}

/* #endregion field extraction */
