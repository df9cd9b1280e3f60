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

//! live aircraft tracking relative to a (moving) observer.
//!
//! Upstream flight position providers are polled through an ordered list of candidate endpoints
//! ([source]), their heterogeneous payloads get normalized into [RawObservation]s ([normalize]),
//! and a rolling [tracker::Tracker] set turns successive snapshots into a stable, ranked
//! [TrackingSnapshot] that is published to display clients ([session], [service]).

use std::{fmt, path::Path, time::Duration};
use serde::{Serialize,Deserialize};
use uom::si::{f64::{Length,Velocity}, length::{foot,kilometer}, velocity::knot};
use pf_common::{
    angle::Angle360,
    datetime::{EpochMillis, deserialize_duration, serialize_duration, secs},
    geo::GeoPos,
    uom::{ser_length_as_km, de_length_from_km, ser_opt_length_as_feet, de_opt_length_from_feet, ser_opt_velocity_as_knots, de_opt_velocity_from_knots}
};

pub mod errors;
use errors::{Result, PfTrackerError, parse_error};

pub mod normalize;
use normalize::PositionalLayout;

pub mod source;
pub mod tracker;
pub mod scheduler;
pub mod session;
pub mod service;

/* #region data model ******************************************************************************************/

/// where the user is and which way the device is pointing. Owned by the positioning collaborator,
/// read-only for everything in here
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct ObserverState {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, rename="headingDegrees")]
    pub heading: Angle360,
}

impl ObserverState {
    pub fn new (latitude: f64, longitude: f64, heading_deg: f64)->Self {
        ObserverState { latitude, longitude, heading: Angle360::from_degrees( heading_deg) }
    }

    pub fn position (&self)->GeoPos { GeoPos::from_lat_lon_degrees( self.latitude, self.longitude) }

    pub fn is_valid (&self)->bool { self.position().is_valid() }

    /// same place (heading changes alone do not require a new poll)
    pub fn is_same_position (&self, other: &ObserverState)->bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

impl fmt::Display for ObserverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "Observer( pos: {}, hdg: {} )", self.position(), self.heading)
    }
}

/// provider agnostic aircraft record as extracted from one upstream payload.
/// Everything except id and coordinates is optional - `None` means "unknown", not zero
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct RawObservation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,

    #[serde(default, serialize_with="ser_opt_length_as_feet", deserialize_with="de_opt_length_from_feet", skip_serializing_if="pf_common::is_none")]
    pub altitude: Option<Length>,

    #[serde(default, rename="speedKnots", serialize_with="ser_opt_velocity_as_knots", deserialize_with="de_opt_velocity_from_knots", skip_serializing_if="pf_common::is_none")]
    pub speed: Option<Velocity>,

    #[serde(default, rename="headingDegrees", skip_serializing_if="pf_common::is_none")]
    pub heading: Option<Angle360>,

    #[serde(default, skip_serializing_if="pf_common::is_none")]
    pub callsign: Option<String>,

    #[serde(default, skip_serializing_if="pf_common::is_none")]
    pub aircraft_type: Option<String>,

    #[serde(default, skip_serializing_if="pf_common::is_none")]
    pub registration: Option<String>,

    #[serde(default, skip_serializing_if="pf_common::is_none")]
    pub origin: Option<String>,

    #[serde(default, skip_serializing_if="pf_common::is_none")]
    pub destination: Option<String>,

    #[serde(default, skip_serializing_if="pf_common::is_none")]
    pub image_url: Option<String>,
}

impl RawObservation {
    /// an observation that only knows where it is
    pub fn new (id: impl ToString, latitude: f64, longitude: f64)->Self {
        RawObservation {
            id: id.to_string(),
            latitude,
            longitude,
            altitude: None,
            speed: None,
            heading: None,
            callsign: None,
            aircraft_type: None,
            registration: None,
            origin: None,
            destination: None,
            image_url: None,
        }
    }

    pub fn position (&self)->GeoPos { GeoPos::from_lat_lon_degrees( self.latitude, self.longitude) }
}

impl fmt::Display for RawObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "Observation( id: {}", self.id)?;
        if let Some(cs) = &self.callsign { write!( f, ", cs: \"{cs}\"")?; }
        write!( f, ", pos: {}", self.position())?;
        if let Some(alt) = self.altitude { write!( f, ", alt: {:.0}", alt.get::<foot>())?; }
        if let Some(spd) = self.speed { write!( f, ", spd: {:.0}", spd.get::<knot>())?; }
        if let Some(hdg) = self.heading { write!( f, ", hdg: {:.0}", hdg.degrees())?; }
        if let Some(t) = &self.aircraft_type { write!( f, ", type: {t}")?; }
        write!( f, " )")
    }
}

/// a [RawObservation] augmented with its relation to the observer at the time it was last seen
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct TrackedAircraft {
    #[serde(flatten)]
    pub observation: RawObservation,

    #[serde(rename="distanceKm", serialize_with="ser_length_as_km", deserialize_with="de_length_from_km")]
    pub distance: Length,

    #[serde(rename="bearingDegrees")]
    pub bearing: Angle360,

    #[serde(rename="lastSeenAt")]
    pub last_seen: EpochMillis,
}

impl TrackedAircraft {
    pub fn id (&self)->&str { self.observation.id.as_str() }

    pub fn distance_km (&self)->f64 { self.distance.get::<kilometer>() }
}

impl fmt::Display for TrackedAircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "{:<10} {:>7.1}km {:>4.0}°",
            self.observation.callsign.as_deref().unwrap_or( self.observation.id.as_str()),
            self.distance_km(), self.bearing.degrees())?;
        if let Some(alt) = self.observation.altitude { write!( f, " {:>6.0}ft", alt.get::<foot>())?; }
        if let Some(t) = &self.observation.aircraft_type { write!( f, " {t}")?; }
        Ok(())
    }
}

/// one entry of the published view: the tracked aircraft plus what a compass display needs
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct RankedAircraft {
    #[serde(flatten)]
    pub aircraft: TrackedAircraft,

    /// bearing relative to the observer heading at publication time
    #[serde(rename="relativeBearingDegrees")]
    pub relative_bearing: Angle360,

    /// not refreshed for a while, but not yet evicted
    pub stale: bool,
}

/// the immutable, display ready result of a poll cycle
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct TrackingSnapshot {
    pub aircraft: Vec<RankedAircraft>,
    pub is_live_data: bool,
    pub source: String,
    pub last_updated_at: EpochMillis,
}

impl TrackingSnapshot {
    pub fn ids (&self)->Vec<&str> { self.aircraft.iter().map( |a| a.aircraft.id()).collect() }
}

impl fmt::Display for TrackingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!( f, "--- {} aircraft from {} ({}) at {}",
            self.aircraft.len(), self.source, if self.is_live_data {"live"} else {"demo"}, self.last_updated_at)?;
        for a in &self.aircraft {
            writeln!( f, "  {}{}", a.aircraft, if a.stale {" (stale)"} else {""})?;
        }
        Ok(())
    }
}

/* #endregion data model */

/* #region configuration ***************************************************************************************/

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct PlaneFinderConfig {
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub poll_interval: Duration, // clamped to [1,120]s when used

    pub source: SourceConfig,
    pub tracker: TrackerConfig,
}

impl Default for PlaneFinderConfig {
    fn default()->Self {
        PlaneFinderConfig { poll_interval: secs(10), source: SourceConfig::default(), tracker: TrackerConfig::default() }
    }
}

/// how to reach upstream providers
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct SourceConfig {
    pub credential_env: String, // name of the env var that holds the provider token (never the token itself)
    pub user_agent: String,

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub timeout: Duration, // per candidate request

    pub max_observations: usize, // per poll
    pub area_delta_deg: f64, // half-size of the requested bounding box
    pub widened_area_delta_deg: Option<f64>, // for one retry if the first area had no aircraft

    pub candidates: Vec<EndpointCandidate>, // in order of preference
}

impl Default for SourceConfig {
    fn default()->Self {
        let bounds = Some("bounds".to_string());
        SourceConfig {
            credential_env: "FR24_API_TOKEN".into(),
            user_agent: "PlaneFinder/1.0".into(),
            timeout: secs(8),
            max_observations: 10,
            area_delta_deg: 0.1,
            widened_area_delta_deg: Some(1.0),
            candidates: vec![
                EndpointCandidate {
                    name: "fr24-live-positions".into(),
                    url: "https://fr24api.flightradar24.com/api/live/flight-positions/light".into(),
                    query: vec![],
                    headers: vec![ ("API-Version".into(), "v1".into()) ],
                    area_param: bounds.clone(),
                    authorize: true,
                    layout: PositionalLayout::Fr24Feed,
                },
                EndpointCandidate {
                    name: "fr24-zones".into(),
                    url: "https://api.flightradar24.com/v1/zones/fcgi".into(),
                    query: vec![],
                    headers: vec![],
                    area_param: bounds.clone(),
                    authorize: true,
                    layout: PositionalLayout::Fr24Feed,
                },
                EndpointCandidate {
                    name: "fr24-data-live".into(),
                    url: "https://data-live.flightradar24.com/zones/fcgi".into(),
                    query: ["faa","satellite","mlat","flarm","adsb","gnd","air","vehicles","estimated","gliders","stats"].iter()
                        .map( |k| (k.to_string(), "1".to_string()))
                        .chain( std::iter::once( ("maxage".to_string(), "14400".to_string())))
                        .collect(),
                    headers: vec![],
                    area_param: bounds.clone(),
                    authorize: true,
                    layout: PositionalLayout::Fr24Feed,
                },
                EndpointCandidate {
                    name: "fr24-aircraft".into(),
                    url: "https://api.flightradar24.com/v2/aircraft".into(),
                    query: vec![],
                    headers: vec![],
                    area_param: bounds,
                    authorize: true,
                    layout: PositionalLayout::Fr24Feed,
                },
            ]
        }
    }
}

/// one upstream endpoint to try
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct EndpointCandidate {
    pub name: String,
    pub url: String,

    #[serde(default)]
    pub query: Vec<(String,String)>, // static query parameters

    #[serde(default)]
    pub headers: Vec<(String,String)>, // static request headers

    #[serde(default)]
    pub area_param: Option<String>, // query parameter for "N,S,W,E" bounds. None: endpoint is not area capable

    #[serde(default)]
    pub authorize: bool, // send bearer token if we have one

    #[serde(default)]
    pub layout: PositionalLayout, // how to read positional (array) records
}

/// parameters of the rolling tracking set
#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct TrackerConfig {
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub stale_timeout: Duration, // evict if not seen for longer

    pub range_limit_km: f64, // evict if further away

    pub max_published: usize, // top-N of published view

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub stale_display_after: Duration, // flag as stale (but keep) if not seen for longer
}

impl Default for TrackerConfig {
    fn default()->Self {
        TrackerConfig {
            stale_timeout: secs(60),
            range_limit_km: 100.0,
            max_published: 10,
            stale_display_after: secs(30),
        }
    }
}

/// load a RON config from a file path
pub fn load_config<C,P> (path: P)->Result<C> where C: for <'a> Deserialize<'a>, P: AsRef<Path> {
    let data = std::fs::read( path.as_ref())?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

/// load the main config and check the values we can't express in types
pub fn load_planefinder_config<P: AsRef<Path>> (path: P)->Result<PlaneFinderConfig> {
    let config: PlaneFinderConfig = load_config( path)?;

    if config.source.max_observations == 0 {
        return Err( PfTrackerError::ConfigError("source.max_observations has to be > 0".into()))
    }
    if !(config.tracker.range_limit_km > 0.0) {
        return Err( PfTrackerError::ConfigError("tracker.range_limit_km has to be > 0".into()))
    }
    if config.tracker.max_published == 0 {
        return Err( PfTrackerError::ConfigError("tracker.max_published has to be > 0".into()))
    }
    for c in &config.source.candidates {
        reqwest::Url::parse( &c.url).map_err( |e| parse_error!("invalid url '{}' of candidate {}: {e}", c.url, c.name))?;
    }

    Ok(config)
}

/* #endregion configuration */
