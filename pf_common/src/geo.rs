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
#![allow(unused,uncommon_codepoints,non_snake_case)]

//! spherical geodesy for short range observer/target relations (mean earth sphere, haversine)

use std::fmt;
use serde::{Serialize,Deserialize};
use uom::si::f64::Length;
use uom::si::length::kilometer;

use crate::{sin, sin2, cos, atan2, sqrt, deg, rad};
use crate::angle::{Angle360, normalize_180};
use crate::geo_constants::MEAN_EARTH_RADIUS_KM;

/// a geodetic position in degrees (latitude first, as in all of our upstream data)
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct GeoPos {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPos {
    pub fn from_lat_lon_degrees (latitude: f64, longitude: f64)->Self {
        GeoPos { latitude, longitude }
    }

    /// finite and inside of the [-90,90] / [-180,180] ranges
    pub fn is_valid (&self)->bool {
        self.latitude.is_finite() && self.longitude.is_finite()
            && self.latitude >= -90.0 && self.latitude <= 90.0
            && self.longitude >= -180.0 && self.longitude <= 180.0
    }

    /// exactly (0,0) - which in our context is almost always a failed field extraction
    pub fn is_null_island (&self)->bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// position shifted by fixed degree offsets (longitude wraps around the antimeridian, latitude is clamped)
    pub fn offset_degrees (&self, d_lat: f64, d_lon: f64)->GeoPos {
        GeoPos {
            latitude: (self.latitude + d_lat).clamp( -90.0, 90.0),
            longitude: normalize_180( self.longitude + d_lon)
        }
    }

    pub fn distance_to (&self, other: &GeoPos)->Length {
        Length::new::<kilometer>( distance_km( self, other))
    }

    pub fn bearing_to (&self, other: &GeoPos)->Angle360 {
        initial_bearing( self, other)
    }
}

impl fmt::Display for GeoPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.5},{:.5}]", self.latitude, self.longitude)
    }
}

/// great circle distance in km on the mean earth sphere (haversine formula).
/// Symmetric and exactly 0.0 for identical positions
pub fn distance_km (from: &GeoPos, to: &GeoPos)->f64 {
    if from == to { return 0.0 }

    let φ1 = rad(from.latitude);
    let φ2 = rad(to.latitude);
    let Δφ = rad(to.latitude - from.latitude);
    let Δλ = rad(to.longitude - from.longitude);

    let a = (sin2(Δφ / 2.0) + cos(φ1) * cos(φ2) * sin2(Δλ / 2.0)).min(1.0); // rounding can exceed 1 for antipodes
    let c = 2.0 * atan2( sqrt(a), sqrt(1.0 - a));

    MEAN_EARTH_RADIUS_KM * c
}

/// forward azimuth from `from` to `to`, normalized to [0,360).
/// The bearing between identical positions is mathematically undefined - we return 0
pub fn initial_bearing (from: &GeoPos, to: &GeoPos)->Angle360 {
    if from == to { return Angle360::ZERO }

    let φ1 = rad(from.latitude);
    let φ2 = rad(to.latitude);
    let Δλ = rad(to.longitude - from.longitude);

    let y = sin(Δλ) * cos(φ2);
    let x = cos(φ1) * sin(φ2) - sin(φ1) * cos(φ2) * cos(Δλ);

    Angle360::from_degrees( deg( atan2(y, x)))
}

/// bearing as seen by an observer who is facing `heading` (0 means straight ahead)
#[inline]
pub fn relative_bearing (bearing: Angle360, heading: Angle360)->Angle360 {
    bearing - heading
}
