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

use std::{fmt, ops};
use serde::{Serialize,Deserialize,Serializer,Deserializer};

#[inline]
pub fn normalize_180 (d: f64) -> f64 {
    let x = d % 360.0;

    if x < -180.0 { 360.0 + x }
    else if x > 180.0 { x - 360.0 }
    else { x }
}

/// map degrees into [0,360). Note that tiny negative inputs would round up to 360.0, which we fold back to 0
#[inline]
pub fn normalize_360 (d: f64) -> f64 {
    let x = d % 360.0;
    let x = if x < 0.0 { 360.0 + x } else { x };
    if x >= 360.0 { 0.0 } else { x }
}

/// a full circle angle (heading, bearing) that is always kept in [0,360) degrees.
/// Non-finite input is mapped to 0 so that we never propagate NaN into rankings or displays
#[derive(Clone,Copy,PartialEq,PartialOrd,Default)]
pub struct Angle360(f64);

impl Angle360 {
    pub const ZERO: Angle360 = Angle360(0.0);

    #[inline]
    pub fn from_degrees (deg: f64)->Self {
        if deg.is_finite() { Angle360( normalize_360(deg)) } else { Angle360::ZERO }
    }

    #[inline] pub fn degrees (&self)->f64 { self.0 }
    #[inline] pub fn radians (&self)->f64 { self.0.to_radians() }
}

impl fmt::Display for Angle360 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.0}°", self.0) }
}

impl fmt::Debug for Angle360 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Angle360({})", self.0) }
}

impl From<Angle360> for f64 {
    fn from (a: Angle360)->Self { a.0 }
}

// addition and subtraction wrap around
impl ops::Add<Angle360> for Angle360 {
    type Output = Self;
    fn add (self,rhs:Angle360) -> Self::Output { Angle360::from_degrees( self.0 + rhs.0) }
}
impl ops::Sub<Angle360> for Angle360 {
    type Output = Self;
    fn sub (self,rhs:Angle360) -> Self::Output { Angle360::from_degrees( self.0 - rhs.0) }
}

//--- serde support (plain degrees)

impl Serialize for Angle360 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Angle360 {
    fn deserialize<D>(deserializer: D) -> Result<Angle360, D::Error> where D: Deserializer<'de> {
        let deg = f64::deserialize(deserializer)?;
        Ok( Angle360::from_degrees(deg) )
    }
}
