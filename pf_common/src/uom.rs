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

//! unit-of-measure constructors and serde helpers for the units that aviation data comes in.
//! Our wire formats are feet for altitude, knots for speed and kilometers for observer distance

use uom::si::{
    f64::{Length,Velocity},
    length::{foot,meter,kilometer},
    velocity::{knot,meter_per_second}
};
use serde::{Serialize,Deserialize,ser::Serializer,de::Deserializer};

#[inline] pub fn feet (len: f64)->Length { Length::new::<foot>(len) }
#[inline] pub fn meters (len: f64)->Length { Length::new::<meter>(len) }
#[inline] pub fn kilometers (len: f64)->Length { Length::new::<kilometer>(len) }

#[inline] pub fn knots (v: f64)->Velocity { Velocity::new::<knot>(v) }
#[inline] pub fn meters_per_second (v: f64)->Velocity { Velocity::new::<meter_per_second>(v) }

//--- serialization support

pub fn ser_length_as_km<S: Serializer> (length: &Length, s: S) -> Result<S::Ok, S::Error>  {
    s.serialize_f64( length.get::<kilometer>())
}

pub fn de_length_from_km <'a,D>(deserializer: D) -> Result<Length,D::Error> where D: Deserializer<'a> {
    let v: f64 = f64::deserialize(deserializer)?;
    Ok( kilometers(v) )
}

/// NOTE - use with #[serde(skip_serializing_if="pf_common::is_none")] if unknown values should be omitted
pub fn ser_opt_length_as_feet<S: Serializer> (length: &Option<Length>, s: S) -> Result<S::Ok, S::Error>  {
    match length {
        Some(len) => s.serialize_some( &len.get::<foot>().round()),
        None => s.serialize_none()
    }
}

pub fn de_opt_length_from_feet <'a,D>(deserializer: D) -> Result<Option<Length>,D::Error> where D: Deserializer<'a> {
    let v: Option<f64> = Option::deserialize(deserializer)?;
    Ok( v.map( feet) )
}

pub fn ser_opt_velocity_as_knots<S: Serializer> (v: &Option<Velocity>, s: S) -> Result<S::Ok, S::Error>  {
    match v {
        Some(v) => s.serialize_some( &v.get::<knot>()),
        None => s.serialize_none()
    }
}

pub fn de_opt_velocity_from_knots <'a,D>(deserializer: D) -> Result<Option<Velocity>,D::Error> where D: Deserializer<'a> {
    let v: Option<f64> = Option::deserialize(deserializer)?;
    Ok( v.map( knots) )
}
