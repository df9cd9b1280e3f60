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

use std::{fmt, ops, sync::{Arc, atomic::{AtomicI64, Ordering}}, time::Duration};
use chrono::{DateTime, Utc};
use serde::{Serialize,Deserialize,Serializer,Deserializer};
use parse_duration::parse;

/// milliseconds since the unix epoch. This is what we use for all time stamps that get compared
/// (last-seen, staleness) since it is cheap to copy and to serialize
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub struct EpochMillis(i64);

impl EpochMillis {
    pub fn now ()->Self { EpochMillis( Utc::now().timestamp_millis()) }

    pub fn new (millis:i64)->Self { EpochMillis(millis) }

    pub fn millis (&self)->i64 { self.0 }

    /// saturating elapsed time since `earlier`
    pub fn duration_since (&self, earlier: EpochMillis)->Duration {
        let dt = self.0 - earlier.0;
        if dt > 0 { Duration::from_millis( dt as u64) } else { Duration::ZERO }
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0)
        }
    }
}

impl ops::Add<Duration> for EpochMillis {
    type Output = EpochMillis;
    fn add (self, rhs: Duration)->EpochMillis { EpochMillis( self.0 + rhs.as_millis() as i64) }
}

impl ops::Sub<Duration> for EpochMillis {
    type Output = EpochMillis;
    fn sub (self, rhs: Duration)->EpochMillis { EpochMillis( self.0 - rhs.as_millis() as i64) }
}

#[inline] pub fn millis (n: u64)->Duration { Duration::from_millis(n) }
#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }

/* #region clocks ************************************************************************************************/

/// abstraction for where "now" comes from. Everything that evicts or schedules based on time takes a Clock
/// so that we can drive it from tests without real sleeps
pub trait Clock: Send + Sync + 'static {
    fn now (&self)->EpochMillis;
}

/// the wall clock
#[derive(Debug,Clone,Copy,Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now (&self)->EpochMillis { EpochMillis::now() }
}

/// a manually advanced clock. Clones share the same time so that a test can keep one handle and
/// move time forward while the code under test holds another
#[derive(Debug,Clone)]
pub struct SimClock {
    millis: Arc<AtomicI64>
}

impl SimClock {
    pub fn new (start: EpochMillis)->Self {
        SimClock { millis: Arc::new( AtomicI64::new( start.millis())) }
    }

    pub fn set (&self, t: EpochMillis) {
        self.millis.store( t.millis(), Ordering::Relaxed);
    }

    pub fn advance (&self, dur: Duration)->EpochMillis {
        let dt = dur.as_millis() as i64;
        EpochMillis::new( self.millis.fetch_add( dt, Ordering::Relaxed) + dt)
    }
}

impl Clock for SimClock {
    fn now (&self)->EpochMillis { EpochMillis::new( self.millis.load( Ordering::Relaxed)) }
}

/* #endregion clocks */

//--- serde support for human readable durations in configs ("10s", "500ms", "1min")

pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> Result<S::Ok, S::Error>  {
    let dfm = format!("{:?}", dur);
    s.serialize_str(&dfm)
}
