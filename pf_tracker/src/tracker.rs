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

//! the rolling set of tracked aircraft

use std::{collections::HashMap, sync::Arc};
use tracing::debug;
use pf_common::{
    datetime::EpochMillis,
    geo::relative_bearing,
    uom::kilometers
};
use crate::{ObserverState, RawObservation, TrackedAircraft, RankedAircraft, TrackingSnapshot, TrackerConfig};

/// what a merge did
#[derive(Debug,Clone,Copy,Default,PartialEq,Eq)]
pub struct MergeStats {
    pub updated: usize,
    pub ignored: usize, // older than what we already have
}

/// keyed set of [TrackedAircraft]. This is owned by a single task - readers only ever see published
/// [TrackingSnapshot]s
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    aircraft: HashMap<String,TrackedAircraft>,
    dropped_list: Vec<String>, // ids removed by the last sweep
    is_live_origin: Option<bool>, // live or demo origin of what we currently track
}

impl Tracker {
    pub fn new (config: TrackerConfig)->Self {
        Tracker { config, aircraft: HashMap::new(), dropped_list: Vec::new(), is_live_origin: None }
    }

    pub fn config (&self)->&TrackerConfig { &self.config }
    pub fn len (&self)->usize { self.aircraft.len() }
    pub fn is_empty (&self)->bool { self.aircraft.is_empty() }
    pub fn get (&self, id: &str)->Option<&TrackedAircraft> { self.aircraft.get(id) }
    pub fn contains (&self, id: &str)->bool { self.aircraft.contains_key(id) }
    pub fn dropped_list (&self)->&[String] { self.dropped_list.as_slice() }
    pub fn is_live_origin (&self)->Option<bool> { self.is_live_origin }

    pub fn clear (&mut self) {
        self.aircraft.clear();
        self.dropped_list.clear();
        self.is_live_origin = None;
    }

    /// upsert observations taken at `observed_at`, computing distance and bearing wrt. the current observer.
    /// Entries that were already seen at a later time are not overwritten
    pub fn merge (&mut self, observations: &[RawObservation], observer: &ObserverState, observed_at: EpochMillis)->MergeStats {
        let obs_pos = observer.position();
        let mut stats = MergeStats::default();

        for o in observations {
            if let Some(existing) = self.aircraft.get( o.id.as_str()) {
                if existing.last_seen > observed_at {
                    stats.ignored += 1;
                    continue;
                }
            }

            let pos = o.position();
            let ac = TrackedAircraft {
                observation: o.clone(),
                distance: obs_pos.distance_to( &pos),
                bearing: obs_pos.bearing_to( &pos),
                last_seen: observed_at,
            };
            self.aircraft.insert( o.id.clone(), ac);
            stats.updated += 1;
        }

        debug!( updated=stats.updated, ignored=stats.ignored, tracked=self.aircraft.len(), "merged observations");
        stats
    }

    /// remove everything that was not seen within the stale timeout or is out of range
    pub fn sweep (&mut self, now: EpochMillis)->usize {
        let max_age = self.config.stale_timeout;
        let max_dist = kilometers( self.config.range_limit_km);

        self.dropped_list.clear();
        for (id,ac) in &self.aircraft {
            if now.duration_since( ac.last_seen) > max_age || ac.distance > max_dist {
                self.dropped_list.push( id.clone());
            }
        }

        for id in &self.dropped_list {
            self.aircraft.remove( id.as_str());
        }

        let n_dropped = self.dropped_list.len();
        if n_dropped > 0 {
            debug!( dropped=n_dropped, tracked=self.aircraft.len(), "swept tracked aircraft");
        }
        n_dropped
    }

    /// the current view: closest first (ties by id), at most `max_published` entries
    pub fn ranked (&self, observer: &ObserverState, now: EpochMillis)->Vec<RankedAircraft> {
        let mut list: Vec<&TrackedAircraft> = self.aircraft.values().collect();
        list.sort_by( |a,b| a.distance.value.total_cmp( &b.distance.value).then_with( || a.id().cmp( b.id())));
        list.truncate( self.config.max_published);

        list.into_iter().map( |ac| {
            RankedAircraft {
                aircraft: ac.clone(),
                relative_bearing: relative_bearing( ac.bearing, observer.heading),
                stale: now.duration_since( ac.last_seen) > self.config.stale_display_after,
            }
        }).collect()
    }

    pub fn publish (&self, observer: &ObserverState, now: EpochMillis, is_live_data: bool, source: &str)->Arc<TrackingSnapshot> {
        Arc::new( TrackingSnapshot {
            aircraft: self.ranked( observer, now),
            is_live_data,
            source: source.to_string(),
            last_updated_at: now,
        })
    }

    /// the complete merge step of a poll cycle. Live and demo aircraft are never tracked at the same time,
    /// switching between them drops whatever the other origin left behind
    pub fn update (&mut self, observations: &[RawObservation], observer: &ObserverState, now: EpochMillis, is_live_data: bool, source: &str)->Arc<TrackingSnapshot> {
        if self.is_live_origin.is_some_and( |is_live| is_live != is_live_data) {
            debug!( dropped=self.aircraft.len(), is_live=is_live_data, source, "data origin changed, dropping tracked aircraft");
            self.clear();
        }
        self.is_live_origin = Some(is_live_data);

        self.merge( observations, observer, now);
        self.sweep( now);
        self.publish( observer, now, is_live_data, source)
    }
}
