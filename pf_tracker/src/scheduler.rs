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

//! pure poll timing logic. This does not own any timer - the session task asks it if a poll is due and
//! tells it when a poll is done, which means tests can drive it with arbitrary (simulated) times

use std::time::Duration;
use pf_common::datetime::{EpochMillis, secs};

pub const MIN_POLL_INTERVAL_SECS: u64 = 1;
pub const MAX_POLL_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// poll interval from user supplied seconds, clamped to [1,120]. Non-finite input gets the default
pub fn clamp_poll_interval_secs (s: f64)->Duration {
    if !s.is_finite() {
        secs( DEFAULT_POLL_INTERVAL_SECS)
    } else {
        let s = s.round().clamp( MIN_POLL_INTERVAL_SECS as f64, MAX_POLL_INTERVAL_SECS as f64);
        secs( s as u64)
    }
}

pub fn clamp_poll_interval (d: Duration)->Duration {
    d.clamp( secs( MIN_POLL_INTERVAL_SECS), secs( MAX_POLL_INTERVAL_SECS))
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum SchedulerState {
    Stopped,
    Waiting { next_due: EpochMillis },
    InFlight { next_due: EpochMillis },
}

/// fixed interval poll scheduler with at most one poll in flight. Ticks that fall into a running
/// poll are skipped, not queued
#[derive(Debug)]
pub struct PollScheduler {
    interval: Duration,
    next_due: Option<EpochMillis>,
    last_fired: Option<EpochMillis>,
    in_flight: bool,
    n_skipped: usize,
}

impl PollScheduler {
    pub fn new (interval: Duration)->Self {
        PollScheduler { interval: clamp_poll_interval(interval), next_due: None, last_fired: None, in_flight: false, n_skipped: 0 }
    }

    pub fn interval (&self)->Duration { self.interval }
    pub fn is_running (&self)->bool { self.next_due.is_some() }
    pub fn is_in_flight (&self)->bool { self.in_flight }
    pub fn n_skipped (&self)->usize { self.n_skipped }

    pub fn state (&self)->SchedulerState {
        match self.next_due {
            None => SchedulerState::Stopped,
            Some(next_due) => if self.in_flight { SchedulerState::InFlight{next_due} } else { SchedulerState::Waiting{next_due} }
        }
    }

    /// start polling, first poll is due immediately
    pub fn start (&mut self, now: EpochMillis) {
        self.next_due = Some(now);
    }

    /// stop polling. Returns true if this abandoned a poll in flight (whose result has to be discarded)
    pub fn stop (&mut self)->bool {
        let abandoned = self.in_flight;
        self.next_due = None;
        self.last_fired = None;
        self.in_flight = false;
        abandoned
    }

    /// stop and start again (e.g. because the observer moved), polling immediately
    pub fn restart (&mut self, now: EpochMillis)->bool {
        let abandoned = self.stop();
        self.start(now);
        abandoned
    }

    /// change the interval. If we already polled the next poll is rescheduled relative to the last one
    pub fn set_interval (&mut self, interval: Duration, now: EpochMillis) {
        self.interval = clamp_poll_interval(interval);
        if let (Some(_), Some(last_fired)) = (self.next_due, self.last_fired) {
            self.next_due = Some( last_fired + self.interval);
        }
    }

    /// check if a poll is due at `now`. If so the poll is marked in flight and the next one is scheduled
    pub fn tick (&mut self, now: EpochMillis)->bool {
        match self.next_due {
            Some(next_due) if now >= next_due => {
                if self.in_flight {
                    self.n_skipped += 1;
                    false
                } else {
                    self.in_flight = true;
                    self.last_fired = Some(now);
                    self.next_due = Some( now + self.interval);
                    true
                }
            }
            _ => false
        }
    }

    /// the poll that was started by the last successful [tick](Self::tick) is done
    pub fn complete (&mut self) {
        self.in_flight = false;
    }

    /// how long to wait for the next due poll (None if we are stopped)
    pub fn time_until_due (&self, now: EpochMillis)->Option<Duration> {
        self.next_due.map( |next_due| next_due.duration_since( now))
    }
}
