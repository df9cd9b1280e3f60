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

//! observer sessions.
//!
//! A [TrackingSession] owns one background task that runs the poll cycle for a (changing) observer. The
//! task exclusively owns the [TrackingCore] (and hence the tracked aircraft set) - clients feed observer
//! and interval changes in through watch channels and get the published [TrackingSnapshot]s out through
//! another one. The core itself has no notion of timers so that tests can drive it with a simulated clock

use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use pf_common::datetime::{Clock, EpochMillis};
use crate::{
    ObserverState, TrackingSnapshot, PlaneFinderConfig,
    source::{SnapshotSource, SourceSnapshot},
    tracker::Tracker,
    scheduler::{PollScheduler, clamp_poll_interval_secs},
    errors::{Result, op_failed}
};

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum SessionState {
    Idle,    // no valid observer yet
    Polling,
}

/// the poll cycle without the timer
pub struct TrackingCore<S: SnapshotSource> {
    source: Arc<S>,
    tracker: Tracker,
    scheduler: PollScheduler,
    observer: Option<ObserverState>,
    last_source: Option<(bool,String)>, // (is_live,source) of last poll
}

impl<S: SnapshotSource> TrackingCore<S> {
    pub fn new (source: Arc<S>, config: &PlaneFinderConfig)->Self {
        TrackingCore {
            source,
            tracker: Tracker::new( config.tracker.clone()),
            scheduler: PollScheduler::new( config.poll_interval),
            observer: None,
            last_source: None,
        }
    }

    pub fn state (&self)->SessionState {
        if self.scheduler.is_running() { SessionState::Polling } else { SessionState::Idle }
    }

    pub fn observer (&self)->Option<&ObserverState> { self.observer.as_ref() }
    pub fn tracker (&self)->&Tracker { &self.tracker }
    pub fn scheduler (&self)->&PollScheduler { &self.scheduler }

    /// process an observer update. Invalid or missing observers put us back to Idle (tracked aircraft are kept).
    /// A new position restarts the poll interval, a mere heading change re-publishes what we have with
    /// updated relative bearings
    pub fn set_observer (&mut self, observer: Option<ObserverState>, now: EpochMillis)->Option<Arc<TrackingSnapshot>> {
        match observer.filter( |o| o.is_valid()) {
            None => {
                if self.scheduler.stop() { debug!("abandoned poll in flight"); }
                if self.observer.take().is_some() { info!("observer lost, session idle"); }
                None
            }
            Some(new_obs) => {
                let prev = self.observer.replace( new_obs);
                match prev {
                    Some(old_obs) if old_obs.is_same_position( &new_obs) => {
                        if old_obs.heading != new_obs.heading { self.republish( now) } else { None }
                    }
                    _ => {
                        info!( observer=%new_obs, "observer position changed, polling");
                        if self.scheduler.restart( now) { debug!("abandoned poll in flight"); }
                        None
                    }
                }
            }
        }
    }

    pub fn set_poll_interval (&mut self, interval: Duration, now: EpochMillis) {
        self.scheduler.set_interval( interval, now);
        debug!( interval_secs=self.scheduler.interval().as_secs(), "poll interval set");
    }

    pub fn time_until_due (&self, now: EpochMillis)->Option<Duration> {
        self.scheduler.time_until_due( now)
    }

    /// run a poll if one is due at `now`, returning the new snapshot
    pub async fn on_tick (&mut self, now: EpochMillis)->Option<Arc<TrackingSnapshot>> {
        let observer = self.observer?;
        if !self.scheduler.tick( now) { return None }

        let source = self.source.clone();
        let snapshot = source.fetch( &observer).await;
        self.scheduler.complete();

        Some( self.apply( snapshot, &observer, now))
    }

    /// merge, sweep and publish a source snapshot that was taken at `now`
    pub fn apply (&mut self, snapshot: SourceSnapshot, observer: &ObserverState, now: EpochMillis)->Arc<TrackingSnapshot> {
        let published = self.tracker.update( &snapshot.observations, observer, now, snapshot.is_live, &snapshot.source);
        debug!( n_published=published.aircraft.len(), source=snapshot.source.as_str(), is_live=snapshot.is_live, "published snapshot");
        self.last_source = Some( (snapshot.is_live, snapshot.source));
        published
    }

    fn republish (&self, now: EpochMillis)->Option<Arc<TrackingSnapshot>> {
        let observer = self.observer.as_ref()?;
        let (is_live,source) = self.last_source.as_ref()?;
        Some( self.tracker.publish( observer, now, *is_live, source))
    }
}

/// client handle of a running observer session
pub struct TrackingSession {
    observer_tx: watch::Sender<Option<ObserverState>>,
    interval_tx: watch::Sender<Duration>,
    snapshot_rx: watch::Receiver<Option<Arc<TrackingSnapshot>>>,
    state_rx: watch::Receiver<SessionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TrackingSession {
    /// spawn the session task. This has to be called from within a tokio runtime
    pub fn start<S: SnapshotSource> (source: Arc<S>, config: &PlaneFinderConfig, clock: Arc<dyn Clock>)->Self {
        let (observer_tx, observer_rx) = watch::channel( None);
        let (interval_tx, interval_rx) = watch::channel( config.poll_interval);
        let (snapshot_tx, snapshot_rx) = watch::channel( None);
        let (state_tx, state_rx) = watch::channel( SessionState::Idle);
        let cancel = CancellationToken::new();

        let core = TrackingCore::new( source, config);
        let task = tokio::spawn( run_session( core, clock, observer_rx, interval_rx, snapshot_tx, state_tx, cancel.clone()));
        info!("tracking session started");

        TrackingSession { observer_tx, interval_tx, snapshot_rx, state_rx, cancel, task: Some(task) }
    }

    pub fn set_observer (&self, observer: ObserverState) {
        self.observer_tx.send_replace( Some(observer));
    }

    pub fn clear_observer (&self) {
        self.observer_tx.send_replace( None);
    }

    /// user facing interval setting, clamped to [1,120]s
    pub fn set_poll_interval_secs (&self, secs: f64) {
        self.interval_tx.send_replace( clamp_poll_interval_secs( secs));
    }

    pub fn subscribe (&self)->watch::Receiver<Option<Arc<TrackingSnapshot>>> {
        self.snapshot_rx.clone()
    }

    pub fn latest (&self)->Option<Arc<TrackingSnapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn state (&self)->SessionState {
        *self.state_rx.borrow()
    }

    pub fn is_running (&self)->bool {
        self.task.as_ref().map( |t| !t.is_finished()).unwrap_or(false)
    }

    /// tear down the session. A poll that is in flight is dropped without being merged
    pub async fn stop (&mut self)->Result<()> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await.map_err( |e| op_failed!("session task did not terminate: {e}"))?;
            info!("tracking session stopped");
        }
        Ok(())
    }
}

impl Drop for TrackingSession {
    fn drop (&mut self) {
        self.cancel.cancel();
    }
}

async fn run_session<S: SnapshotSource> (
    mut core: TrackingCore<S>,
    clock: Arc<dyn Clock>,
    mut observer_rx: watch::Receiver<Option<ObserverState>>,
    mut interval_rx: watch::Receiver<Duration>,
    snapshot_tx: watch::Sender<Option<Arc<TrackingSnapshot>>>,
    state_tx: watch::Sender<SessionState>,
    cancel: CancellationToken
) {
    'session: loop {
        state_tx.send_if_modified( |s| { let new_state = core.state(); if *s != new_state { *s = new_state; true } else { false } });
        let wait = core.time_until_due( clock.now());

        tokio::select! {
            _ = cancel.cancelled() => break,

            res = observer_rx.changed() => {
                if res.is_err() { break } // session handle is gone
                let observer = *observer_rx.borrow_and_update();
                if let Some(snapshot) = core.set_observer( observer, clock.now()) {
                    snapshot_tx.send_replace( Some(snapshot));
                }
            }

            res = interval_rx.changed() => {
                if res.is_err() { break }
                let interval = *interval_rx.borrow_and_update();
                core.set_poll_interval( interval, clock.now());
            }

            _ = wait_for( wait) => {
                // a poll for a position the observer has left is abandoned, heading changes are applied once it is done
                let polled = core.observer().copied();
                let mut pending_observer: Option<Option<ObserverState>> = None;
                {
                    let tick = core.on_tick( clock.now());
                    tokio::pin!( tick);

                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break 'session,

                            res = &mut tick => {
                                if let Some(snapshot) = res {
                                    snapshot_tx.send_replace( Some(snapshot));
                                }
                                break
                            }

                            res = observer_rx.changed() => {
                                if res.is_err() { break 'session }
                                let observer = *observer_rx.borrow_and_update();
                                pending_observer = Some(observer);
                                if !is_same_poll_position( polled.as_ref(), observer.as_ref()) { break } // drops the poll
                            }
                        }
                    }
                }

                if let Some(observer) = pending_observer {
                    if let Some(snapshot) = core.set_observer( observer, clock.now()) {
                        snapshot_tx.send_replace( Some(snapshot));
                    }
                }
            }
        }
    }

    debug!("session task terminated");
}

fn is_same_poll_position (polled: Option<&ObserverState>, observer: Option<&ObserverState>)->bool {
    match (polled, observer) {
        (Some(p), Some(o)) => o.is_valid() && p.is_same_position( o),
        _ => false
    }
}

async fn wait_for (dur: Option<Duration>) {
    match dur {
        Some(dur) => sleep( dur).await,
        None => std::future::pending::<()>().await
    }
}
