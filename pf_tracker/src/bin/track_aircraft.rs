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

use std::sync::Arc;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use pf_common::datetime::SystemClock;
use pf_tracker::{
    ObserverState, PlaneFinderConfig, load_planefinder_config,
    source::LiveSource,
    session::TrackingSession
};

/// terminal monitor that tracks aircraft around a fixed position until Ctrl-C
#[derive(Parser, Debug)]
#[command(version, about, long_about = "print ranked aircraft around an observer position")]
pub struct Args {
    /// observer latitude in degrees
    #[arg(long, allow_hyphen_values=true)]
    pub lat: f64,

    /// observer longitude in degrees
    #[arg(long, allow_hyphen_values=true)]
    pub lon: f64,

    /// direction the observer is facing in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values=true)]
    pub heading: f64,

    /// poll interval in seconds [1..120]
    #[arg(short,long)]
    pub interval: Option<f64>,

    /// RON config file (built-in defaults if not set)
    #[arg(short,long)]
    pub config: Option<String>,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_planefinder_config( path)?,
        None => PlaneFinderConfig::default()
    };

    let observer = ObserverState::new( args.lat, args.lon, args.heading);
    if !observer.is_valid() {
        anyhow::bail!("invalid observer position {}", observer.position());
    }

    let source = Arc::new( LiveSource::from_config( Arc::new( config.source.clone()))?);
    let mut session = TrackingSession::start( source, &config, Arc::new(SystemClock));
    if let Some(secs) = args.interval {
        session.set_poll_interval_secs( secs);
    }
    session.set_observer( observer);

    let mut rx = session.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            res = rx.changed() => {
                if res.is_err() { break }
                if let Some(snapshot) = rx.borrow_and_update().clone() {
                    print!("{snapshot}");
                }
            }
        }
    }

    session.stop().await?;
    Ok(())
}
