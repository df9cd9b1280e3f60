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

use anyhow::Result;
use pf_common::datetime::secs;
use pf_tracker::{PlaneFinderConfig, load_planefinder_config, load_config, normalize::PositionalLayout, errors::PfTrackerError};

/// checks that the shipped config parses and agrees with the built-in defaults
/// run with "cargo test --test test_config"

#[test]
fn test_shipped_config()->Result<()> {
    let config = load_planefinder_config( "configs/planefinder.ron")?;
    let defaults = PlaneFinderConfig::default();

    assert_eq!( config.poll_interval, secs(10));
    assert_eq!( config.source.timeout, defaults.source.timeout);
    assert_eq!( config.source.credential_env, defaults.source.credential_env);
    assert_eq!( config.source.max_observations, 10);
    assert_eq!( config.source.widened_area_delta_deg, Some(1.0));
    assert_eq!( config.tracker.stale_timeout, defaults.tracker.stale_timeout);
    assert_eq!( config.tracker.stale_display_after, secs(30));
    assert_eq!( config.tracker.range_limit_km, 100.0);

    let names: Vec<&str> = config.source.candidates.iter().map( |c| c.name.as_str()).collect();
    let default_names: Vec<&str> = defaults.source.candidates.iter().map( |c| c.name.as_str()).collect();
    assert_eq!( names, default_names);

    let first = &config.source.candidates[0];
    assert_eq!( first.headers, vec![("API-Version".to_string(), "v1".to_string())]);
    assert_eq!( first.layout, PositionalLayout::Fr24Feed);
    assert_eq!( config.source.candidates[2].query.len(), defaults.source.candidates[2].query.len());
    Ok(())
}

#[test]
fn test_missing_config() {
    match load_planefinder_config( "configs/does_not_exist.ron") {
        Err(PfTrackerError::IOError(_)) => {}
        other => panic!("expected IO error, got {other:?}")
    }
}

#[test]
fn test_invalid_values()->Result<()> {
    let dir = std::env::temp_dir();

    let path = dir.join("pf_test_bad_url.ron");
    let mut config = PlaneFinderConfig::default();
    config.source.candidates[0].url = "not a url".to_string();
    std::fs::write( &path, ron::ser::to_string( &config)?)?;
    assert!( matches!( load_planefinder_config( &path), Err(PfTrackerError::ParseError(_))));

    let path = dir.join("pf_test_bad_range.ron");
    let mut config = PlaneFinderConfig::default();
    config.tracker.range_limit_km = 0.0;
    std::fs::write( &path, ron::ser::to_string( &config)?)?;
    assert!( matches!( load_planefinder_config( &path), Err(PfTrackerError::ConfigError(_))));
    Ok(())
}
