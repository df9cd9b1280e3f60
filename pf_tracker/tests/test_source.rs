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

use std::{collections::HashMap, net::SocketAddr, sync::{Arc, atomic::{AtomicUsize, Ordering}}};
use anyhow::Result;
use axum::{Router, Json, extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::get};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use pf_common::datetime::{millis, secs};
use pf_tracker::{
    ObserverState, SourceConfig, EndpointCandidate,
    normalize::PositionalLayout,
    source::{LiveSource, SnapshotSource, UpstreamAccess, demo_observations, DEMO_SOURCE}
};

/// candidate fallback tests against an in-process mock provider
/// run with "cargo test --test test_source -- --nocapture"

const TOKEN: &str = "test-token";

#[derive(Clone,Default)]
struct MockState {
    n_requests: Arc<AtomicUsize>,
}

fn aircraft_near (lat: f64, lon: f64)->Value {
    json!({ "aircraft": [
        { "hex": "abc123", "lat": lat + 0.02, "lon": lon, "call": "TEST1" },
        { "hex": "def456", "lat": lat - 0.03, "lon": lon + 0.01, "call": "TEST2" }
    ]})
}

/// "N,S,W,E" -> (center lat, center lon, half size)
fn parse_bounds (q: &HashMap<String,String>)->Option<(f64,f64,f64)> {
    let v: Vec<f64> = q.get("bounds")?.split(',').filter_map( |s| s.parse().ok()).collect();
    if v.len() != 4 { return None }
    Some( ((v[0]+v[1])/2.0, (v[2]+v[3])/2.0, (v[0]-v[1])/2.0) )
}

async fn spawn_mock_server ()->Result<(SocketAddr,MockState)> {
    let state = MockState::default();

    let app = Router::new()
        .route( "/error", get( |State(s): State<MockState>| async move {
            s.n_requests.fetch_add( 1, Ordering::SeqCst);
            StatusCode::INTERNAL_SERVER_ERROR
        }))
        .route( "/slow", get( |State(s): State<MockState>| async move {
            s.n_requests.fetch_add( 1, Ordering::SeqCst);
            tokio::time::sleep( secs(5)).await;
            Json( json!({"aircraft": []}))
        }))
        .route( "/rate_limited", get( |State(s): State<MockState>| async move {
            s.n_requests.fetch_add( 1, Ordering::SeqCst);
            Json( json!({"errors": ["rate limit exceeded"]}))
        }))
        .route( "/garbage", get( |State(s): State<MockState>| async move {
            s.n_requests.fetch_add( 1, Ordering::SeqCst);
            "<html>not what you expected</html>"
        }))
        .route( "/ok", get( |State(s): State<MockState>, Query(q): Query<HashMap<String,String>>| async move {
            s.n_requests.fetch_add( 1, Ordering::SeqCst);
            match parse_bounds( &q) {
                Some((lat,lon,_)) => (StatusCode::OK, Json( aircraft_near( lat, lon))),
                None => (StatusCode::BAD_REQUEST, Json( json!({"error": "no bounds"})))
            }
        }))
        .route( "/authorized", get( |State(s): State<MockState>, headers: HeaderMap, Query(q): Query<HashMap<String,String>>| async move {
            s.n_requests.fetch_add( 1, Ordering::SeqCst);
            let auth_ok = headers.get("authorization").and_then( |v| v.to_str().ok()) == Some("Bearer test-token");
            let version_ok = headers.get("api-version").and_then( |v| v.to_str().ok()) == Some("v1");
            let agent_ok = headers.get("user-agent").and_then( |v| v.to_str().ok()) == Some("PlaneFinder/1.0");
            match parse_bounds( &q) {
                Some((lat,lon,_)) if auth_ok && version_ok && agent_ok => (StatusCode::OK, Json( aircraft_near( lat, lon))),
                _ => (StatusCode::UNAUTHORIZED, Json( json!({"error": "unauthorized"})))
            }
        }))
        .route( "/sparse", get( |State(s): State<MockState>, Query(q): Query<HashMap<String,String>>| async move {
            s.n_requests.fetch_add( 1, Ordering::SeqCst);
            match parse_bounds( &q) {
                Some((lat,lon,half)) if half > 0.5 => Json( aircraft_near( lat, lon)),
                _ => Json( json!({"full_count": 0, "version": 4}))
            }
        }))
        .with_state( state.clone());

    let listener = TcpListener::bind( "127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn( async move { axum::serve( listener, app).await });

    Ok( (addr,state) )
}

fn candidate (addr: &SocketAddr, path: &str)->EndpointCandidate {
    EndpointCandidate {
        name: path.to_string(),
        url: format!("http://{addr}/{path}"),
        query: vec![],
        headers: vec![],
        area_param: Some("bounds".to_string()),
        authorize: true,
        layout: PositionalLayout::Fr24Feed,
    }
}

fn source_config (candidates: Vec<EndpointCandidate>)->Arc<SourceConfig> {
    Arc::new( SourceConfig {
        timeout: millis(500),
        candidates,
        ..SourceConfig::default()
    })
}

fn stockholm ()->ObserverState { ObserverState::new( 59.3293, 18.0686, 0.0) }

#[tokio::test]
async fn test_fallback_to_next_candidate()->Result<()> {
    let (addr,mock) = spawn_mock_server().await?;
    let config = source_config( vec![ candidate( &addr, "error"), candidate( &addr, "garbage"), candidate( &addr, "ok") ]);
    let source = LiveSource::new( config, UpstreamAccess::from_token( TOKEN))?;

    let snapshot = source.fetch( &stockholm()).await;
    println!("{snapshot:?}");
    assert!( snapshot.is_live);
    assert_eq!( snapshot.source, "ok");
    assert_eq!( snapshot.observations.len(), 2);
    assert_eq!( snapshot.observations[0].id, "abc123"); // nearest first
    assert_eq!( mock.n_requests.load( Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_error_report_with_ok_status()->Result<()> {
    let (addr,mock) = spawn_mock_server().await?;
    let config = source_config( vec![ candidate( &addr, "rate_limited"), candidate( &addr, "ok") ]);
    let source = LiveSource::new( config, UpstreamAccess::from_token( TOKEN))?;

    let snapshot = source.fetch( &stockholm()).await;
    assert!( snapshot.is_live);
    assert_eq!( snapshot.source, "ok");
    assert_eq!( snapshot.observations.len(), 2);
    assert_eq!( mock.n_requests.load( Ordering::SeqCst), 2); // no widened retry on the error report
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_not_fatal()->Result<()> {
    let (addr,_mock) = spawn_mock_server().await?;
    let config = source_config( vec![ candidate( &addr, "slow"), candidate( &addr, "ok") ]);
    let source = LiveSource::new( config, UpstreamAccess::from_token( TOKEN))?;

    let t = std::time::Instant::now();
    let snapshot = source.fetch( &stockholm()).await;
    assert!( t.elapsed() < secs(3));
    assert!( snapshot.is_live);
    assert_eq!( snapshot.source, "ok");
    Ok(())
}

#[tokio::test]
async fn test_request_headers()->Result<()> {
    let (addr,_mock) = spawn_mock_server().await?;
    let mut cand = candidate( &addr, "authorized");
    cand.headers.push( ("API-Version".to_string(), "v1".to_string()));
    let source = LiveSource::new( source_config( vec![cand]), UpstreamAccess::from_token( "1234|test-token"))?;

    let snapshot = source.fetch( &stockholm()).await;
    assert!( snapshot.is_live);
    assert_eq!( snapshot.source, "authorized");
    Ok(())
}

#[tokio::test]
async fn test_all_candidates_fail()->Result<()> {
    let (addr,_mock) = spawn_mock_server().await?;
    let config = source_config( vec![ candidate( &addr, "error"), candidate( &addr, "garbage"), candidate( &addr, "nonexistent") ]);
    let source = LiveSource::new( config, UpstreamAccess::from_token( TOKEN))?;
    let observer = stockholm();

    let snapshot = source.fetch( &observer).await;
    assert!( !snapshot.is_live);
    assert_eq!( snapshot.source, DEMO_SOURCE);
    assert!( !snapshot.observations.is_empty());
    assert_eq!( snapshot.observations, demo_observations( &observer));

    let d1 = &snapshot.observations[0];
    assert!( (d1.latitude - (observer.latitude + 0.01)).abs() < 1e-9);
    assert!( (d1.longitude - (observer.longitude + 0.01)).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_no_credential()->Result<()> {
    let (addr,mock) = spawn_mock_server().await?;
    let source = LiveSource::new( source_config( vec![ candidate( &addr, "ok") ]), UpstreamAccess::from_token( "  "))?;

    let snapshot = source.fetch( &stockholm()).await;
    assert!( !snapshot.is_live);
    assert_eq!( snapshot.observations.len(), 3);
    assert_eq!( mock.n_requests.load( Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_provider()->Result<()> {
    // nobody listens on a port we just released
    let addr = { let l = TcpListener::bind( "127.0.0.1:0").await?; l.local_addr()? };
    let source = LiveSource::new( source_config( vec![ candidate( &addr, "ok") ]), UpstreamAccess::from_token( TOKEN))?;

    let snapshot = source.fetch( &stockholm()).await;
    assert!( !snapshot.is_live);
    assert_eq!( snapshot.source, DEMO_SOURCE);
    Ok(())
}

#[tokio::test]
async fn test_widened_retry()->Result<()> {
    let (addr,mock) = spawn_mock_server().await?;
    let source = LiveSource::new( source_config( vec![ candidate( &addr, "sparse") ]), UpstreamAccess::from_token( TOKEN))?;

    let snapshot = source.fetch( &stockholm()).await;
    assert!( snapshot.is_live);
    assert_eq!( snapshot.observations.len(), 2);
    assert_eq!( mock.n_requests.load( Ordering::SeqCst), 2);

    // no widened area configured: an empty area ends up as demo data
    let config = Arc::new( SourceConfig { widened_area_delta_deg: None, ..source_config( vec![ candidate( &addr, "sparse") ]).as_ref().clone() });
    let source = LiveSource::new( config, UpstreamAccess::from_token( TOKEN))?;
    let snapshot = source.fetch( &stockholm()).await;
    assert!( !snapshot.is_live);
    assert_eq!( mock.n_requests.load( Ordering::SeqCst), 3);
    Ok(())
}
