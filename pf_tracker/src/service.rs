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

//! stateless HTTP access to the snapshot source:
//!
//!    POST /api/aircraft   {"latitude":<deg>,"longitude":<deg>} -> {"aircraft":[..],"isLiveData":<bool>,"source":<name>}
//!    GET  /api/health     -> "ok"
//!
//! Requests without usable coordinates get a `400` with an `{"error":<msg>}` body. Upstream problems are
//! never reported to the client - they show up as demo data (`isLiveData: false`)

use std::{net::SocketAddr, sync::Arc};
use axum::{
    Router, Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Serialize,Deserialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info};
use crate::{
    ObserverState, RawObservation,
    source::SnapshotSource,
    errors::Result
};

#[derive(Deserialize,Debug)]
#[serde(rename_all="camelCase")]
pub struct AircraftRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Serialize,Deserialize,Debug)]
#[serde(rename_all="camelCase")]
pub struct AircraftResponse {
    pub aircraft: Vec<RawObservation>,
    pub is_live_data: bool,
    pub source: String,
}

/// client errors, rendered as `400 {"error":..}`
#[derive(Debug)]
pub struct BadRequest(String);

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json( json!({"error": self.0}))).into_response()
    }
}

#[derive(Clone)]
struct ServiceState {
    source: Arc<dyn SnapshotSource>,
}

pub fn router (source: Arc<dyn SnapshotSource>)->Router {
    Router::new()
        .route( "/api/aircraft", post( aircraft_handler))
        .route( "/api/health", get( health_handler))
        .with_state( ServiceState { source })
}

/// run the service on `addr` until the process ends
pub async fn serve (addr: SocketAddr, source: Arc<dyn SnapshotSource>)->Result<()> {
    let listener = TcpListener::bind( addr).await?;
    info!( addr=%listener.local_addr()?, "serving aircraft requests");
    axum::serve( listener, router( source)).await?;
    Ok(())
}

fn parse_observer (body: &[u8])->std::result::Result<ObserverState,BadRequest> {
    let req: AircraftRequest = serde_json::from_slice( body).map_err( |e| BadRequest( format!("invalid request body: {e}")))?;

    match (req.latitude, req.longitude) {
        (Some(latitude), Some(longitude)) => {
            let observer = ObserverState::new( latitude, longitude, 0.0);
            if observer.is_valid() { Ok(observer) } else { Err( BadRequest("coordinates out of range".into())) }
        }
        _ => Err( BadRequest("latitude and longitude are required".into()))
    }
}

async fn aircraft_handler (State(state): State<ServiceState>, body: Bytes)->std::result::Result<Json<AircraftResponse>,BadRequest> {
    let observer = parse_observer( &body)?;
    debug!( %observer, "aircraft request");

    let snapshot = state.source.fetch( &observer).await;
    Ok( Json( AircraftResponse { aircraft: snapshot.observations, is_live_data: snapshot.is_live, source: snapshot.source }))
}

async fn health_handler ()->&'static str {
    "ok"
}
