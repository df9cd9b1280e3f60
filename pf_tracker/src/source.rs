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

//! where observations come from.
//!
//! [LiveSource] walks an ordered list of [EndpointCandidate]s and stops at the first one that answers
//! with a usable payload. Everything that goes wrong on the way (connect errors, timeouts, non-OK status,
//! unparseable or unknown bodies) only eliminates the candidate. If there is no credential or no candidate
//! works we return a fixed demo set around the observer so that clients always have something to show

use std::{fmt, sync::Arc};
use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use tracing::{debug, info, warn, error};
use pf_common::{angle::Angle360, uom::{feet, knots}};
use crate::{
    ObserverState, RawObservation, SourceConfig, EndpointCandidate,
    normalize::normalize_body,
    errors::{Result, PfTrackerError}
};

pub const DEMO_SOURCE: &str = "demo";

/// what a single poll produced
#[derive(Debug,Clone,PartialEq)]
pub struct SourceSnapshot {
    pub observations: Vec<RawObservation>,
    pub is_live: bool,
    pub source: String, // candidate name or "demo"
}

/// something that can produce observations around an observer. Implementations never fail - the worst
/// outcome of a fetch is the demo set
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn fetch (&self, observer: &ObserverState)->SourceSnapshot;
}

/* #region upstream access *************************************************************************************/

/// the credential capability. The token itself is never logged
#[derive(Clone,PartialEq)]
pub enum UpstreamAccess {
    None,
    Token(String),
}

impl UpstreamAccess {
    /// accepts plain tokens and the `<prefix>|<token>` form, of which only the part after the pipe is used.
    /// Blank values mean we don't have a credential
    pub fn from_token (raw: &str)->Self {
        let token = match raw.split_once('|') {
            Some((_,t)) => t.trim(),
            None => raw.trim()
        };
        if token.is_empty() { UpstreamAccess::None } else { UpstreamAccess::Token( token.to_string()) }
    }

    pub fn from_env (var_name: &str)->Self {
        match std::env::var( var_name) {
            Ok(raw) => UpstreamAccess::from_token( &raw),
            Err(_) => UpstreamAccess::None
        }
    }

    pub fn token (&self)->Option<&str> {
        match self {
            UpstreamAccess::Token(t) => Some(t.as_str()),
            UpstreamAccess::None => None
        }
    }

    pub fn is_available (&self)->bool { self.token().is_some() }
}

impl fmt::Debug for UpstreamAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamAccess::None => write!( f, "UpstreamAccess::None"),
            UpstreamAccess::Token(_) => write!( f, "UpstreamAccess::Token(***)"),
        }
    }
}

/* #endregion upstream access */

/* #region demo data *******************************************************************************************/

/// three synthetic aircraft at fixed offsets from the observer
pub fn demo_observations (observer: &ObserverState)->Vec<RawObservation> {
    let pos = observer.position();

    let demo = |id: &str, d_lat: f64, d_lon: f64, alt_ft: f64, spd_kn: f64, hdg: f64, callsign: &str, ac_type: &str, reg: &str, from: &str, to: &str| {
        let p = pos.offset_degrees( d_lat, d_lon);
        RawObservation {
            id: id.to_string(),
            latitude: p.latitude,
            longitude: p.longitude,
            altitude: Some( feet(alt_ft)),
            speed: Some( knots(spd_kn)),
            heading: Some( Angle360::from_degrees(hdg)),
            callsign: Some( callsign.to_string()),
            aircraft_type: Some( ac_type.to_string()),
            registration: Some( reg.to_string()),
            origin: Some( from.to_string()),
            destination: Some( to.to_string()),
            image_url: None,
        }
    };

    vec![
        demo( "demo-1",  0.01,   0.01,  35000.0, 450.0,  90.0, "SAS123", "Airbus A320",     "SE-ABC", "ARN", "CPH"),
        demo( "demo-2", -0.02,   0.015, 28000.0, 380.0, 225.0, "NAX456", "Boeing 737-800",  "LN-XYZ", "OSL", "STO"),
        demo( "demo-3",  0.005, -0.02,  41000.0, 520.0, 180.0, "DLH789", "Airbus A350-900", "D-ADEF", "FRA", "ARN"),
    ]
}

pub fn demo_snapshot (observer: &ObserverState)->SourceSnapshot {
    SourceSnapshot { observations: demo_observations( observer), is_live: false, source: DEMO_SOURCE.to_string() }
}

/// a source that only produces demo data (what we use if there is no credential)
#[derive(Debug,Clone,Copy,Default)]
pub struct DemoSource;

#[async_trait]
impl SnapshotSource for DemoSource {
    async fn fetch (&self, observer: &ObserverState)->SourceSnapshot {
        demo_snapshot( observer)
    }
}

/* #endregion demo data */

/* #region live source *****************************************************************************************/

/// the "N,S,W,E" bounding box value used by area capable endpoints
pub fn area_bounds (observer: &ObserverState, delta_deg: f64)->String {
    let ne = observer.position().offset_degrees( delta_deg, delta_deg);
    let sw = observer.position().offset_degrees( -delta_deg, -delta_deg);
    format!("{:.4},{:.4},{:.4},{:.4}", ne.latitude, sw.latitude, sw.longitude, ne.longitude)
}

pub struct LiveSource {
    config: Arc<SourceConfig>,
    access: UpstreamAccess,
    client: Client,
}

impl LiveSource {
    pub fn new (config: Arc<SourceConfig>, access: UpstreamAccess)->Result<Self> {
        let client = Client::builder()
            .user_agent( config.user_agent.as_str())
            .build()?;

        Ok( LiveSource { config, access, client } )
    }

    /// get the credential from the environment variable named in the config
    pub fn from_config (config: Arc<SourceConfig>)->Result<Self> {
        let access = UpstreamAccess::from_env( &config.credential_env);
        if !access.is_available() {
            info!( env=config.credential_env.as_str(), "no upstream credential configured");
        }
        LiveSource::new( config, access)
    }

    pub fn config (&self)->&SourceConfig { &self.config }
    pub fn access (&self)->&UpstreamAccess { &self.access }

    async fn request (&self, candidate: &EndpointCandidate, token: &str, observer: &ObserverState, delta_deg: f64)->Result<Vec<RawObservation>> {
        let mut req = self.client.get( candidate.url.as_str())
            .timeout( self.config.timeout)
            .header( ACCEPT, "application/json");

        if candidate.authorize {
            req = req.bearer_auth( token);
        }
        for (k,v) in &candidate.headers {
            req = req.header( k.as_str(), v.as_str());
        }
        if !candidate.query.is_empty() {
            req = req.query( &candidate.query);
        }
        if let Some(param) = &candidate.area_param {
            req = req.query( &[(param.as_str(), area_bounds( observer, delta_deg))]);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err( PfTrackerError::HttpStatus( status.as_u16()))
        }

        let body = response.bytes().await?;
        normalize_body( &body, candidate.layout, observer, self.config.max_observations)
    }

    /// one candidate, including the single widened retry if the normal area was empty
    pub async fn try_candidate (&self, candidate: &EndpointCandidate, token: &str, observer: &ObserverState)->Result<Vec<RawObservation>> {
        debug!( candidate=candidate.name.as_str(), url=candidate.url.as_str(), "trying endpoint");
        let observations = self.request( candidate, token, observer, self.config.area_delta_deg).await?;

        if observations.is_empty() && candidate.area_param.is_some() {
            if let Some(widened) = self.config.widened_area_delta_deg {
                info!( candidate=candidate.name.as_str(), delta_deg=widened, "no aircraft in area, retrying with widened area");
                return self.request( candidate, token, observer, widened).await
            }
        }

        Ok(observations)
    }
}

#[async_trait]
impl SnapshotSource for LiveSource {
    async fn fetch (&self, observer: &ObserverState)->SourceSnapshot {
        let Some(token) = self.access.token() else {
            debug!("no upstream credential, using demo data");
            return demo_snapshot( observer)
        };

        for candidate in &self.config.candidates {
            match self.try_candidate( candidate, token, observer).await {
                Ok(observations) => {
                    if observations.is_empty() {
                        info!( candidate=candidate.name.as_str(), "no aircraft found, using demo data");
                        return demo_snapshot( observer)
                    }
                    info!( candidate=candidate.name.as_str(), n_aircraft=observations.len(), "received live data");
                    return SourceSnapshot { observations, is_live: true, source: candidate.name.clone() }
                }
                Err(e) => {
                    if e.is_upstream_failure() {
                        warn!( candidate=candidate.name.as_str(), error=%e, "endpoint failed");
                    } else {
                        error!( candidate=candidate.name.as_str(), error=%e, "endpoint request could not be processed");
                    }
                }
            }
        }

        warn!( n_candidates=self.config.candidates.len(), "all upstream endpoints failed, using demo data");
        demo_snapshot( observer)
    }
}

/* #endregion live source */
