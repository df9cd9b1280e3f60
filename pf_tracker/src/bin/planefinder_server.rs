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

use std::{net::SocketAddr, sync::Arc};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use pf_tracker::{PlaneFinderConfig, load_planefinder_config, source::LiveSource, service};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "serve aircraft around a given position as JSON over HTTP")]
pub struct Args {
    /// socket address to listen on
    #[arg(short,long, default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,

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

    let source = Arc::new( LiveSource::from_config( Arc::new( config.source))?);
    service::serve( args.addr, source).await?;

    Ok(())
}
