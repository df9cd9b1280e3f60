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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,PfTrackerError>;

#[derive(Error,Debug)]
pub enum PfTrackerError {

    #[error("parse error {0}")]
    ParseError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("reqwest error {0}")]
    ReqwestError( #[from] reqwest::Error),

    #[error("http status {0}")]
    HttpStatus(u16),

    #[error("JSON error {0}")]
    SerdeError( #[from] serde_json::Error),

    #[error("unknown payload {0}")]
    UnknownPayload(String),

    #[error("config RON error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

impl PfTrackerError {
    /// upstream failures only eliminate a candidate, they are never fatal for a poll
    pub fn is_upstream_failure (&self)->bool {
        matches!( self, PfTrackerError::ReqwestError(_) | PfTrackerError::HttpStatus(_) | PfTrackerError::SerdeError(_) | PfTrackerError::UnknownPayload(_))
    }
}

macro_rules! parse_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::PfTrackerError::ParseError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use parse_error;

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::PfTrackerError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;
