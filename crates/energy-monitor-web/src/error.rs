// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Energy Monitor.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use energy_monitor_core::{MonitorError, SourceError};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Error returned by every JSON endpoint
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        let message = err.to_string();
        match err {
            MonitorError::MissingParameter(_) | MonitorError::InvalidParameter(_) => {
                Self::BadRequest(message)
            }
            MonitorError::EntityNotFound(_) => Self::NotFound(message),
            MonitorError::Source(SourceError::Unavailable(_)) => Self::ServiceUnavailable(message),
            MonitorError::Source(SourceError::Failed(_)) => Self::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(message) => error!("❌ [API] {}", message),
            Self::ServiceUnavailable(message) => warn!("⚠️ [API] {}", message),
            Self::BadRequest(message) | Self::NotFound(message) => {
                debug!("[API] {} {}", status.as_u16(), message);
            }
        }

        let body = json!({
            "success": false,
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
