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

use thiserror::Error;

use crate::traits::SourceError;

/// Request level failures of the lister, lookup and history operations
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{0} parameter is required")]
    MissingParameter(&'static str),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("Entity {0} not found")]
    EntityNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
