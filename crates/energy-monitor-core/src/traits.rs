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

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{EntityState, RecordedState};
use crate::window::TimeWindow;

// ============= Data Source Traits =============

/// Errors reported by a state registry or history recorder
#[derive(Error, Debug)]
pub enum SourceError {
    /// The backing subsystem is not running or not reachable
    #[error("{0} is not available")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only view of the current entity states
#[async_trait]
pub trait StateRegistry: Send + Sync {
    /// Snapshot of every entity currently known
    async fn all_states(&self) -> SourceResult<Vec<EntityState>>;

    /// Current state of one entity, `None` if the registry does not know it
    async fn get_state(&self, entity_id: &str) -> SourceResult<Option<EntityState>>;

    /// Name for logs and health output
    fn name(&self) -> &str;

    /// Whether the registry currently answers
    async fn is_healthy(&self) -> bool {
        self.all_states().await.is_ok()
    }
}

/// Historical state queries
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    /// Whether the recorder can currently answer queries
    async fn is_available(&self) -> bool;

    /// Recorded state changes for each entity within the window.
    /// Entities without any recorded change may be missing from the map.
    async fn significant_states(
        &self,
        entity_ids: &[String],
        window: &TimeWindow,
    ) -> SourceResult<HashMap<String, Vec<RecordedState>>>;

    fn name(&self) -> &str;
}
