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

//! In-process registry and recorder, used for local runs and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::traits::{HistoryRecorder, SourceError, SourceResult, StateRegistry};
use crate::types::{EntityState, RecordedState};
use crate::window::TimeWindow;

/// Entity states kept in memory, keyed by entity id
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    states: RwLock<BTreeMap<String, EntityState>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states(states: impl IntoIterator<Item = EntityState>) -> Self {
        let registry = Self::new();
        for state in states {
            registry.upsert(state);
        }
        registry
    }

    /// Insert or replace the state of an entity
    pub fn upsert(&self, state: EntityState) {
        self.states.write().insert(state.entity_id.clone(), state);
    }

    pub fn remove(&self, entity_id: &str) -> Option<EntityState> {
        self.states.write().remove(entity_id)
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[async_trait]
impl StateRegistry for InMemoryRegistry {
    async fn all_states(&self) -> SourceResult<Vec<EntityState>> {
        Ok(self.states.read().values().cloned().collect())
    }

    async fn get_state(&self, entity_id: &str) -> SourceResult<Option<EntityState>> {
        Ok(self.states.read().get(entity_id).cloned())
    }

    fn name(&self) -> &str {
        "in-memory registry"
    }
}

/// Recorded states kept in memory, in insertion order per entity
#[derive(Debug)]
pub struct InMemoryRecorder {
    history: RwLock<HashMap<String, Vec<RecordedState>>>,
    available: AtomicBool,
}

impl Default for InMemoryRecorder {
    fn default() -> Self {
        Self {
            history: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entity_id: impl Into<String>, state: RecordedState) {
        self.history
            .write()
            .entry(entity_id.into())
            .or_default()
            .push(state);
    }

    /// Simulate the recorder going down or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }
}

#[async_trait]
impl HistoryRecorder for InMemoryRecorder {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    async fn significant_states(
        &self,
        entity_ids: &[String],
        window: &TimeWindow,
    ) -> SourceResult<HashMap<String, Vec<RecordedState>>> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(SourceError::Unavailable("Recorder".to_owned()));
        }

        let history = self.history.read();
        Ok(entity_ids
            .iter()
            .filter_map(|entity_id| {
                let states: Vec<_> = history
                    .get(entity_id)?
                    .iter()
                    .filter(|state| window.contains(state.last_changed))
                    .cloned()
                    .collect();
                Some((entity_id.clone(), states))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "in-memory recorder"
    }
}
