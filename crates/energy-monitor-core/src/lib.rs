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

pub mod constants;
pub mod entities;
pub mod error;
pub mod history;
pub mod memory;
pub mod settings;
pub mod state;
pub mod statistics;
pub mod traits;
pub mod types;
pub mod validation;
pub mod window;

pub use entities::{EnergySensor, list_energy_sensors};
pub use error::{MonitorError, MonitorResult};
pub use history::{EntityHistory, HistoryReport, HistoryRequest, fetch_history};
pub use memory::{InMemoryRecorder, InMemoryRegistry};
pub use settings::{ApiSettings, FilterPolicy};
pub use state::{StateLookup, lookup_state};
pub use statistics::Statistics;
pub use traits::{HistoryRecorder, SourceError, SourceResult, StateRegistry};
pub use types::{EntityState, HistorySample, RecordedState, SensorRecord};
pub use validation::{
    Classification, SensorValidation, classify_energy_sensor, is_numeric_state, is_valid_state,
    validate_sensors,
};
pub use window::{Boundary, TimeWindow, parse_timestamp};
