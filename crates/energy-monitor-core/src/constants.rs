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

pub const NAME: &str = "Energy Monitor Backend";

/// Entity id prefix of the sensor domain
pub const SENSOR_DOMAIN_PREFIX: &str = "sensor.";

// ============= API paths =============
pub const ENDPOINT_ENTITIES: &str = "/api/energy_monitor/entities";
pub const ENDPOINT_STATE: &str = "/api/energy_monitor/state";
pub const ENDPOINT_HISTORY: &str = "/api/energy_monitor/history";
pub const ENDPOINT_VALIDATE: &str = "/api/energy_monitor/validate";

// ============= History window =============
pub const DEFAULT_DAYS_HISTORY: u32 = 7;
pub const MAX_DAYS_HISTORY: u32 = 90;

/// States that carry no usable reading (compared case-insensitively)
pub const INVALID_STATES: [&str; 4] = ["unavailable", "unknown", "none", ""];

pub const VALID_DEVICE_CLASSES: [&str; 2] = ["energy", "power"];

/// Full unit list of the validation helper
pub const EXTENDED_UNITS: [&str; 8] = ["kWh", "Wh", "MWh", "GWh", "W", "kW", "MW", "GW"];

/// Short unit list historically used by the entities view
pub const LEGACY_UNITS: [&str; 4] = ["kWh", "W", "Wh", "MWh"];

/// Identifier fragments marking tariff sensors that never count as energy sensors
pub const EXCLUDED_ID_FRAGMENTS: [&str; 2] = ["_cost", "_price"];

// Attribute keys surfaced as dedicated fields
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";
pub const ATTR_UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";
pub const ATTR_DEVICE_CLASS: &str = "device_class";
