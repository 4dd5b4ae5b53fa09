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

use serde::Serialize;

use crate::types::HistorySample;

/// Summary of one entity's numeric history
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Statistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
    /// Last value minus first value; meaningful for cumulative meters.
    /// Clamped to the finite `f64` range.
    pub total_consumption: Option<f64>,
    pub valid_points: usize,
}

impl Statistics {
    /// All values absent, zero points
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: &[HistorySample]) -> Self {
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Self::empty();
        };

        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), sample| {
                (min.min(sample.value), max.max(sample.value))
            });

        // Dividing before summing keeps the mean finite for any finite input
        #[expect(clippy::cast_precision_loss, reason = "sample counts stay far below 2^52")]
        let count = samples.len() as f64;
        let average: f64 = samples.iter().map(|sample| sample.value / count).sum();

        // Saturates when the difference does not fit in an f64
        let total_consumption = if samples.len() > 1 {
            (last.value - first.value).clamp(f64::MIN, f64::MAX)
        } else {
            0.0
        };

        Self {
            min: Some(min),
            max: Some(max),
            average: Some(average),
            total_consumption: Some(total_consumption),
            valid_points: samples.len(),
        }
    }
}
