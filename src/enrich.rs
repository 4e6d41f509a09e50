//! Synthesis of the environment fields that are not collected from the user.
//!
//! The fitted preprocessors require vehicle age, wind speed and air pressure.
//! An `EnvironmentEnricher` fills them in so the strategy can change without
//! touching the pipeline.

use crate::inputs::{EnvironmentInputs, EnvironmentRecord, SynthesizedFields};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::fmt;
use std::ops::Range;
use std::sync::Mutex;
use thiserror::Error;

/// Upper bound is exclusive, so ages run 1 through 9.
pub const VEHICLE_AGE_RANGE: Range<u32> = 1..10;
pub const WIND_SPEED_RANGE: Range<f64> = 0.0..20.0;
pub const AIR_PRESSURE_RANGE: Range<f64> = 950.0..1050.0;

pub trait EnvironmentEnricher: Send + Sync + fmt::Debug {
    fn synthesize(&self) -> SynthesizedFields;

    fn enrich(&self, inputs: EnvironmentInputs) -> EnvironmentRecord {
        EnvironmentRecord::new(inputs, self.synthesize())
    }
}

/// Enrichment strategy, selected by `[enrichment]` in config.toml.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum EnrichmentSettings {
    #[default]
    Random,
    Seeded {
        seed: u64,
    },
    Fixed {
        vehicle_age: u32,
        wind_speed: f64,
        air_pressure: f64,
    },
}

#[derive(Debug, Error, PartialEq)]
#[error("fixed enrichment {field} = {value} is outside [{min}, {max})")]
pub struct InvalidEnrichment {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

fn check_sampling_range(
    field: &'static str,
    value: f64,
    range: Range<f64>,
) -> Result<(), InvalidEnrichment> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(InvalidEnrichment {
        field,
        value,
        min: range.start,
        max: range.end,
    })
}

impl EnrichmentSettings {
    /// Fixed values must lie in the ranges the random strategy samples from.
    pub fn validate(&self) -> Result<(), InvalidEnrichment> {
        let EnrichmentSettings::Fixed {
            vehicle_age,
            wind_speed,
            air_pressure,
        } = self
        else {
            return Ok(());
        };
        check_sampling_range(
            "vehicle_age",
            f64::from(*vehicle_age),
            f64::from(VEHICLE_AGE_RANGE.start)..f64::from(VEHICLE_AGE_RANGE.end),
        )?;
        check_sampling_range("wind_speed", *wind_speed, WIND_SPEED_RANGE)?;
        check_sampling_range("air_pressure", *air_pressure, AIR_PRESSURE_RANGE)?;
        Ok(())
    }
}

pub fn create_enricher(settings: &EnrichmentSettings) -> Box<dyn EnvironmentEnricher> {
    match settings {
        EnrichmentSettings::Random => Box::new(RandomEnricher),
        EnrichmentSettings::Seeded { seed } => Box::new(SeededEnricher::new(*seed)),
        EnrichmentSettings::Fixed {
            vehicle_age,
            wind_speed,
            air_pressure,
        } => Box::new(FixedEnricher::new(SynthesizedFields {
            vehicle_age: *vehicle_age,
            wind_speed: *wind_speed,
            air_pressure: *air_pressure,
        })),
    }
}

pub fn sample_fields<R: Rng + ?Sized>(rng: &mut R) -> SynthesizedFields {
    SynthesizedFields {
        vehicle_age: rng.gen_range(VEHICLE_AGE_RANGE),
        wind_speed: rng.gen_range(WIND_SPEED_RANGE),
        air_pressure: rng.gen_range(AIR_PRESSURE_RANGE),
    }
}

/// Draws fresh values from the thread-local generator on every request.
#[derive(Debug, Default)]
pub struct RandomEnricher;

impl EnvironmentEnricher for RandomEnricher {
    fn synthesize(&self) -> SynthesizedFields {
        sample_fields(&mut rand::thread_rng())
    }
}

/// Reproducible sequence of draws from a fixed seed.
#[derive(Debug)]
pub struct SeededEnricher {
    rng: Mutex<StdRng>,
}

impl SeededEnricher {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EnvironmentEnricher for SeededEnricher {
    fn synthesize(&self) -> SynthesizedFields {
        // Sampling never leaves the generator half-updated; a poisoned lock is still usable.
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sample_fields(&mut *rng)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedEnricher {
    fields: SynthesizedFields,
}

impl FixedEnricher {
    pub fn new(fields: SynthesizedFields) -> Self {
        Self { fields }
    }
}

impl EnvironmentEnricher for FixedEnricher {
    fn synthesize(&self) -> SynthesizedFields {
        self.fields
    }
}
