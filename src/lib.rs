//! Vehicle fault and emission inference service.
//!
//! Engine sensor readings and vehicle/environment inputs run through three
//! pre-trained stages: a fault classifier, a multi-output pollutant
//! regressor and an emission index regressor whose output is bucketed into
//! an emission level.

pub mod api;
pub mod artifact;
pub mod config;
pub mod enrich;
pub mod error;
pub mod inputs;
pub mod pipeline;
pub mod record;
pub mod state;
