//! Synthetic HR data
//!
//! Seeded tables for tests, benchmarks and the `generate` command.

mod generator;

pub use generator::{attrition_probability, HrDataGenerator};
