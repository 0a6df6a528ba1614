//! GEFLIP — Grand Exchange flip suggestions
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cli;
pub mod config;
pub mod engine;
pub mod limits;
pub mod market;
pub mod report;
pub mod strategy;
pub mod types;
