//! GROUPTEST: Monte Carlo simulator for noisy binary-search pooled testing
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cli;
pub mod config;
pub mod simulation;
pub mod types;
