//! Integration tests for the GROUPTEST simulator.

mod simulation;
