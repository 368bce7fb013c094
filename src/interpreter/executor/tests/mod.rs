//! Tests for the executor
//!
//! Organized by language family and feature area

mod basic_tests;
mod error_tests;
mod helpers;
mod pilot_tests;
mod scenario_tests;
