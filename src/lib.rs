//! DIN-DIN: Round-based multiplier game with auto-betting
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod autobet;
pub mod bonus;
pub mod queue;
pub mod notify;
pub mod ratelimit;
pub mod maintenance;
pub mod game;
pub mod dashboard;
