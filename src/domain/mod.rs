//! Core domain types and logic.

pub mod config;
pub mod entry;
pub mod error;
pub mod execution;
pub mod fill;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod quality;
pub mod scanner;
pub mod security_data;
pub mod simulator;
pub mod snapshot;
pub mod trend;
pub mod universe;
