//! Core domain types and the analytics engine.

pub mod series;
pub mod returns;
pub mod portfolio;
pub mod aggregation;
pub mod risk_free;
pub mod statistics;
pub mod metrics;
pub mod drawdown;
pub mod alignment;
pub mod correlation;
pub mod monthly;
pub mod analysis;
pub mod config_validation;
pub mod error;
