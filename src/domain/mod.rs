//! Core domain types and logic.

pub mod bar;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod indicator;
pub mod market;
pub mod news;
pub mod risk;
pub mod strategy;
pub mod engine;
pub mod backtest;
pub mod live;
pub mod metrics;
pub mod config_validation;
pub mod error;
