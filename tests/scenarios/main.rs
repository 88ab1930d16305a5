//! Scenario-based tests for mgpipe

#[path = "../helpers.rs"]
mod helpers;

mod configuration;
mod diet_resolution;
mod normalization;
mod worker_pool;
