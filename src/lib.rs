// Stratplan - strategic planning and budget approval client
// Library exports

pub mod api;
pub mod cli;
pub mod config;
pub mod costing;
pub mod dashboard;
pub mod enrichment;
pub mod logging;
pub mod models;
pub mod review;
pub mod workflow;
