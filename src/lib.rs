pub mod config;
pub mod dashboard;
pub mod domain;
pub mod hub;
pub mod metrics;
pub mod store;
