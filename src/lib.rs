pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod platform;
pub mod report;
pub mod runner;
