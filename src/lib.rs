// Public API - the runner and the connection settings it is built from
pub mod config;
pub mod runner;

// Internal modules
mod db;
mod model;
mod report;
mod telemetry;
