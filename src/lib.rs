pub mod analytics;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod models;
pub mod report;
pub mod validate;
