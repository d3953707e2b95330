pub mod config;
pub mod error;
pub mod report;
pub mod scoring;
pub mod telemetry;
pub mod workbook;
