//! Data models for extraction results, reports and configuration.

pub mod amounts;
pub mod config;
pub mod report;
