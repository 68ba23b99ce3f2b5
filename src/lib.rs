//! TICKERSCOPE: stock research from the command line
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod llm;
pub mod providers;
pub mod report;
pub mod sentiment;
pub mod storage;
pub mod types;
