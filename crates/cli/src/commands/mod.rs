//! CLI Commands

pub mod cleanup;
pub mod config;
pub mod report;
pub mod run;
