//! SyncCheck CLI
//!
//! Command-line interface for rehearsing user journeys, checking CI report
//! files and cleaning up local test artifacts.

pub mod commands;
pub mod output;
