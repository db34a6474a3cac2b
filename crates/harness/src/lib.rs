//! SyncCheck scenario harness
//!
//! This crate drives a remote interactive session through scripted user
//! journeys against a file-sync web application:
//! - Bounded polling for every observation of the UI
//! - Step functions that never fail past their own boundary
//! - An orchestrator that halts at the first failed step and attributes it
//! - An in-memory simulated server for rehearsals and tests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Scenario orchestrator                    │
//! │    run_scenario(scenario, session) -> ScenarioResult        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Step functions (ActionResult)                              │
//! │    login, logout, create_user, modify_user_quota,           │
//! │    delete_user, upload_file, download_file,                 │
//! │    verify_integrity, share_file, delete_file                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Action primitives (Actions)                                │
//! │    locate, locate_visible, locate_clickable, click,         │
//! │    type_into, read_attribute, wait_absent, wait_stale       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  WaitPolicy { timeout, interval }                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session trait  <-  SimSession (in-memory) | real driver    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod actions;
pub mod config;
pub mod entity;
pub mod error;
pub mod integrity;
pub mod journey;
pub mod locator;
pub mod outcome;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod sim;
pub mod steps;
pub mod wait;

pub use config::{Credentials, HarnessConfig, TimeoutConfig};
pub use error::{FailureKind, HarnessError, HarnessResult};
pub use journey::{file_management_cycle, run_file_management_cycle, JourneyFixtures};
pub use locator::{By, Locator, LocatorTemplate, Locators};
pub use outcome::ActionResult;
pub use runner::{run_scenario, write_results, ScenarioResult, StepRecord, SuiteResult};
pub use scenario::Scenario;
pub use session::{Cookie, ElementRef, Session};
pub use sim::{SimServer, SimSession};
pub use wait::{await_condition, WaitPolicy};
