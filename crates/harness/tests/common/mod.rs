//! Shared fixtures for harness integration tests

#![allow(dead_code)]

use std::path::Path;

use synccheck_harness::{Credentials, HarnessConfig, SimServer, SimSession};

pub const ADMIN_PASSWORD: &str = "admin-pass";

/// Default config rooted in `dir`, with admin credentials the simulator accepts.
pub fn test_config(dir: &Path) -> HarnessConfig {
    HarnessConfig {
        admin: Credentials::new("admin", ADMIN_PASSWORD),
        base_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

pub fn server_and_session(config: &HarnessConfig) -> (SimServer, SimSession) {
    let server = SimServer::new(config);
    let session = server.open_session();
    (server, session)
}
