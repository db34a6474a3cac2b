//! Step functions
//!
//! A step walks `navigate -> locate target -> act -> verify`. Every public
//! step returns an [`ActionResult`](crate::ActionResult) and contains its
//! own errors and panics; internally steps use `?` on [`HarnessResult`].
//!
//! Navigation helpers (`ensure_*`) are idempotent: a cheap presence probe
//! runs first, and nothing is clicked when the probe already holds.

mod auth;
mod files;
mod share;
mod users;

pub use auth::{has_session_cookie, login, logout};
pub use files::{delete_file, download_file, ensure_files_page, upload_file, verify_integrity};
pub use share::share_file;
pub use users::{create_user, delete_user, ensure_users_page, modify_user_quota};

use crate::actions::Actions;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::session::Session;

fn actions<'a, S: Session + ?Sized>(session: &'a S, config: &HarnessConfig) -> Actions<'a, S> {
    Actions::new(session, config.timeouts.element())
}

/// Map a failed observation onto a post-condition failure.
fn unobserved(expectation: impl Into<String>) -> impl FnOnce(HarnessError) -> HarnessError {
    let expectation = expectation.into();
    move |err| match err {
        HarnessError::NotFound(what) => {
            HarnessError::Verification(format!("{} ({} not found)", expectation, what))
        }
        other => other.into_verification(&expectation),
    }
}
