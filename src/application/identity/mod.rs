//! Identity module: user and role management
//!
//! `UserService` and `RoleService` orchestrate the account use-cases over
//! injected repositories.

pub mod role_service;
pub mod user_service;

pub use role_service::RoleService;
pub use user_service::UserService;

use tracing::{error, warn};

use crate::support::DomainError;

/// Emit the failure at a level matching its class and hand it back.
pub(crate) fn logged(err: DomainError) -> DomainError {
    if err.is_internal() {
        error!(error = %err, "Operation failed");
    } else {
        warn!(error = %err, kind = ?err.kind(), "Operation rejected");
    }
    err
}
