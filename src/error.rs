//! Error taxonomy for the client.
//!
//! The gateway, store, session, and orchestrator each surface their own
//! error type; `anyhow` is only used at the binary's top level.

use thiserror::Error;

/// Failure of a single HTTP request through the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure before a response was produced.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl GatewayError {
    /// True when the server rejected the bearer credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Status { status: 401, .. })
    }
}

/// Credential store failure.
#[derive(Debug, Error)]
#[error("credential store failure: {0}")]
pub struct StoreError(#[from] sqlx::Error);

/// Failure during login or registration.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the email/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The server refused the registration (e.g. duplicate email).
    #[error("registration rejected")]
    RegistrationRejected,

    #[error(transparent)]
    Gateway(GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrator operation that could not be issued at all.
///
/// Per-fetch failures are not represented here; they land in the slot as
/// `FetchState::Failed` without affecting sibling slots.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The session is unauthenticated; protected fetches are never issued.
    #[error("not authenticated")]
    NotAuthenticated,

    /// No account is selected yet.
    #[error("no account selected")]
    NoAccountSelected,

    /// The id is not in the most recently loaded account list.
    #[error("account {0} is not in the loaded account list")]
    UnknownAccount(i64),

    /// The account list has not been loaded.
    #[error("accounts have not been loaded")]
    AccountsNotLoaded,
}
