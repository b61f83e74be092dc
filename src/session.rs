//! Session binding: the single owner of the credential lifecycle.
//!
//! Reconciles the credential store with the request gateway on startup and
//! on every credential change, and publishes the session state so views can
//! subscribe instead of polling. All writes to the store and to the gateway
//! credential happen here.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{ApiGateway, LoginRequest, TokenResponse};
use crate::error::{AuthError, GatewayError, StoreError};
use crate::store::CredentialStore;

/// Authentication state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Owns the credential store and the gateway credential.
pub struct Session {
    store: CredentialStore,
    gateway: Arc<ApiGateway>,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// Restore the session from the store: a persisted credential is applied
    /// to the gateway and the session starts authenticated; otherwise it
    /// starts unauthenticated.
    pub async fn initialize(
        store: CredentialStore,
        gateway: Arc<ApiGateway>,
    ) -> Result<Self, StoreError> {
        let state = match store.read().await? {
            Some(credential) => {
                gateway.set_credential(Some(credential)).await;
                SessionState::Authenticated
            }
            None => SessionState::Unauthenticated,
        };

        let (tx, _rx) = watch::channel(state);

        Ok(Self {
            store,
            gateway,
            state: tx,
        })
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Subscribe to state changes. Subscribers are read-only observers.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Exchange email/password for a credential, persist it, and apply it
    /// to the gateway.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: TokenResponse = self
            .gateway
            .post("/auth/login", &request)
            .await
            .map_err(|e| match e {
                GatewayError::Status { status: 401, .. } => AuthError::InvalidCredentials,
                other => AuthError::Gateway(other),
            })?;

        self.store.write(&response.access_token).await?;
        self.gateway.set_credential(Some(response.access_token)).await;
        self.state.send_replace(SessionState::Authenticated);

        info!("session authenticated");
        Ok(())
    }

    /// Discard the credential everywhere. The store and gateway are cleared
    /// before the state change is published, so no observer can issue a
    /// fetch with a stale credential.
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.store.clear().await?;
        self.gateway.set_credential(None).await;
        self.state.send_replace(SessionState::Unauthenticated);

        info!("session terminated");
        Ok(())
    }

    /// Same transition as logout, driven by the server rejecting the
    /// credential on an authenticated call.
    pub async fn expire(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear credential store on expiry");
        }
        self.gateway.set_credential(None).await;
        self.state.send_replace(SessionState::Unauthenticated);

        warn!("credential rejected by server, session expired");
    }
}
