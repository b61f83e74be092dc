//! Login and registration form submission.
//!
//! Both flows collapse every failure into a single generic user-facing
//! message; the underlying cause is logged, never displayed. Registration
//! does not authenticate: the user logs in explicitly afterwards.

use thiserror::Error;
use tracing::debug;

use crate::api::{ApiGateway, RegisterRequest, RegisteredUser};
use crate::error::{AuthError, GatewayError};
use crate::session::Session;

/// Login form fields.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form fields.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
}

/// Generic user-facing flow failure. `Display` is the full message shown
/// to the user; server detail never leaks through it.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("Invalid credentials")]
    Login,
    #[error("Unable to register")]
    Register,
}

/// Submit the login form through the session.
pub async fn submit_login(session: &Session, form: &LoginForm) -> Result<(), AuthFlowError> {
    session
        .login(&form.email, &form.password)
        .await
        .map_err(|e| {
            debug!(error = %e, "login failed");
            AuthFlowError::Login
        })
}

/// Submit the registration form. Success does not log the user in.
pub async fn submit_register(
    gateway: &ApiGateway,
    form: &RegisterForm,
) -> Result<(), AuthFlowError> {
    let request = RegisterRequest {
        email: form.email.clone(),
        password: form.password.clone(),
    };

    let result: Result<RegisteredUser, GatewayError> =
        gateway.post("/auth/register", &request).await;

    match result {
        Ok(user) => {
            debug!(user_id = user.id, "registration accepted");
            Ok(())
        }
        Err(e) => {
            // The backend answers 400 for a duplicate email.
            let error = if matches!(e, GatewayError::Status { status: 400, .. }) {
                AuthError::RegistrationRejected
            } else {
                AuthError::Gateway(e)
            };
            debug!(error = %error, "registration failed");
            Err(AuthFlowError::Register)
        }
    }
}
