use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{require_email, require_field};
use super::{ApiClient, Result};
use crate::models::User;

#[derive(Debug, Clone, Serialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

impl LoginPayload {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_email(&self.email)?;
        require_field(&self.password, "Password")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterPayload {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_field(&self.name, "Name")?;
        require_email(&self.email)?;
        require_field(&self.password, "Password")
    }
}

/// Returned by both login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct CurrentUserResponse {
    user: User,
}

impl ApiClient {
    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse> {
        payload.validate()?;
        debug!(email = %payload.email, "Signing in");
        self.post("/auth/login", payload).await
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse> {
        payload.validate()?;
        debug!(email = %payload.email, "Registering account");
        self.post("/auth/register", payload).await
    }

    /// Fetch the profile for the current token
    pub async fn current_user(&self) -> Result<User> {
        let response: CurrentUserResponse = self.get("/auth/me").await?;
        Ok(response.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    #[test]
    fn test_login_payload_validation() {
        assert!(LoginPayload::new(" ana@example.com ", "secret").validate().is_ok());
        assert_eq!(LoginPayload::new(" ana@example.com ", "x").email, "ana@example.com");
        assert!(matches!(
            LoginPayload::new("", "secret").validate(),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            LoginPayload::new("ana@example.com", "").validate(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_register_payload_validation() {
        assert!(RegisterPayload::new("Ana", "ana@example.com", "secret").validate().is_ok());
        let err = RegisterPayload::new(" ", "ana@example.com", "secret")
            .validate()
            .unwrap_err();
        assert_eq!(err.user_message(), "Name is required");
    }

    #[tokio::test]
    async fn test_invalid_login_never_reaches_network() {
        // Nothing listens on this port; a request would be a NetworkError.
        let client = ApiClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)).unwrap();
        let err = client.login(&LoginPayload::new("nope", "pw")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
