//! Client for the hosted authentication provider.

use derive_getters::Getters;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::backend::BackendError;
use crate::config::BackendConfig;

/// An authenticated session, passed explicitly to everything that talks
/// to the backend on the user's behalf.
#[derive(Debug, Clone, Getters)]
pub struct AuthSession {
    /// Account id.
    user_id: String,
    /// Account email.
    email: String,
    /// Bearer token for the table store.
    access_token: String,
}

impl AuthSession {
    /// Creates a session from the token endpoint response.
    pub fn new(user_id: String, email: String, access_token: String) -> Self {
        Self {
            user_id,
            email,
            access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(alias = "msg", alias = "error_description")]
    message: Option<String>,
}

/// HTTP client for sign-up, sign-in, and sign-out.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    /// Creates an auth client from the backend config.
    #[instrument(skip(config), fields(base_url = %config.base_url()))]
    pub fn new(config: &BackendConfig) -> Self {
        info!("Creating AuthClient");
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.api_key().clone(),
        }
    }

    /// Registers a new account and returns the resulting session.
    ///
    /// The display name rides along as user metadata; the profile row
    /// itself is created lazily on first lobby visit.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] on network failure or rejection (e.g.
    /// an already-registered email).
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthSession, BackendError> {
        info!("Signing up");
        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => email.split('@').next().unwrap_or(email).to_string(),
        };
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        });

        let response = self
            .client
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        self.parse_session(response).await
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] on network failure or bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        info!("Signing in");
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        self.parse_session(response).await
    }

    /// Revokes the session's token. Failures are reported but the local
    /// session is discarded by the caller either way.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError> {
        info!("Signing out");
        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(session.access_token())
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Sign-out rejected by server");
            return Err(BackendError::new(format!(
                "Sign-out failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Parses a token-bearing auth response into a session.
    async fn parse_session(&self, response: reqwest::Response) -> Result<AuthSession, BackendError> {
        let status = response.status();
        let text = response.text().await?;
        debug!(status = %status, "Auth response received");

        if !status.is_success() {
            let message = serde_json::from_str::<AuthErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("auth request failed with status {status}"));
            warn!(status = %status, message = %message, "Auth request rejected");
            return Err(BackendError::new(message));
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        info!(user_id = %token.user.id, "Authenticated");
        Ok(AuthSession::new(
            token.user.id,
            token.user.email,
            token.access_token,
        ))
    }
}
