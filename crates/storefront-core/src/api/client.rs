//! Client for the storefront account backend.
//!
//! This module provides the `AccountClient` struct for signup, login and
//! profile calls. The bearer token and cached profile live in the injected
//! `SessionStore`; failures are reported once through the `Notifier`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::{SessionStore, UserProfile};
use crate::config::Config;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::utils::truncate_string;

use super::error::detail_message;
use super::profile::{normalize_profile_response, ProfileResult, SignupRequest, TokenResponse};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const SIGNUP_PATH: &str = "/signup";
const TOKEN_PATH: &str = "/token";
const PROFILE_PATH: &str = "/profile";

const SIGNUP_FAILED: &str = "Signup failed";
const LOGIN_FAILED: &str = "Login failed";
const PROFILE_UPDATE_FAILED: &str = "Profile update failed";
const PROFILE_FETCH_FAILED: &str = "Failed to get profile";
const MISSING_TOKEN: &str = "Authentication token not found";

/// Maximum length of a response body copied into log fields
const MAX_LOGGED_BODY_LENGTH: usize = 500;

/// Client for the account endpoints.
/// Clone is cheap - the connection pool, session and notifier are shared.
#[derive(Clone)]
pub struct AccountClient {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl AccountClient {
    /// Create a client for `base_url` that logs its notifications
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            notifier: Arc::new(TracingNotifier),
        })
    }

    pub fn from_config(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout(), session)
    }

    /// Replace the notifier that receives failure messages
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session store this client reads tokens from and caches into
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Account Operations =====

    /// Register a new account. The response body is ignored on success.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let result = self.send_signup(email, password).await;
        self.report("Failed to sign up", result)
    }

    /// Exchange credentials for a bearer token and start a session.
    ///
    /// The token endpoint takes form fields, not JSON.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let result = self.send_login(username, password).await;
        self.report("Failed to log in", result)
    }

    /// Save date of birth and gender for the logged-in account
    pub async fn update_profile(&self, dob: &str, gender: &str) -> Result<ProfileResult, ApiError> {
        let result = self.send_profile_update(dob, gender).await;
        self.report("Failed to update profile", result)
    }

    /// Fetch the logged-in account's profile
    pub async fn get_profile(&self) -> Result<ProfileResult, ApiError> {
        let result = self.fetch_profile().await;
        self.report("Failed to get profile", result)
    }

    // ===== Request Handling =====

    async fn send_signup(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(SIGNUP_PATH))
            .json(&SignupRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, SIGNUP_FAILED, ApiError::AccountCreation).await);
        }

        debug!(email = email, "Account created");
        Ok(())
    }

    async fn send_login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, LOGIN_FAILED, ApiError::Authentication).await);
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;

        self.session.set_user_email(username);
        self.session.set_token(&token.access_token);

        debug!(username = username, token_type = %token.token_type, "Logged in");
        Ok(token)
    }

    async fn send_profile_update(&self, dob: &str, gender: &str) -> Result<ProfileResult, ApiError> {
        let token = self.require_token()?;
        let sent = UserProfile {
            dob: dob.to_string(),
            gender: gender.to_string(),
        };

        let response = self
            .client
            .post(self.url(PROFILE_PATH))
            .bearer_auth(&token)
            .json(&sent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                Self::rejection(response, PROFILE_UPDATE_FAILED, ApiError::ProfileUpdate).await,
            );
        }

        let raw = Self::read_json(response).await?;
        let profile = normalize_profile_response(raw.as_ref(), self.session.user_email(), &sent);
        self.session.set_user_profile(&profile.dob, &profile.gender);

        Ok(profile)
    }

    async fn fetch_profile(&self) -> Result<ProfileResult, ApiError> {
        let token = self.require_token()?;

        let response = self
            .client
            .get(self.url(PROFILE_PATH))
            .bearer_auth(&token)
            .send()
            .await?;

        let response = if response.status().is_success() {
            response
        } else {
            // Workaround for backends without a working profile read: ask the
            // write endpoint, with empty values, to echo what it has stored.
            // This can hide real read errors. Do not copy it to other calls.
            debug!(status = %response.status(), "Profile read failed, retrying through profile write");
            let fallback = self
                .client
                .post(self.url(PROFILE_PATH))
                .bearer_auth(&token)
                .json(&UserProfile::default())
                .send()
                .await?;

            if !fallback.status().is_success() {
                return Err(
                    Self::rejection(fallback, PROFILE_FETCH_FAILED, ApiError::ProfileFetch).await,
                );
            }
            fallback
        };

        let raw = Self::read_json(response).await?;
        let cached = self.session.user_profile();
        let profile = normalize_profile_response(raw.as_ref(), self.session.user_email(), &cached);

        if profile.dob != cached.dob || profile.gender != cached.gender {
            self.session.set_user_profile(&profile.dob, &profile.gender);
        }

        Ok(profile)
    }

    fn require_token(&self) -> Result<String, ApiError> {
        self.session
            .token()
            .ok_or_else(|| ApiError::Authentication(MISSING_TOKEN.to_string()))
    }

    /// Read a success body as JSON. Empty or non-JSON bodies yield `None`.
    async fn read_json(response: Response) -> Result<Option<Value>, ApiError> {
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(error = %e, body = %truncate_string(&body, MAX_LOGGED_BODY_LENGTH), "Ignoring non-JSON response body");
                Ok(None)
            }
        }
    }

    /// Build the error for a non-success response from its `detail` message
    async fn rejection(
        response: Response,
        fallback: &str,
        make_error: fn(String) -> ApiError,
    ) -> ApiError {
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        debug!(
            status = %status,
            url = %url,
            body = %truncate_string(&body, MAX_LOGGED_BODY_LENGTH),
            "Request rejected"
        );
        let message = detail_message(&body).unwrap_or_else(|| fallback.to_string());
        make_error(message)
    }

    /// Log a failed operation and notify the user once
    fn report<T>(&self, action: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(ref e) = result {
            match e {
                ApiError::Transport(_) => error!(action = action, error = %e, "Request failed"),
                _ => warn!(action = action, kind = ?e.kind(), error = %e, "Request rejected"),
            }
            self.notifier
                .notify(Notification::error(format!("{}: {}", action, e)));
        }
        result
    }
}
