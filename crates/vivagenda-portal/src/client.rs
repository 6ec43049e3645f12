//! HTTP client for the Vivver scheduling portal.
//!
//! The portal exposes an HTML login form and a paginated JSON gadget
//! endpoint. Authentication is cookie-based: a session is a `reqwest`
//! client with its own cookie store, created for one fetch attempt and
//! dropped with it. Nothing session-related is kept in shared state.

use std::time::Duration;

use reqwest::{Client, Url};
use vivagenda_core::{AppConfig, Credentials};

use crate::error::PortalError;
use crate::parse::parse_payload_body;
use crate::retry::run_with_attempts;
use crate::token::extract_login_token;
use crate::types::{RawPayload, ScheduleQuery};

const LOGIN_PATH: &str = "login";
const GADGET_PATH: &str = "bit/gadget/view_paginate.json";

/// Client for the scheduling portal.
///
/// Holds the connection policy (base URL, credentials, timeouts, retry
/// budget) but no connection state. Use [`PortalClient::from_config`] for
/// production or [`PortalClient::with_base_url`] to point at a mock server
/// in tests.
pub struct PortalClient {
    base_url: Url,
    credentials: Credentials,
    timeout_secs: u64,
    user_agent: String,
    max_attempts: u32,
    backoff_base_secs: u64,
    accept_invalid_certs: bool,
}

/// One authenticated session: a cookie-holding HTTP client that passed the
/// login flow. Owned by a single fetch attempt; never shared or reused.
pub struct PortalSession {
    http: Client,
    base_url: Url,
}

impl PortalClient {
    /// Creates a client from the loaded application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidBaseUrl`] if the configured base URL
    /// does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, PortalError> {
        let client = Self::with_base_url(
            &config.base_url,
            config.credentials.clone(),
            config.request_timeout_secs,
            &config.user_agent,
            config.max_attempts,
            config.backoff_base_secs,
        )?;
        Ok(client.accept_invalid_certs(config.accept_invalid_certs))
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidBaseUrl`] if `base_url` is not a valid
    /// URL.
    pub fn with_base_url(
        base_url: &str,
        credentials: Credentials,
        timeout_secs: u64,
        user_agent: &str,
        max_attempts: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, PortalError> {
        // Ensure exactly one trailing slash so Url::join treats the last
        // path segment as a directory.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PortalError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            credentials,
            timeout_secs,
            user_agent: user_agent.to_owned(),
            max_attempts,
            backoff_base_secs,
            accept_invalid_certs: false,
        })
    }

    /// Sets the TLS policy. Verification stays on unless explicitly turned
    /// off here; the insecure mode exists for portal installs with broken
    /// certificate chains and is logged loudly when enabled.
    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        if accept {
            tracing::warn!(
                base_url = %self.base_url,
                "TLS certificate verification DISABLED for portal sessions"
            );
        }
        self.accept_invalid_certs = accept;
        self
    }

    /// Establishes an authenticated session: fetches the login form, lifts
    /// the anti-forgery token out of it when present, and submits the
    /// credential pair.
    ///
    /// Success is declared only when the post-login response does not land
    /// back on the login endpoint.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Http`] on transport failure.
    /// - [`PortalError::UnexpectedStatus`] on a non-2xx login page or
    ///   login submission response.
    /// - [`PortalError::CredentialsRejected`] when the portal bounces the
    ///   submission back to the login form.
    pub async fn authenticate(&self) -> Result<PortalSession, PortalError> {
        let http = self.build_session_client()?;
        let login_url = self.join(LOGIN_PATH);

        let response = http.get(login_url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::UnexpectedStatus {
                status: status.as_u16(),
                url: login_url.to_string(),
            });
        }
        let form_html = response.text().await?;

        let token = extract_login_token(&form_html);
        if token.is_none() {
            tracing::debug!(url = %login_url, "login form carries no anti-forgery token");
        }

        let mut form: Vec<(&str, &str)> = vec![
            ("conta", &self.credentials.user),
            ("password", &self.credentials.password),
        ];
        if let Some(token) = &token {
            form.push(("_token", token));
        }

        let login_response = http.post(login_url.clone()).form(&form).send().await?;
        let status = login_response.status();
        if !status.is_success() {
            return Err(PortalError::UnexpectedStatus {
                status: status.as_u16(),
                url: login_url.to_string(),
            });
        }

        // The portal answers a bad credential pair with a redirect back to
        // the login form rather than an error status.
        if login_response.url().path().trim_end_matches('/').ends_with("/login") {
            return Err(PortalError::CredentialsRejected);
        }

        tracing::debug!(user = %self.credentials.user, "portal session established");
        Ok(PortalSession {
            http,
            base_url: self.base_url.clone(),
        })
    }

    /// Runs the full authenticate-then-fetch pipeline with the configured
    /// retry budget. Every attempt authenticates from scratch; sessions are
    /// not reused across attempts.
    ///
    /// # Errors
    ///
    /// - [`PortalError::CredentialsRejected`] immediately on rejected
    ///   credentials (not retried).
    /// - Any non-transient error from the failing attempt.
    /// - [`PortalError::RetriesExhausted`] wrapping the last transient
    ///   error once `max_attempts` attempts have failed.
    pub async fn fetch_schedule(&self, query: &ScheduleQuery) -> Result<RawPayload, PortalError> {
        run_with_attempts(self.max_attempts, self.backoff_base_secs, || async move {
            let session = self.authenticate().await?;
            session.fetch_page(query).await
        })
        .await
    }

    fn build_session_client(&self) -> Result<Client, PortalError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&self.user_agent);
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(builder.build()?)
    }

    fn join(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .expect("joining a constant path onto a validated base URL cannot fail")
    }
}

impl PortalSession {
    /// Issues the authenticated paginated-data request and parses the body.
    ///
    /// # Errors
    ///
    /// - [`PortalError::Http`] on transport failure.
    /// - [`PortalError::UnexpectedStatus`] on a non-2xx response.
    /// - [`PortalError::Deserialize`] when the body is not JSON even after
    ///   the single recovery pass.
    /// - [`PortalError::MissingDataKey`] when the parsed body has no
    ///   `"data"` key.
    pub async fn fetch_page(&self, query: &ScheduleQuery) -> Result<RawPayload, PortalError> {
        let mut url = self
            .base_url
            .join(GADGET_PATH)
            .expect("joining a constant path onto a validated base URL cannot fail");
        url.query_pairs_mut()
            .append_pair("id", &query.gadget_id.to_string())
            .append_pair("draw", &query.draw.to_string())
            .append_pair("start", &query.start.to_string())
            .append_pair("length", &query.length.to_string());

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        parse_payload_body(&body, url.as_str())
    }
}
