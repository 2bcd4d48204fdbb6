//! Firebase email/password authentication

use async_trait::async_trait;
use std::time::Duration;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use taskdash_core::auth::AuthService;
use taskdash_core::session::Session;
use taskdash_core::{Error, Result};

use crate::{http_client, http_error, DEFAULT_REQUEST_TIMEOUT};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Auth service backed by the Identity Toolkit REST API
pub struct FirebaseAuth {
    client: Client,
    identity_url: String,
    api_key: String,
    tx: watch::Sender<Option<Session>>,
}

impl FirebaseAuth {
    pub fn new(identity_url: &str, api_key: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            client: http_client(DEFAULT_REQUEST_TIMEOUT),
            identity_url: identity_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            tx,
        }
    }

    /// Use a preconfigured HTTP client (proxy, timeouts)
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Replace the default per-request timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_client(http_client(timeout))
    }

    /// Sign in with email and password and publish the new session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(format!("{}/v1/accounts:signInWithPassword", self.identity_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInRequest {
                email: email.trim(),
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("sign-in failed with {}", status));
            return Err(Error::Unauthenticated(reason));
        }

        let signed_in: SignInResponse = response.json().await.map_err(http_error)?;
        let session =
            Session::new(signed_in.local_id, signed_in.email).with_id_token(signed_in.id_token);
        info!(
            user_id = %session.user_id,
            expires_in = signed_in.expires_in.as_deref().unwrap_or("unknown"),
            "Signed in with Firebase"
        );
        self.tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }
}

#[async_trait]
impl AuthService for FirebaseAuth {
    fn sessions(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        // ID tokens are not revoked server-side
        self.tx.send_replace(None);
        Ok(())
    }
}
