//! Refresh-token authorization for the Gmail API

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use yup_oauth2::authorized_user::AuthorizedUserSecret;

use crate::error::{ResponderError, Result};

/// Scopes needed to read, send and relabel mail
///
/// - gmail.modify: read, send, and change labels on messages
/// - gmail.labels: create the marker label
pub const REQUIRED_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.labels",
];

/// Type alias for Gmail Hub to simplify type signatures
pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type GmailHub = Gmail<HttpsConnector>;

/// Client registration in Google's "web application" credentials format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRegistration {
    pub web: WebClient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
}

impl WebClient {
    /// The redirect URI the registration was issued for
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(String::as_str)
    }
}

/// Long-lived credential obtained out of band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub refresh_token: String,
}

/// Load the OAuth2 client registration (`credentials.json`)
pub async fn load_client_registration(path: &Path) -> Result<ClientRegistration> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ResponderError::AuthError(format!("Failed to read client registration {:?}: {}", path, e))
    })?;
    let registration: ClientRegistration = serde_json::from_str(&content).map_err(|e| {
        ResponderError::AuthError(format!("Invalid client registration {:?}: {}", path, e))
    })?;

    if registration.web.redirect_uri().is_none() {
        return Err(ResponderError::AuthError(
            "Client registration has no web.redirect_uris".to_string(),
        ));
    }

    Ok(registration)
}

/// Load the stored refresh credential (`token.json`)
pub async fn load_refresh_token(path: &Path) -> Result<StoredToken> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ResponderError::AuthError(format!("Failed to read token file {:?}: {}", path, e))
    })?;
    let token: StoredToken = serde_json::from_str(&content).map_err(|e| {
        ResponderError::AuthError(format!("Invalid token file {:?}: {}", path, e))
    })?;

    if token.refresh_token.trim().is_empty() {
        return Err(ResponderError::AuthError(
            "Token file has an empty refresh_token".to_string(),
        ));
    }

    Ok(token)
}

/// Combine registration and refresh token into an authorized-user secret
pub fn authorized_user_secret(
    registration: &ClientRegistration,
    token: &StoredToken,
) -> AuthorizedUserSecret {
    AuthorizedUserSecret {
        client_id: registration.web.client_id.clone(),
        client_secret: registration.web.client_secret.clone(),
        refresh_token: token.refresh_token.clone(),
        key_type: "authorized_user".to_string(),
    }
}

/// Build an authenticated Gmail hub from the registration and refresh token
///
/// Access tokens are refreshed transparently per call; nothing is written
/// back to `token_path`. A token is requested once here so bad credentials
/// fail at startup instead of on the first tick.
pub async fn authorize(credentials_path: &Path, token_path: &Path) -> Result<GmailHub> {
    let registration = load_client_registration(credentials_path).await?;
    let token = load_refresh_token(token_path).await?;
    let secret = authorized_user_secret(&registration, &token);

    let auth = yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
        .build()
        .await
        .map_err(|e| ResponderError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    auth.token(REQUIRED_SCOPES)
        .await
        .map_err(|e| ResponderError::AuthError(format!("Failed to obtain access token: {}", e)))?;

    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| ResponderError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    info!("Authorized Gmail client {}", registration.web.client_id);
    Ok(Gmail::new(client, auth))
}
