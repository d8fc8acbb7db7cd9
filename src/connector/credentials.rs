use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::connector::{
    error::{ConnectorError, authentication_error},
    types::ConnectorConfig,
};

pub const TOKEN_AUDIENCE: &str = "https://idproxy.kore.ai/authorize";
pub const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("client id must not be empty")]
    EmptyClientId,
    #[error("client secret must not be empty")]
    EmptySecret,
    #[error("failed to initialize token signer: {0}")]
    InvalidKey(String),
    #[error("failed to encode token segment: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub is_anonymous: bool,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
    pub aud: String,
    pub sub: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn session(config: &ConnectorConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// The admin pair is optional; a missing admin client id falls back to the
    /// session client id, but without an admin secret there is no admin pair.
    pub fn admin(config: &ConnectorConfig) -> Option<Self> {
        let client_secret = config
            .admin_client_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())?;
        let client_id = config
            .admin_client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&config.client_id);

        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, credentials: &ClientCredentials, subject: &str) -> Result<String, SigningError>;
}

/// Signs HS256 JWTs asserting an anonymous subject for a fixed audience.
#[derive(Default)]
pub struct Hs256TokenIssuer;

impl Hs256TokenIssuer {
    pub fn issue_at(
        &self,
        credentials: &ClientCredentials,
        subject: &str,
        issued_at: u64,
    ) -> Result<String, SigningError> {
        if credentials.client_id.is_empty() {
            return Err(SigningError::EmptyClientId);
        }
        if credentials.client_secret.is_empty() {
            return Err(SigningError::EmptySecret);
        }

        let header = serde_json::json!({"alg": "HS256", "typ": "JWT"});
        let claims = TokenClaims {
            is_anonymous: true,
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
            iss: credentials.client_id.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            sub: subject.to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = sign(&signing_input, &credentials.client_secret)?;

        Ok(format!("{}.{}", signing_input, signature))
    }
}

impl TokenIssuer for Hs256TokenIssuer {
    fn issue(&self, credentials: &ClientCredentials, subject: &str) -> Result<String, SigningError> {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.issue_at(credentials, subject, issued_at)
    }
}

fn sign(signing_input: &str, secret: &str) -> Result<String, SigningError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|err| SigningError::InvalidKey(err.to_string()))?;
    mac.update(signing_input.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

pub fn issue_session_token(
    issuer: &dyn TokenIssuer,
    credentials: &ClientCredentials,
    subject: &str,
) -> Result<String, ConnectorError> {
    issuer
        .issue(credentials, subject)
        .map_err(|err| authentication_error(format!("failed to sign session token: {}", err)))
}

pub fn issue_admin_token(
    issuer: &dyn TokenIssuer,
    credentials: Option<&ClientCredentials>,
    subject: &str,
) -> Result<Option<String>, ConnectorError> {
    let Some(credentials) = credentials else {
        return Ok(None);
    };

    issuer
        .issue(credentials, subject)
        .map(Some)
        .map_err(|err| authentication_error(format!("failed to sign admin token: {}", err)))
}
