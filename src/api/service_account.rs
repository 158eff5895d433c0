//! Google service account authentication.
//!
//! A short-lived JWT, signed with the service account's private key, is exchanged at Google's
//! token endpoint for an access token. The access token is kept and reused until one minute before
//! it expires.

use crate::api::SPREADSHEETS_SCOPE;
use crate::config::Credentials;
use crate::error::Res;
use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion. Google caps this at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Hands out access tokens for a service account, fetching a new one only when needed.
#[derive(Debug)]
pub(crate) struct TokenProvider {
    credentials: Credentials,
    http: reqwest::Client,
    token: Option<AccessToken>,
}

impl TokenProvider {
    pub(crate) fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            http: reqwest::Client::new(),
            token: None,
        }
    }

    /// Returns a valid access token, fetching a new one if the current one is missing or about to
    /// expire.
    pub(crate) async fn token(&mut self) -> Res<String> {
        if let Some(token) = &self.token {
            if token.is_fresh(Utc::now()) {
                trace!("Reusing access token valid until {}", token.expires_at);
                return Ok(token.value.clone());
            }
        }
        let token = self.fetch().await?;
        debug!("Obtained access token valid until {}", token.expires_at);
        let value = token.value.clone();
        self.token = Some(token);
        Ok(value)
    }

    /// Signs an assertion for the service account.
    fn assertion(&self, now: DateTime<Utc>) -> Res<String> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: self.credentials.client_email(),
            scope: SPREADSHEETS_SCOPE,
            aud: TOKEN_URL,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key().as_bytes())
            .context("The service account private key is not a valid PEM encoded RSA key")?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .context("Unable to sign the service account assertion")
    }

    async fn fetch(&self) -> Res<AccessToken> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("Failed to send the token request to Google")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Google rejected the service account token request with status {status}: {body}");
        }

        let body: TokenResponse = response
            .json()
            .await
            .context("Failed to parse the token response from Google")?;
        Ok(AccessToken {
            value: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_margin() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(120),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(60)));
        assert!(!token.is_fresh(now + Duration::seconds(200)));
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let mut provider = TokenProvider::new(Credentials::new("svc@example.com", "not a key"));
        provider.token = Some(AccessToken {
            value: "cached".to_string(),
            expires_at: Utc::now() + Duration::seconds(3600),
        });
        assert_eq!(provider.token().await.unwrap(), "cached");
    }

    #[test]
    fn test_bad_private_key_is_an_error() {
        let provider = TokenProvider::new(Credentials::new("svc@example.com", "not a key"));
        let err = provider.assertion(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("private key"), "{err}");
    }
}
