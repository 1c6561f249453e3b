use crate::config::{ConfigError, TOKEN_EXPIRY_SECONDS_VAR};
use crate::crypto::RsaSigningKey;
use crate::errors::StartupError;
use crate::observability::metrics::record_token_issuance;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::instrument;

/// Identity a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub username: String,
    pub account_id: String,
    pub display_name: String,
}

/// User token claims.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub user: String,
    /// Account identifier
    pub acct: String,
    /// Display name
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("user", &self.user)
            .field("acct", &"[REDACTED]")
            .field("name", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Issues RS256 user tokens with a fixed lifetime.
#[derive(Debug)]
pub struct TokenIssuer {
    signing_key: RsaSigningKey,
    expiry_seconds: u64,
}

impl TokenIssuer {
    /// # Errors
    ///
    /// `StartupError::Config` if `expiry_seconds` is zero or does not fit a
    /// Unix timestamp offset.
    pub fn new(signing_key: RsaSigningKey, expiry_seconds: u64) -> Result<Self, StartupError> {
        if expiry_seconds == 0 || i64::try_from(expiry_seconds).is_err() {
            return Err(ConfigError::InvalidValue {
                var: TOKEN_EXPIRY_SECONDS_VAR.to_string(),
                reason: format!(
                    "token lifetime must be between 1 and {} seconds, got {expiry_seconds}",
                    i64::MAX
                ),
            }
            .into());
        }

        Ok(Self {
            signing_key,
            expiry_seconds,
        })
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Public half of the signing key, DER `RSAPublicKey`.
    pub fn public_key_der(&self) -> &[u8] {
        self.signing_key.public_key_der()
    }

    /// Issue a token for `subject`, valid from now for the configured
    /// lifetime.
    ///
    /// # Errors
    ///
    /// `StartupError::Signing` if claims cannot be encoded or the RSA
    /// operation fails.
    #[instrument(skip_all)]
    pub fn issue_token(&self, subject: &TokenSubject) -> Result<String, StartupError> {
        let start = Instant::now();
        let result = self.sign_claims(subject);

        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(status, start.elapsed());

        if let Err(e) = &result {
            tracing::warn!(target: "token", error = %e, "Token issuance failed");
        }
        result
    }

    fn sign_claims(&self, subject: &TokenSubject) -> Result<String, StartupError> {
        let iat = Utc::now().timestamp();
        // Range checked in new()
        let lifetime = i64::try_from(self.expiry_seconds)
            .map_err(|e| StartupError::Signing(format!("invalid token lifetime: {e}")))?;

        let claims = Claims {
            user: subject.username.clone(),
            acct: subject.account_id.clone(),
            name: subject.display_name.clone(),
            iat,
            exp: iat.saturating_add(lifetime),
        };

        let header = Header::new(Algorithm::RS256);
        let signing_input = format!(
            "{}.{}",
            encode_segment(&header)?,
            encode_segment(&claims)?
        );

        let signature = self.signing_key.sign_rs256(signing_input.as_bytes())?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, StartupError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| StartupError::Signing(format!("Failed to encode token segment: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}
