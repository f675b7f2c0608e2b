//! Session token encoding and verification.
//!
//! Tokens are compact JWTs signed with HMAC-SHA256:
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(hmac_sha256(secret, header "." claims))
//! ```
//!
//! Claims carry `user_id`, `iat`, `exp` (Unix seconds) and a random `jti`, so
//! two tokens issued to the same user in the same second still differ.
//!
//! Verification order matters: an expired token is reported as
//! [`TokenError::Expired`] whether or not its signature verifies.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use tally_core::UserId;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Errors produced while issuing or verifying a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No signing secret is configured.
    #[error("signing secret is not configured")]
    MissingSecret,

    /// The token is not three base64url segments of JSON.
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    /// The header names an algorithm other than HS256.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not verify under the configured secret.
    #[error("signature mismatch")]
    BadSignature,

    /// The `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// A required claim is missing or not integer-representable.
    #[error("invalid claim: {0}")]
    InvalidClaims(&'static str),

    /// Serializing a token failed.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Verified token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token.
    pub user_id: UserId,
    /// When the token was issued, if the claim was present.
    pub issued_at: Option<DateTime<Utc>>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Serialize)]
struct WireClaims<'a> {
    user_id: i32,
    iat: i64,
    exp: i64,
    jti: &'a str,
}

/// Issues and verifies session tokens with a server-held secret.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Option<SecretString>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec. With `None`, every issue and verify call fails.
    #[must_use]
    pub const fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Whether a signing secret is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Issue a token for `user_id` valid for `ttl` from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MissingSecret` if no secret is configured.
    pub fn issue(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(String, Claims), TokenError> {
        let mac = self.mac()?;

        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encoding("expiry out of range".to_string()))?;

        let mut nonce = [0u8; 16];
        rand::rng().fill_bytes(&mut nonce);
        let jti = hex::encode(nonce);

        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };
        let claims = WireClaims {
            user_id: user_id.as_i32(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: &jti,
        };

        let header = encode_segment(&header)?;
        let payload = encode_segment(&claims)?;
        let signing_input = format!("{header}.{payload}");
        let signature = sign(mac, &signing_input);

        let token = format!("{signing_input}.{signature}");
        let claims = Claims {
            user_id,
            issued_at: DateTime::from_timestamp(now.timestamp(), 0),
            expires_at: DateTime::from_timestamp(expires_at.timestamp(), 0).unwrap_or(expires_at),
        };

        Ok((token, claims))
    }

    /// Verify a presented token at time `now`.
    ///
    /// # Errors
    ///
    /// - `TokenError::MissingSecret` if no secret is configured
    /// - `TokenError::Malformed` / `UnsupportedAlgorithm` / `BadSignature` for
    ///   tokens that fail format or signature checks
    /// - `TokenError::Expired` if `exp` is not in the future
    /// - `TokenError::InvalidClaims` if `user_id` or `exp` is missing or not an integer
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mac = self.mac()?;

        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed("expected three segments"));
        };

        let header: Header = decode_json(header_b64, "header")?;
        let payload: Value = decode_json(payload_b64, "claims")?;
        let payload = payload
            .as_object()
            .ok_or(TokenError::Malformed("claims are not an object"))?;

        let exp = payload.get("exp").and_then(integer_claim);
        if exp.is_some_and(|exp| exp <= now.timestamp()) {
            return Err(TokenError::Expired);
        }

        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed("signature is not base64url"))?;
        let mut mac = mac;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let user_id = payload
            .get("user_id")
            .and_then(integer_claim)
            .ok_or(TokenError::InvalidClaims("user_id"))?;
        let user_id = UserId::try_from(user_id).map_err(|_| TokenError::InvalidClaims("user_id"))?;

        let expires_at = exp
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or(TokenError::InvalidClaims("exp"))?;
        let issued_at = payload
            .get("iat")
            .and_then(integer_claim)
            .and_then(|iat| DateTime::from_timestamp(iat, 0));

        Ok(Claims {
            user_id,
            issued_at,
            expires_at,
        })
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        let secret = self.secret.as_ref().ok_or(TokenError::MissingSecret)?;
        HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

/// Read a numeric claim as an integer.
///
/// Accepts JSON integers and floats with no fractional part, since some
/// encoders emit every number as a double.
#[allow(clippy::cast_possible_truncation)] // range and fraction checked before the cast
fn integer_claim(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    let f = number.as_f64()?;
    #[allow(clippy::cast_precision_loss)] // bounds only need to be approximately i64
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then(|| f as i64)
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_json<T: serde::de::DeserializeOwned>(
    segment: &str,
    what: &'static str,
) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed(what))?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed(what))
}

fn sign(mut mac: HmacSha256, signing_input: &str) -> String {
    mac.update(signing_input.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}
