//! Session tokens — HS256 JWTs with a fixed validity window.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Clock-skew tolerance applied when validating `exp`, in seconds. The
/// blacklist holds revoked entries through the same window so a logged-out
/// token can never outlive its revocation entry.
pub const LEEWAY_SECS: u64 = 60;

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject's user id
    pub id: i64,
    /// Subject's email, used for principal lookup on each request
    pub email: String,
    /// Issued-at (Unix epoch seconds)
    pub iat: u64,
    /// Expires-at (Unix epoch seconds)
    pub exp: u64,
}

/// Issues and verifies session tokens. No side effects beyond signing; the
/// server keeps no copy of issued tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create from the resolved signing secret and the configured TTL.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a signed token for the given principal.
    pub fn issue(&self, id: i64, email: &str) -> Result<String> {
        let now = now_secs();
        let claims = Claims {
            id,
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("token signing failed: {e}")))
    }

    /// Validate signature and expiry, returning the claims.
    ///
    /// Returns `None` on any structural, signature or expiry failure —
    /// callers must not distinguish the failure subtype beyond
    /// "unauthenticated".
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = LEEWAY_SECS;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .ok()
            .map(|data| data.claims)
    }

    /// Extract claims without verifying the signature.
    ///
    /// Used only to read `exp` when blacklisting a token at logout; the
    /// token has already passed [`verify`](Self::verify) at that point.
    #[must_use]
    pub fn decode_unverified(token: &str) -> Option<Claims> {
        let mut parts = token.splitn(3, '.');
        let _header = parts.next()?;
        let payload = parts.next()?;

        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            payload,
        )
        .ok()?;

        serde_json::from_slice(&bytes).ok()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
