//! Authentication — session tokens, the revocation blacklist and the
//! access-control gate.
//!
//! # Lifecycle
//!
//! 1. **Login** (`POST /login`): credentials are checked against the store
//!    (Argon2 verification) and a signed HS256 token with a 1-hour window is
//!    returned. The server keeps no copy of it.
//! 2. **Use**: the gate middleware requires a valid, non-revoked token on
//!    every mutating request to a protected route group; reads are public.
//! 3. **Logout** (`POST /logout`): the raw token is blacklisted until the
//!    expiry encoded in it, after which the entry is reaped.

pub mod blacklist;
pub mod middleware;
pub mod password;
pub mod token;

use std::sync::Arc;

use tracing::debug;

use crate::store::{Store, UserRecord};
use crate::{Error, Result};

pub use blacklist::{TokenBlacklist, spawn_sweeper};
pub use middleware::{RequestPrincipal, access_control};
pub use token::{Claims, TokenService};

/// Coordinator for the token lifecycle — owns the token service and the
/// blacklist, borrows the credential store.
pub struct AuthService {
    /// Token issuance and verification
    pub tokens: TokenService,
    /// Revocation registry, shared with the background sweeper
    pub blacklist: Arc<TokenBlacklist>,
    store: Arc<dyn Store>,
}

impl AuthService {
    /// Wire the service from its parts.
    pub fn new(tokens: TokenService, blacklist: Arc<TokenBlacklist>, store: Arc<dyn Store>) -> Self {
        Self {
            tokens,
            blacklist,
            store,
        }
    }

    /// Authenticate a mutating request from its `token` header.
    ///
    /// Deny order is fixed: missing, revoked, invalid, unknown principal.
    /// Validation failures terminate here and never reach the store's CRUD
    /// paths.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<UserRecord> {
        let Some(token) = token else {
            return Err(Error::unauthorized("Missing token"));
        };

        if self.blacklist.is_revoked(token) {
            return Err(Error::unauthorized("You're logged out"));
        }

        let Some(claims) = self.tokens.verify(token) else {
            return Err(Error::unauthorized("Invalid token"));
        };

        match self.store.user_by_email(&claims.email).await? {
            Some(user) => {
                debug!(email = %user.email, "Authenticated request");
                Ok(user)
            }
            None => Err(Error::unauthorized("Unauthorised")),
        }
    }

    /// Verify credentials and issue a session token.
    ///
    /// Both an unknown email and a wrong password produce the same error —
    /// login must not disclose which half was wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let user = self
            .store
            .user_by_email(email)
            .await?
            .ok_or_else(|| Error::unauthorized("Invalid email or password"))?;

        if !password::verify_password(&user.password_hash, password) {
            return Err(Error::unauthorized("Invalid email or password"));
        }

        self.tokens.issue(user.id, &user.email)
    }

    /// Blacklist a token until its natural expiry.
    ///
    /// Returns the response message; logging out twice is a success, not an
    /// error.
    pub async fn logout(&self, token: Option<&str>) -> Result<&'static str> {
        let Some(token) = token else {
            return Err(Error::invalid("Missing token"));
        };

        if self.blacklist.is_revoked(token) {
            return Ok("Already logged out");
        }

        if self.tokens.verify(token).is_none() {
            return Err(Error::unauthorized("Invalid token"));
        }

        // Verified above; decode only to read the expiry for the blacklist
        if let Some(claims) = TokenService::decode_unverified(token) {
            self.blacklist.revoke(token, claims.exp * 1000);
        }
        Ok("Logout successful")
    }
}
