//! Revocation blacklist — logged-out tokens held until their natural expiry.
//!
//! Entries map the raw token string to the expiry encoded in the token
//! itself; the registry never extends or shortens validity. Entries past
//! expiry plus the verification leeway are removed lazily on access and by
//! a periodic background sweep. The
//! sweep is purely an optimization — correctness never depends on its
//! timing because [`TokenBlacklist::is_revoked`] self-cleans.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use tracing::debug;

use super::token::LEEWAY_SECS;

// An entry is dead only once the token would fail verification, which
// happens `LEEWAY_SECS` after `exp` — evicting at `exp` itself would let a
// revoked token authenticate again for the rest of the leeway window.
const GRACE_MS: u64 = LEEWAY_SECS * 1000;

/// Shared blacklist of revoked tokens. Owned by the server's process-lifetime
/// context and injected where needed — never a module-level singleton.
#[derive(Default)]
pub struct TokenBlacklist {
    entries: DashMap<String, u64>,
}

impl TokenBlacklist {
    /// Create an empty blacklist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token until `expires_at_ms` (Unix epoch milliseconds).
    ///
    /// Idempotent: revoking an already-revoked token overwrites the entry
    /// with the same expiry and is a no-op success.
    pub fn revoke(&self, token: &str, expires_at_ms: u64) {
        self.entries.insert(token.to_string(), expires_at_ms);
    }

    /// Whether a token is currently revoked.
    ///
    /// An entry past its expiry plus the verification leeway is deleted and
    /// `false` returned — the token is moot at that point (it would fail
    /// verification anyway), and self-cleaning keeps the registry bounded.
    pub fn is_revoked(&self, token: &str) -> bool {
        if let Some(entry) = self.entries.get(token) {
            if now_millis() > entry.value().saturating_add(GRACE_MS) {
                drop(entry);
                self.entries.remove(token);
                debug!("Lazy-evicted expired blacklist entry");
                return false;
            }
            return true;
        }
        false
    }

    /// Remove every entry past its expiry plus the verification leeway,
    /// returning how many were removed.
    ///
    /// One short critical section per entry; no table-wide lock is held for
    /// the duration of the scan.
    pub fn sweep(&self) -> usize {
        let now = now_millis();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| now > entry.value().saturating_add(GRACE_MS))
            .map(|entry| entry.key().clone())
            .collect();

        let count = expired.len();
        for token in expired {
            self.entries.remove(&token);
        }
        count
    }

    /// Number of live entries (expired-but-unswept included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the blacklist holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn now_millis() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis();
    u64::try_from(now).unwrap_or(u64::MAX)
}

/// Spawn a background task that sweeps the blacklist every `interval`.
///
/// The task exits when the `shutdown` receiver fires. It must never block
/// request handling; the sweep itself takes no long-held lock.
pub fn spawn_sweeper(
    blacklist: Arc<TokenBlacklist>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let swept = blacklist.sweep();
                    if swept > 0 {
                        debug!(count = swept, "Swept expired blacklist entries");
                    }
                }
                _ = shutdown.recv() => {
                    debug!("Blacklist sweeper shutting down");
                    break;
                }
            }
        }
    });
}
