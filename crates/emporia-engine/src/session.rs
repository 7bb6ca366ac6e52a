//! # Session Store
//!
//! Per-session cart storage with idle expiry.
//!
//! Each browser session owns exactly one cart, keyed by its session id.
//! Carts have no cross-session visibility and never reserve stock; an
//! expired session simply starts over with an empty cart on next access.
//!
//! ## Thread Safety
//! The store is wrapped in a `Mutex` because engine operations may run
//! concurrently on different sessions. Each session's cart has a single
//! writer (its own session), so the lock is held only for the duration
//! of one closure and never across an await point.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use emporia_core::Cart;

struct SessionEntry {
    cart: Cart,
    last_seen: Instant,
}

/// In-process session cart store.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// Creates a store with the given idle timeout.
    pub fn new(idle_timeout: Duration) -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Executes a function with read access to the session's cart.
    ///
    /// A missing or expired session reads as a fresh empty cart.
    pub fn with_cart<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let mut sessions = self.sessions.lock().expect("session store mutex poisoned");
        let entry = Self::entry(&mut sessions, session_id, self.idle_timeout);
        f(&entry.cart)
    }

    /// Executes a function with write access to the session's cart.
    pub fn with_cart_mut<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut sessions = self.sessions.lock().expect("session store mutex poisoned");
        let entry = Self::entry(&mut sessions, session_id, self.idle_timeout);
        f(&mut entry.cart)
    }

    /// Drops the session's cart entirely.
    pub fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("session store mutex poisoned");
        sessions.remove(session_id);
    }

    /// Removes every session idle past the timeout. Returns how many
    /// were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().expect("session store mutex poisoned");
        let before = sessions.len();
        let timeout = self.idle_timeout;
        sessions.retain(|_, entry| entry.last_seen.elapsed() < timeout);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged = purged, "Purged expired sessions");
        }
        purged
    }

    /// Number of live sessions (for diagnostics).
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store mutex poisoned").len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry<'a>(
        sessions: &'a mut HashMap<String, SessionEntry>,
        session_id: &str,
        idle_timeout: Duration,
    ) -> &'a mut SessionEntry {
        let expired = sessions
            .get(session_id)
            .map(|e| e.last_seen.elapsed() >= idle_timeout)
            .unwrap_or(false);
        if expired {
            debug!(session_id = %session_id, "Session expired, starting fresh cart");
            sessions.remove(session_id);
        }

        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                cart: Cart::new(),
                last_seen: Instant::now(),
            });
        entry.last_seen = Instant::now();
        entry
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
