//! Consumed Refresh-Token Registry
//! Mission: Enforce single-use refresh tokens across concurrent rotations

use parking_lot::Mutex;
use std::collections::HashMap;

/// Process-wide registry of refresh tokens that have been exchanged or
/// explicitly revoked at logout. Constructed once and injected; never a
/// language-level global.
///
/// Each entry records the token's own expiry so [`purge_expired`] can evict
/// entries whose token the codec would reject anyway.
///
/// [`purge_expired`]: RefreshRegistry::purge_expired
#[derive(Default)]
pub struct RefreshRegistry {
    consumed: Mutex<HashMap<String, i64>>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-set: records the token as consumed and reports
    /// whether this caller was the first to do so. Two concurrent rotations
    /// of the same token serialize on the lock, so exactly one sees `true`.
    pub fn consume(&self, token: &str, expires_at: i64) -> bool {
        self.consumed
            .lock()
            .insert(token.to_string(), expires_at)
            .is_none()
    }

    /// Idempotent insert, used by logout where no winner needs picking.
    pub fn mark_consumed(&self, token: &str, expires_at: i64) {
        self.consumed.lock().insert(token.to_string(), expires_at);
    }

    /// Membership check.
    pub fn is_consumed(&self, token: &str) -> bool {
        self.consumed.lock().contains_key(token)
    }

    /// Drop entries whose token expiry has passed. Returns how many were
    /// removed. Signature validation already rejects those tokens, so
    /// tracking them further only wastes memory.
    pub fn purge_expired(&self, now: i64) -> usize {
        let mut consumed = self.consumed.lock();
        let before = consumed.len();
        consumed.retain(|_, expires_at| *expires_at > now);
        before - consumed.len()
    }

    pub fn len(&self) -> usize {
        self.consumed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.lock().is_empty()
    }

    /// Clear the registry. For test harnesses only; no route reaches this.
    pub fn reset(&self) {
        self.consumed.lock().clear();
    }
}
