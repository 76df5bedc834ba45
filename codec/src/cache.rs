use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::session::CipherSession;

/// Default bound for each direction's LRU map.
pub const DEFAULT_CAPACITY: usize = 1000;

/**
    The bidirectional session cache (C4): two independent, bounded LRU maps
    so a costly RSA sign/encrypt (outbound) or RSA decrypt/verify (inbound)
    is paid at most once per peer rather than once per parcel.

    Outbound is keyed by destination subject; inbound is keyed by the raw
    `encrypted_cipher` bytes of the parcel that established the session.
    Each map is behind its own `Mutex` — contention is acceptable since the
    protected section never performs a public-key operation.
*/
pub struct SessionCache {
    outbound: Mutex<LruCache<String, CipherSession>>,
    inbound: Mutex<LruCache<Vec<u8>, CipherSession>>,
}

impl SessionCache {
    /// Construct a cache with the default 1000-entry bound per direction.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Construct a cache with an explicit per-direction capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            outbound: Mutex::new(LruCache::new(capacity)),
            inbound: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a cached outbound session for `destination`, marking it
    /// most-recently-used on hit.
    pub fn outbound_get(&self, destination: &str) -> Option<CipherSession> {
        self.outbound.lock().unwrap().get(destination).cloned()
    }

    /// Insert or replace the outbound session for `destination`.
    pub fn outbound_insert(&self, destination: String, session: CipherSession) {
        self.outbound.lock().unwrap().put(destination, session);
    }

    /// Number of cached outbound sessions (test/diagnostic use).
    pub fn outbound_len(&self) -> usize {
        self.outbound.lock().unwrap().len()
    }

    /// Look up a cached inbound session by the wrapped-key blob, marking it
    /// most-recently-used on hit.
    pub fn inbound_get(&self, encrypted_cipher: &[u8]) -> Option<CipherSession> {
        self.inbound.lock().unwrap().get(encrypted_cipher).cloned()
    }

    /// Insert or replace the inbound session for `encrypted_cipher`. Only
    /// ever called once a session has reached the AUTHENTICATED state.
    pub fn inbound_insert(&self, encrypted_cipher: Vec<u8>, session: CipherSession) {
        self.inbound.lock().unwrap().put(encrypted_cipher, session);
    }

    /// Number of cached inbound sessions (test/diagnostic use).
    pub fn inbound_len(&self) -> usize {
        self.inbound.lock().unwrap().len()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CipherMetadata, CipherProperties};

    fn dummy_session(tag: u8) -> CipherSession {
        CipherSession {
            properties: CipherProperties {
                aes_key: [tag; 16],
                metadata_iv: [tag; 16],
                hmac_key: [tag; 16],
            },
            metadata: CipherMetadata {
                source: "S".to_owned(),
                signature: vec![tag],
            },
            encrypted_cipher: vec![tag; 8],
            encrypted_cipher_metadata: vec![tag; 16],
        }
    }

    #[test]
    fn outbound_miss_then_hit() {
        let cache = SessionCache::new();
        assert!(cache.outbound_get("dest").is_none());
        cache.outbound_insert("dest".to_owned(), dummy_session(1));
        assert!(cache.outbound_get("dest").is_some());
    }

    #[test]
    fn inbound_keyed_by_wrapped_blob() {
        let cache = SessionCache::new();
        let key = vec![9u8; 8];
        assert!(cache.inbound_get(&key).is_none());
        cache.inbound_insert(key.clone(), dummy_session(2));
        assert!(cache.inbound_get(&key).is_some());
    }

    #[test]
    fn capacity_is_enforced_with_lru_eviction() {
        let cache = SessionCache::with_capacity(2);
        cache.outbound_insert("a".to_owned(), dummy_session(1));
        cache.outbound_insert("b".to_owned(), dummy_session(2));
        cache.outbound_insert("c".to_owned(), dummy_session(3));
        assert_eq!(cache.outbound_len(), 2);
        assert!(cache.outbound_get("a").is_none());
        assert!(cache.outbound_get("b").is_some());
        assert!(cache.outbound_get("c").is_some());
    }

    #[test]
    fn get_refreshes_recency() {
        let cache = SessionCache::with_capacity(2);
        cache.outbound_insert("a".to_owned(), dummy_session(1));
        cache.outbound_insert("b".to_owned(), dummy_session(2));
        // touch "a" so "b" becomes the least-recently-used entry
        assert!(cache.outbound_get("a").is_some());
        cache.outbound_insert("c".to_owned(), dummy_session(3));
        assert!(cache.outbound_get("b").is_none());
        assert!(cache.outbound_get("a").is_some());
        assert!(cache.outbound_get("c").is_some());
    }

    #[test]
    fn default_capacity_holds_exactly_1000_and_evicts_lru() {
        let cache = SessionCache::new();
        for i in 0..1001u32 {
            cache.outbound_insert(format!("dest-{i}"), dummy_session((i % 256) as u8));
        }
        assert_eq!(cache.outbound_len(), DEFAULT_CAPACITY);
        assert!(cache.outbound_get("dest-0").is_none());
        assert!(cache.outbound_get("dest-1").is_some());
        assert!(cache.outbound_get("dest-1000").is_some());
    }
}
