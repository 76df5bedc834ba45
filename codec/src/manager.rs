use parcel_core::{CertificateStore, CodecError, CodecResult, MetricsSink, NullMetricsSink, RsaPrivateKey};
use parcel_proto::parcel::{AuthState, MessageList};
use prost::Message as _;
use rsa::pkcs8::DecodePrivateKey;

use crate::cache::SessionCache;
use crate::envelope::{self, MessageInfo};

/**
    Owns one identity's private key, canonical subject, peer certificate
    store, and both session caches; exposes the only surface callers
    outside this crate need: [`add_certificate`](Self::add_certificate),
    [`encode`](Self::encode), [`decode`](Self::decode), and
    [`decode_and_unpack`](Self::decode_and_unpack).

    There is exactly one `CryptoManager` per identity. It owns its RSA
    private key for its whole lifetime and never upgrades or rotates it —
    key-rotation policy is out of scope for this layer. The private
    key zeroizes its buffer on drop via the `rsa` crate's own `Drop` impl;
    every cached [`crate::session::CipherSession`]'s symmetric key material
    zeroizes the same way through `CipherProperties`'s `ZeroizeOnDrop`.
*/
pub struct CryptoManager {
    private_key: RsaPrivateKey,
    source: String,
    certs: CertificateStore,
    cache: SessionCache,
    metrics: Box<dyn MetricsSink>,
}

impl CryptoManager {
    /**
        Construct a manager for `source`, parsing `private_key_pem` as a
        PKCS#8 PEM-encoded RSA private key. The metrics sink defaults to
        [`NullMetricsSink`] — use [`with_metrics`](Self::with_metrics) to
        observe RSA operation counts.
    */
    pub fn new(private_key_pem: &str, source: impl Into<String>) -> CodecResult<Self> {
        Self::with_metrics(private_key_pem, source, Box::new(NullMetricsSink))
    }

    /// As [`new`](Self::new), but with an explicit metrics sink.
    pub fn with_metrics(
        private_key_pem: &str,
        source: impl Into<String>,
        metrics: Box<dyn MetricsSink>,
    ) -> CodecResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| CodecError::CertificateParse(format!("invalid private key: {e}")))?;

        Ok(Self {
            private_key,
            source: source.into(),
            certs: CertificateStore::new(),
            cache: SessionCache::new(),
            metrics,
        })
    }

    /// This identity's canonical subject, stamped into every outbound
    /// [`crate::session::CipherMetadata`] and every encoded payload's
    /// `PackedPayload.source`.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse and register a peer's PEM-encoded X.509 certificate.
    /// Returns the subject (Common Name) it was indexed under.
    pub fn add_certificate(&self, pem_bytes: &[u8]) -> CodecResult<String> {
        self.certs.put(pem_bytes)
    }

    /// Encode `plaintext` as a parcel addressed to `destination`.
    pub fn encode(&self, plaintext: &[u8], destination: &str) -> CodecResult<Vec<u8>> {
        envelope::encode(
            plaintext,
            destination,
            &self.source,
            &self.private_key,
            &self.certs,
            &self.cache,
            self.metrics.as_ref(),
        )
    }

    /// Decode and authenticate a parcel, returning its raw payload and
    /// authentication state.
    pub fn decode(&self, parcel_bytes: &[u8]) -> CodecResult<MessageInfo> {
        envelope::decode(parcel_bytes, &self.private_key, &self.certs, &self.cache, self.metrics.as_ref())
    }

    /**
        Decode a parcel, then further deserialize its raw payload as a
        [`MessageList`], stamping every contained message's `source` and
        `auth_state` from the envelope's authentication result rather than
        trusting whatever the sender may have put there.
    */
    pub fn decode_and_unpack(&self, parcel_bytes: &[u8]) -> CodecResult<MessageList> {
        let info = self.decode(parcel_bytes)?;
        let mut list = MessageList::decode(info.raw.as_slice())
            .map_err(|e| CodecError::MalformedInput(e.to_string()))?;

        let auth_state = if info.authenticated {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        for message in &mut list.job {
            message.source = info.source.clone();
            message.auth_state = auth_state as i32;
        }

        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::AtomicMetricsSink;
    use parcel_proto::parcel::Message as WireMessage;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};

    fn generate_manager(source: &str) -> (CryptoManager, RsaPrivateKey) {
        let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
        let pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let manager = CryptoManager::with_metrics(&pem, source, Box::new(AtomicMetricsSink::new())).unwrap();
        (manager, private_key)
    }

    #[test]
    fn source_is_recorded() {
        let (manager, _) = generate_manager("S");
        assert_eq!(manager.source(), "S");
    }

    #[test]
    fn decode_and_unpack_stamps_source_and_auth_state() {
        let (sender, sender_key) = generate_manager("S");
        let (receiver, receiver_key) = generate_manager("R");

        receiver
            .certs
            .put_raw_for_test("S", rsa::RsaPublicKey::from(&sender_key));
        sender
            .certs
            .put_raw_for_test("R", rsa::RsaPublicKey::from(&receiver_key));

        let list = MessageList {
            job: vec![WireMessage {
                session_id: "job-1".to_owned(),
                payload: b"payload bytes".to_vec(),
                source: "spoofed".to_owned(),
                auth_state: AuthState::Authenticated as i32,
            }],
        };

        let parcel_bytes = sender.encode(&list.encode_to_vec(), "R").unwrap();
        let decoded = receiver.decode_and_unpack(&parcel_bytes).unwrap();

        assert_eq!(decoded.job.len(), 1);
        assert_eq!(decoded.job[0].source, "S");
        assert_eq!(decoded.job[0].auth_state, AuthState::Authenticated as i32);
    }
}
