use std::collections::HashMap;
use std::sync::RwLock;

use rsa::{BigUint, RsaPublicKey};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use crate::error::{CodecError, CodecResult};

/**
    An identifier used by an external addressing scheme that this codec's
    peers still carry around. Subjects compared for certificate lookup are
    normalized through this prefix strip before comparison.
*/
const LEGACY_SUBJECT_PREFIX: &str = "aff4:/";

/**
    Strip a legacy `"aff4:/"` prefix from a subject identifier, if present.

    Certificate lookups always go through this function so that a peer
    addressing itself with or without the prefix resolves to the same
    registered certificate.
*/
pub fn normalize_subject(subject: &str) -> &str {
    subject.strip_prefix(LEGACY_SUBJECT_PREFIX).unwrap_or(subject)
}

/**
    A registered peer certificate: its canonical subject (Common Name) and
    its RSA public key, extracted once at registration time.
*/
#[derive(Debug, Clone)]
pub struct Certificate {
    subject: String,
    public_key: RsaPublicKey,
}

impl Certificate {
    /// The certificate's Common Name, used as the cache/store key.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The RSA public key extracted from the certificate.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }
}

/**
    Many-readers/single-writer store of peer certificates, indexed by
    Common Name.
*/
#[derive(Default)]
pub struct CertificateStore {
    certs: RwLock<HashMap<String, Certificate>>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Parse a PEM-encoded X.509 certificate and register it under its
        Common Name. Rejects certificates whose public key is not RSA.
    */
    pub fn put(&self, pem_bytes: &[u8]) -> CodecResult<String> {
        let (_, pem) =
            parse_x509_pem(pem_bytes).map_err(|e| CodecError::CertificateParse(e.to_string()))?;
        let cert = pem
            .parse_x509()
            .map_err(|e| CodecError::CertificateParse(e.to_string()))?;

        let subject = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .ok_or_else(|| CodecError::CertificateParse("certificate has no common name".into()))?
            .to_owned();

        let parsed_key = cert
            .public_key()
            .parsed()
            .map_err(|e| CodecError::CertificateParse(e.to_string()))?;
        let PublicKey::RSA(rsa_key) = parsed_key else {
            return Err(CodecError::KeyAlgorithmUnsupported);
        };

        let public_key = RsaPublicKey::new(
            BigUint::from_bytes_be(rsa_key.modulus),
            BigUint::from_bytes_be(rsa_key.exponent),
        )
        .map_err(|e| CodecError::CertificateParse(e.to_string()))?;

        self.certs.write().unwrap().insert(
            subject.clone(),
            Certificate {
                subject: subject.clone(),
                public_key,
            },
        );

        Ok(subject)
    }

    /**
        Look up a certificate by subject, normalizing the legacy `"aff4:/"`
        prefix first.
    */
    pub fn get(&self, subject: &str) -> Option<Certificate> {
        let subject = normalize_subject(subject);
        self.certs.read().unwrap().get(subject).cloned()
    }
}

#[cfg(feature = "test-support")]
impl CertificateStore {
    /**
        Register `public_key` directly under `subject`, bypassing PEM/X.509
        parsing entirely. Only available under the `test-support` feature —
        real peers are always registered through [`CertificateStore::put`]
        with an actual certificate; this exists so tests elsewhere in the
        workspace can build a store from a bare in-memory RSA keypair.
    */
    pub fn put_raw_for_test(&self, subject: &str, public_key: RsaPublicKey) {
        self.certs.write().unwrap().insert(
            subject.to_owned(),
            Certificate {
                subject: subject.to_owned(),
                public_key,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_legacy_prefix() {
        assert_eq!(normalize_subject("aff4:/C.abcdef"), "C.abcdef");
        assert_eq!(normalize_subject("C.abcdef"), "C.abcdef");
    }

    #[test]
    fn normalize_only_strips_leading_prefix() {
        assert_eq!(
            normalize_subject("nested/aff4:/C.abcdef"),
            "nested/aff4:/C.abcdef"
        );
    }

    #[test]
    fn get_on_empty_store_is_none() {
        let store = CertificateStore::new();
        assert!(store.get("C.anything").is_none());
    }
}
