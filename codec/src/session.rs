use parcel_core::crypto::rsa as rsa_prim;
use parcel_core::{Certificate, CodecError, CodecResult, MetricsSink, RsaPrivateKey};
use parcel_proto::parcel::{CipherMetadata as WireCipherMetadata, CipherProperties as WireCipherProperties, HmacType};
use prost::Message as _;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

const ALGORITHM_NAME: &str = "aes_128_cbc";

/**
    The symmetric key material for one session. Zeroized on drop — this is
    the only place the three secrets live outside of wire-format bytes.
*/
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherProperties {
    pub aes_key: [u8; 16],
    pub metadata_iv: [u8; 16],
    pub hmac_key: [u8; 16],
}

impl CipherProperties {
    fn generate() -> Result<Self, CodecError> {
        let mut rng = OsRng;
        let mut aes_key = [0u8; 16];
        let mut metadata_iv = [0u8; 16];
        let mut hmac_key = [0u8; 16];
        rng.try_fill_bytes(&mut aes_key)
            .map_err(|e| CodecError::RngFailure(e.to_string()))?;
        rng.try_fill_bytes(&mut metadata_iv)
            .map_err(|e| CodecError::RngFailure(e.to_string()))?;
        rng.try_fill_bytes(&mut hmac_key)
            .map_err(|e| CodecError::RngFailure(e.to_string()))?;
        Ok(Self {
            aes_key,
            metadata_iv,
            hmac_key,
        })
    }

    pub(crate) fn to_wire(&self) -> WireCipherProperties {
        WireCipherProperties {
            name: ALGORITHM_NAME.to_owned(),
            key: self.aes_key.to_vec(),
            metadata_iv: self.metadata_iv.to_vec(),
            hmac_key: self.hmac_key.to_vec(),
            hmac_type: HmacType::FullHmac as i32,
        }
    }

    /**
        Build from a wire message received over the network. Fails if any
        key field has the wrong length — a conforming peer never sends
        anything else, so this doubles as tamper/corruption detection.
    */
    pub(crate) fn from_wire(wire: &WireCipherProperties) -> Result<Self, CodecError> {
        let aes_key: [u8; 16] = wire
            .key
            .as_slice()
            .try_into()
            .map_err(|_| CodecError::MalformedInput("cipher key must be 16 bytes".into()))?;
        let metadata_iv: [u8; 16] = wire
            .metadata_iv
            .as_slice()
            .try_into()
            .map_err(|_| CodecError::MalformedInput("metadata IV must be 16 bytes".into()))?;
        let hmac_key: [u8; 16] = wire
            .hmac_key
            .as_slice()
            .try_into()
            .map_err(|_| CodecError::MalformedInput("hmac key must be 16 bytes".into()))?;
        Ok(Self {
            aes_key,
            metadata_iv,
            hmac_key,
        })
    }
}

/**
    Binds a [`CipherProperties`] to the subject that minted it, signed over
    the serialized properties.
*/
#[derive(Clone)]
pub struct CipherMetadata {
    pub source: String,
    pub signature: Vec<u8>,
}

/**
    A full session: the symmetric key material, its signed binding to a
    subject, and both wrapped wire blobs ready to be dropped into a parcel
    unchanged on every reuse.
*/
#[derive(Clone)]
pub struct CipherSession {
    pub properties: CipherProperties,
    pub metadata: CipherMetadata,
    pub encrypted_cipher: Vec<u8>,
    pub encrypted_cipher_metadata: Vec<u8>,
}

impl CipherSession {
    /**
        Mint a fresh outbound session addressed to `peer_cert`, signed as
        `source` under `private_key`. This is the only place RSA sign and
        RSA encrypt happen for a given peer — everything after is cached
        and reused until eviction.

        A non-RSA peer certificate is already rejected at
        `CertificateStore::put` time, since `Certificate` has no
        representation for any other key algorithm.
    */
    pub fn new_outbound(
        source: &str,
        private_key: &RsaPrivateKey,
        peer_cert: &Certificate,
        metrics: &dyn MetricsSink,
    ) -> CodecResult<Self> {
        let properties = CipherProperties::generate()?;
        let serialized_properties = properties.to_wire().encode_to_vec();

        let signature = rsa_prim::pkcs1v15_sign(private_key, &serialized_properties)?;
        metrics.counter("rsa.sign").inc(1);

        let encrypted_cipher = rsa_prim::oaep_encrypt(peer_cert.public_key(), &serialized_properties)?;
        metrics.counter("rsa.encrypt").inc(1);

        let metadata = CipherMetadata {
            source: source.to_owned(),
            signature,
        };
        let serialized_metadata = WireCipherMetadata {
            source: metadata.source.clone(),
            signature: metadata.signature.clone(),
        }
        .encode_to_vec();

        let encrypted_cipher_metadata = parcel_core::crypto::aes::encrypt_padded(
            &properties.aes_key,
            &properties.metadata_iv,
            &serialized_metadata,
        )?;

        Ok(Self {
            properties,
            metadata,
            encrypted_cipher,
            encrypted_cipher_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_keys() {
        let a = CipherProperties::generate().unwrap();
        let b = CipherProperties::generate().unwrap();
        assert_ne!(a.aes_key, b.aes_key);
        assert_ne!(a.metadata_iv, b.metadata_iv);
        assert_ne!(a.hmac_key, b.hmac_key);
    }

    #[test]
    fn wire_round_trip_preserves_keys() {
        let props = CipherProperties::generate().unwrap();
        let wire = props.to_wire();
        assert_eq!(wire.name, ALGORITHM_NAME);
        let back = CipherProperties::from_wire(&wire).unwrap();
        assert_eq!(back.aes_key, props.aes_key);
        assert_eq!(back.metadata_iv, props.metadata_iv);
        assert_eq!(back.hmac_key, props.hmac_key);
    }

    #[test]
    fn from_wire_rejects_short_key() {
        let mut wire = CipherProperties::generate().unwrap().to_wire();
        wire.key.truncate(8);
        assert!(matches!(
            CipherProperties::from_wire(&wire).unwrap_err(),
            CodecError::MalformedInput(_)
        ));
    }
}
