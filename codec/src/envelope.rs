use parcel_core::crypto::{aes, compression, rsa as rsa_prim};
use parcel_core::{Certificate, CertificateStore, CodecError, CodecResult, MetricsSink, RsaPrivateKey};
use parcel_proto::parcel::{
    CipherMetadata as WireCipherMetadata, CipherProperties as WireCipherProperties,
    CompressionType, Parcel, PackedPayload as WirePackedPayload,
};
use prost::Message as _;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::cache::SessionCache;
use crate::session::{CipherMetadata, CipherSession};

/// The only api_version this codec speaks. Never bumped silently — a wire
/// revision changes peers simultaneously, not this constant alone.
pub const API_VERSION: u32 = 3;

/**
    The result of a successful [`decode`]: the plaintext payload the sender
    compressed and wrapped, whether the sending session chained to a known
    certificate, and the subject the sender stamped into the payload.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub raw: Vec<u8>,
    pub authenticated: bool,
    pub source: String,
}

fn hmac_input(
    encrypted: &[u8],
    encrypted_cipher: &[u8],
    encrypted_cipher_metadata: &[u8],
    packet_iv: &[u8],
    api_version: u32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        encrypted.len() + encrypted_cipher.len() + encrypted_cipher_metadata.len() + packet_iv.len() + 4,
    );
    buf.extend_from_slice(encrypted);
    buf.extend_from_slice(encrypted_cipher);
    buf.extend_from_slice(encrypted_cipher_metadata);
    buf.extend_from_slice(packet_iv);
    buf.extend_from_slice(&api_version.to_le_bytes());
    buf
}

fn or_build_outbound_session(
    destination: &str,
    source: &str,
    private_key: &RsaPrivateKey,
    certs: &CertificateStore,
    cache: &SessionCache,
    metrics: &dyn MetricsSink,
) -> CodecResult<CipherSession> {
    if let Some(session) = cache.outbound_get(destination) {
        log::debug!(target: "parcel_codec::envelope", "outbound cache hit for {destination}");
        return Ok(session);
    }

    log::debug!(target: "parcel_codec::envelope", "outbound cache miss for {destination}, minting session");
    let peer_cert: Certificate = certs
        .get(destination)
        .ok_or_else(|| CodecError::UnknownPeer(destination.to_owned()))?;

    let session = CipherSession::new_outbound(source, private_key, &peer_cert, metrics)?;
    cache.outbound_insert(destination.to_owned(), session.clone());
    Ok(session)
}

/**
    Assemble a parcel carrying `plaintext` addressed to `destination`.

    Reuses (or mints, on first contact) the outbound [`CipherSession`] for
    `destination`, compresses and frames `plaintext` as a [`WirePackedPayload`],
    and seals it under a fresh `packet_iv` before computing the HMAC that
    binds every wrapped field together.
*/
pub fn encode(
    plaintext: &[u8],
    destination: &str,
    source: &str,
    private_key: &RsaPrivateKey,
    certs: &CertificateStore,
    cache: &SessionCache,
    metrics: &dyn MetricsSink,
) -> CodecResult<Vec<u8>> {
    let session = or_build_outbound_session(destination, source, private_key, certs, cache, metrics)?;

    let compressed = compression::deflate(plaintext)?;
    let packed = WirePackedPayload {
        message_list: compressed,
        compression: CompressionType::Zcompression as i32,
        source: source.to_owned(),
    };
    let serialized_payload = packed.encode_to_vec();

    let mut rng = OsRng;
    let mut packet_iv = [0u8; 16];
    rng.try_fill_bytes(&mut packet_iv)
        .map_err(|e| CodecError::RngFailure(e.to_string()))?;

    let encrypted = aes::encrypt_padded(&session.properties.aes_key, &packet_iv, &serialized_payload)?;

    let mut parcel = Parcel {
        api_version: API_VERSION,
        encrypted_cipher: session.encrypted_cipher.clone(),
        encrypted_cipher_metadata: session.encrypted_cipher_metadata.clone(),
        packet_iv: packet_iv.to_vec(),
        encrypted,
        full_hmac: Vec::new(),
    };

    let full_hmac = parcel_core::crypto::hmac::compute(
        &session.properties.hmac_key,
        &hmac_input(
            &parcel.encrypted,
            &parcel.encrypted_cipher,
            &parcel.encrypted_cipher_metadata,
            &parcel.packet_iv,
            parcel.api_version,
        ),
    );
    parcel.full_hmac = full_hmac.to_vec();

    Ok(parcel.encode_to_vec())
}

/**
    Disassemble and authenticate a parcel, returning its plaintext payload.

    HMAC is checked before any RSA signature work so a malformed or
    replayed parcel is rejected as cheaply
    as possible, and the inbound session cache is only ever populated once
    a session has reached the AUTHENTICATED state. Nothing is cached, and
    no partial [`MessageInfo`] is returned, on any failure path.
*/
pub fn decode(
    parcel_bytes: &[u8],
    private_key: &RsaPrivateKey,
    certs: &CertificateStore,
    cache: &SessionCache,
    metrics: &dyn MetricsSink,
) -> CodecResult<MessageInfo> {
    let parcel = Parcel::decode(parcel_bytes).map_err(|e| CodecError::MalformedInput(e.to_string()))?;

    if parcel.packet_iv.len() != 16 {
        return Err(CodecError::MalformedInput("packet_iv must be 16 bytes".into()));
    }
    if parcel.full_hmac.len() != 20 {
        return Err(CodecError::MalformedInput("full_hmac must be 20 bytes".into()));
    }

    let input = hmac_input(
        &parcel.encrypted,
        &parcel.encrypted_cipher,
        &parcel.encrypted_cipher_metadata,
        &parcel.packet_iv,
        parcel.api_version,
    );

    let (properties, authenticated) = match cache.inbound_get(&parcel.encrypted_cipher) {
        Some(session) => {
            log::debug!(target: "parcel_codec::envelope", "inbound cache hit");
            parcel_core::crypto::hmac::verify(&session.properties.hmac_key, &input, &parcel.full_hmac)?;
            (session.properties, true)
        }
        None => {
            log::debug!(target: "parcel_codec::envelope", "inbound cache miss, bootstrapping session");
            let session = bootstrap_inbound_session(&parcel, &input, private_key, certs, metrics)?;
            cache.inbound_insert(parcel.encrypted_cipher.clone(), session.clone());
            (session.properties, true)
        }
    };

    let serialized_payload = aes::decrypt_padded(&properties.aes_key, &parcel.packet_iv, &parcel.encrypted)?;
    let packed = WirePackedPayload::decode(serialized_payload.as_slice())
        .map_err(|e| CodecError::MalformedInput(e.to_string()))?;

    let raw = match CompressionType::try_from(packed.compression) {
        Ok(CompressionType::Zcompression) => compression::inflate(&packed.message_list)?,
        Ok(CompressionType::None) | Err(_) => packed.message_list,
    };

    Ok(MessageInfo {
        raw,
        authenticated,
        source: packed.source,
    })
}

/// Drives a session from PROVISIONAL to AUTHENTICATED or REJECTED:
/// RSA-decrypt the wrapped properties, verify HMAC, then verify the
/// sender's signature under a known certificate. Never touches the cache
/// itself.
fn bootstrap_inbound_session(
    parcel: &Parcel,
    hmac_input_bytes: &[u8],
    private_key: &RsaPrivateKey,
    certs: &CertificateStore,
    metrics: &dyn MetricsSink,
) -> CodecResult<CipherSession> {
    let serialized_properties = rsa_prim::oaep_decrypt(private_key, &parcel.encrypted_cipher)?;
    metrics.counter("rsa.decrypt").inc(1);

    let wire_properties = WireCipherProperties::decode(serialized_properties.as_slice())
        .map_err(|e| CodecError::MalformedInput(e.to_string()))?;
    let properties = crate::session::CipherProperties::from_wire(&wire_properties)?;

    // PROVISIONAL: cipher decrypted. Verify HMAC before any signature work.
    parcel_core::crypto::hmac::verify(&properties.hmac_key, hmac_input_bytes, &parcel.full_hmac)?;

    let serialized_metadata = aes::decrypt_padded(
        &properties.aes_key,
        &properties.metadata_iv,
        &parcel.encrypted_cipher_metadata,
    )?;
    let wire_metadata = WireCipherMetadata::decode(serialized_metadata.as_slice())
        .map_err(|e| CodecError::MalformedInput(e.to_string()))?;

    let cert = certs.get(&wire_metadata.source).ok_or_else(|| {
        log::warn!(target: "parcel_codec::envelope", "no certificate for peer '{}'", wire_metadata.source);
        CodecError::UnknownPeer(wire_metadata.source.clone())
    })?;

    rsa_prim::pkcs1v15_verify(cert.public_key(), &serialized_properties, &wire_metadata.signature).inspect_err(
        |_| log::warn!(target: "parcel_codec::envelope", "signature invalid for peer '{}'", wire_metadata.source),
    )?;
    metrics.counter("rsa.verify").inc(1);

    log::debug!(target: "parcel_codec::envelope", "session for '{}' reached AUTHENTICATED", wire_metadata.source);

    Ok(CipherSession {
        properties,
        metadata: CipherMetadata {
            source: wire_metadata.source,
            signature: wire_metadata.signature,
        },
        encrypted_cipher: parcel.encrypted_cipher.clone(),
        encrypted_cipher_metadata: parcel.encrypted_cipher_metadata.clone(),
    })
}
