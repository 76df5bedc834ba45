use thiserror::Error;

/**
    Errors produced by the transport codec's cryptographic primitives,
    certificate store, and envelope layer.
*/
#[derive(Debug, Error)]
pub enum CodecError {
    // ── structural ─────────────────────────────────────────────────────
    #[error("malformed input: {0}")]
    MalformedInput(String),

    // ── symmetric layer ────────────────────────────────────────────────
    #[error("invalid PKCS#7 padding")]
    PaddingInvalid,

    #[error("HMAC verification failed")]
    HmacMismatch,

    // ── certificate / identity ─────────────────────────────────────────
    #[error("no certificate registered for peer '{0}'")]
    UnknownPeer(String),

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("certificate public key algorithm is not RSA")]
    KeyAlgorithmUnsupported,

    // ── platform ────────────────────────────────────────────────────────
    #[error("secure random generator failed: {0}")]
    RngFailure(String),

    #[error("compression error: {0}")]
    CompressionError(String),

    // ── wrapped library errors ──────────────────────────────────────────
    #[error("RSA operation failed: {0}")]
    RsaOperation(String),

    #[error("certificate parse failed: {0}")]
    CertificateParse(String),
}

/**
    Result alias for fallible operations in this crate and its dependents.
*/
pub type CodecResult<T> = std::result::Result<T, CodecError>;
