mod certstore;
mod error;
mod metrics;

pub mod crypto;

pub use self::certstore::{Certificate, CertificateStore, normalize_subject};
pub use self::error::{CodecError, CodecResult};
pub use self::metrics::{AtomicMetricsSink, Counter, MetricsSink, NullMetricsSink};

pub use rsa::{RsaPrivateKey, RsaPublicKey};
