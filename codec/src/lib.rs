/*
    The cipher session builder (C3), the bidirectional session cache (C4),
    the envelope codec (C5), and the crypto manager facade (C6). Builds on
    `parcel-core`'s primitive wrappers and certificate store, and on
    `parcel-proto`'s generated wire messages.
*/

mod cache;
mod envelope;
mod manager;
mod session;

pub use self::envelope::{API_VERSION, MessageInfo};
pub use self::manager::CryptoManager;
pub use self::session::{CipherMetadata, CipherProperties, CipherSession};

pub use parcel_core::{CodecError, CodecResult};
