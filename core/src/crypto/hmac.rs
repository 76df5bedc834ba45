use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::CodecError;

type HmacSha1 = Hmac<Sha1>;

/**
    Compute the 20-byte HMAC-SHA1 of `data` under `key`.
*/
pub fn compute(key: &[u8], data: &[u8]) -> [u8; 20] {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/**
    Verify `tag` against HMAC-SHA1(`key`, `data`) in constant time.
*/
pub fn verify(key: &[u8], data: &[u8], tag: &[u8]) -> Result<(), CodecError> {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.verify_slice(tag).map_err(|_| CodecError::HmacMismatch)
}
