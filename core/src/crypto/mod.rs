/*
    Primitive wrappers around the legacy algorithm choices the wire format
    is pinned to: AES-128-CBC with PKCS#7 padding, HMAC-SHA1, RSA-OAEP(SHA1),
    and RSA-PKCS1v1.5(SHA256). None of these are swapped for a modern
    equivalent — the envelope must stay byte-compatible with existing peers.
*/

pub mod aes;
pub mod compression;
pub mod hmac;
pub mod rsa;
