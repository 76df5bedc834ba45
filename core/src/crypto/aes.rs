use aes::{
    Aes128,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray},
};

use crate::error::CodecError;

/**
    Apply PKCS#7 padding to `data` for a given block size.

    Appends 1..=block_size bytes, each carrying the padding length. A buffer
    that is already block-aligned still gets a full extra block, so the
    padding length is always recoverable from the last byte alone.
*/
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let pad = block_size - (data.len() % block_size);
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    out.resize(data.len() + pad, pad as u8);
    out
}

/**
    Remove PKCS#7 padding from a decrypted AES-CBC plaintext.

    The last byte gives the padding length N (1..=block_size); all N
    trailing bytes must equal N. Any other shape is rejected rather than
    silently truncated.
*/
pub fn pkcs7_unpad(data: &[u8], block_size: usize) -> Result<Vec<u8>, CodecError> {
    if data.is_empty() || !data.len().is_multiple_of(block_size) {
        return Err(CodecError::PaddingInvalid);
    }

    let pad = data[data.len() - 1] as usize;
    if pad == 0 || pad > block_size || pad > data.len() {
        return Err(CodecError::PaddingInvalid);
    }

    if data[data.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(CodecError::PaddingInvalid);
    }

    Ok(data[..data.len() - pad].to_vec())
}

/**
    AES-128-CBC encrypt `plaintext` (already PKCS#7 padded) under `key`/`iv`.

    `key` and `iv` must both be 16 bytes; `plaintext` must be a non-zero
    multiple of 16 bytes.
*/
pub fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    if key.len() != 16 {
        return Err(CodecError::MalformedInput(
            "AES-128-CBC key must be 16 bytes".into(),
        ));
    }
    if iv.len() != 16 {
        return Err(CodecError::MalformedInput(
            "AES-128-CBC IV must be 16 bytes".into(),
        ));
    }
    if plaintext.is_empty() || !plaintext.len().is_multiple_of(16) {
        return Err(CodecError::MalformedInput(
            "AES-128-CBC plaintext must be non-empty and block-aligned".into(),
        ));
    }

    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut ciphertext = Vec::with_capacity(plaintext.len());
    let mut prev: [u8; 16] = iv.try_into().unwrap();

    for chunk in plaintext.chunks_exact(16) {
        let mut block = [0u8; 16];
        for i in 0..16 {
            block[i] = chunk[i] ^ prev[i];
        }
        let mut block = GenericArray::from(block);
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(&block);
        ciphertext.extend_from_slice(&block);
    }

    Ok(ciphertext)
}

/**
    AES-128-CBC decrypt `ciphertext` under `key`/`iv`. Returns the raw
    (still PKCS#7-padded) plaintext; callers strip padding via
    [`pkcs7_unpad`].
*/
pub fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CodecError> {
    if key.len() != 16 {
        return Err(CodecError::MalformedInput(
            "AES-128-CBC key must be 16 bytes".into(),
        ));
    }
    if iv.len() != 16 {
        return Err(CodecError::MalformedInput(
            "AES-128-CBC IV must be 16 bytes".into(),
        ));
    }
    if ciphertext.is_empty() || !ciphertext.len().is_multiple_of(16) {
        return Err(CodecError::MalformedInput(
            "AES-128-CBC ciphertext must be non-empty and block-aligned".into(),
        ));
    }

    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut prev: [u8; 16] = iv.try_into().unwrap();

    for chunk in ciphertext.chunks_exact(16) {
        let saved: [u8; 16] = chunk.try_into().unwrap();
        let mut block = *GenericArray::from_slice(chunk);
        cipher.decrypt_block(&mut block);
        for i in 0..16 {
            plaintext.push(block[i] ^ prev[i]);
        }
        prev = saved;
    }

    Ok(plaintext)
}

/**
    Pad-then-encrypt convenience wrapper used throughout the envelope layer.
*/
pub fn encrypt_padded(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let padded = pkcs7_pad(plaintext, 16);
    cbc_encrypt(key, iv, &padded)
}

/**
    Decrypt-then-unpad convenience wrapper used throughout the envelope layer.
*/
pub fn decrypt_padded(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let raw = cbc_decrypt(key, iv, ciphertext)?;
    pkcs7_unpad(&raw, 16)
}
