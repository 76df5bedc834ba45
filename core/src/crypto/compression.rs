use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::CodecError;

/**
    Zlib-deflate `data` at the default compression level.
*/
pub fn deflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CodecError::CompressionError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::CompressionError(e.to_string()))
}

/**
    Zlib-inflate `data`.
*/
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CodecError::CompressionError(e.to_string()))?;
    Ok(out)
}
