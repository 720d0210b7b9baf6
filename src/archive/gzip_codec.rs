//! Single-member GZIP codec

use crate::error::{Result, SnapshotError};
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Read;

/// Gzip-compress a byte slice at the given level (0-9).
pub fn compress(data: &[u8], level: u32, origin: &str) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(data, Compression::new(level.min(9)));
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| SnapshotError::io(origin, e))?;
    Ok(compressed)
}

/// Gunzip the first member of a byte slice.
pub fn decompress(data: &[u8], origin: &str) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SnapshotError::io(origin, e))?;
    Ok(decompressed)
}
