//! BLAKE3 content hashing.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Hash of an in-memory buffer, used once the file has been read for decoding.
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Streaming hash of a file on disk, for callers that have not read it yet.
pub fn file_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
