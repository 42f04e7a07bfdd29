//! Content digests using BLAKE3.

use std::io::{self, Read};

use blake3::Hasher;

use distpatch_core::ContentDigest;

/// Compute the content digest of in-memory bytes.
pub fn digest(bytes: &[u8]) -> ContentDigest {
    ContentDigest::new(*blake3::hash(bytes).as_bytes())
}

/// Compute the content digest of a reader, draining it.
///
/// Returns the digest and the number of bytes read.
pub fn digest_reader<R: Read>(reader: &mut R) -> io::Result<(ContentDigest, u64)> {
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok((ContentDigest::new(*hasher.finalize().as_bytes()), total))
}
