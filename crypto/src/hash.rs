//! SHA-256 hashing.

use sha2::{Digest, Sha256};
use spine_types::Hash256;
use std::io;

/// Compute the SHA-256 digest of arbitrary data.
pub fn sha256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    finish(hasher)
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256_multi(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    finish(hasher)
}

fn finish(hasher: Sha256) -> Hash256 {
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Hash256::new(output)
}

/// An `io::Write` sink that hashes everything written to it.
///
/// Lets file contents be streamed through `io::copy` instead of read whole.
#[derive(Default)]
pub struct Sha256Writer {
    hasher: Sha256,
}

impl Sha256Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Hash256 {
        finish(self.hasher)
    }
}

impl io::Write for Sha256Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hasher.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
