//! Content digest utilities
//!
//! The data write path reports an MD5 content digest for every stored
//! object, computed incrementally so large bodies never have to be
//! buffered whole.

use md5::Context;

/// Streaming MD5 digest writer.
///
/// Feed chunks with [`update`](Self::update) as they arrive, then call
/// [`finalize`](Self::finalize) for the lowercase hex digest.
pub struct Md5Writer {
    ctx: Context,
    bytes_written: u64,
}

impl Md5Writer {
    /// Create a new digest writer
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctx: Context::new(),
            bytes_written: 0,
        }
    }

    /// Absorb a chunk of data
    pub fn update(&mut self, chunk: &[u8]) {
        self.ctx.consume(chunk);
        self.bytes_written += chunk.len() as u64;
    }

    /// Total number of bytes absorbed so far
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Finish and return the hex-encoded digest
    #[must_use]
    pub fn finalize(self) -> String {
        hex::encode(self.ctx.compute().0)
    }
}

impl Default for Md5Writer {
    fn default() -> Self {
        Self::new()
    }
}
