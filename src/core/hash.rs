//! Board Digests
//!
//! SHA-256 digests of board state. The session records one digest per turn
//! as its board history instead of copying the whole grid.

use sha2::{Digest, Sha256};
use super::point::Point;

/// Digest output type (256 bits / 32 bytes)
pub type BoardDigest = [u8; 32];

/// Domain separator mixed into every board digest.
const BOARD_DOMAIN: &[u8] = b"EVASION_BOARD_V1";

/// Incremental digest of board contents. Write order is significant.
pub struct BoardHasher {
    inner: Sha256,
}

impl BoardHasher {
    /// Start a digest for a `width` x `height` board.
    pub fn new(width: u32, height: u32) -> Self {
        let mut hasher = Self { inner: Sha256::new() };
        hasher.inner.update(BOARD_DOMAIN);
        hasher.write_u32(width);
        hasher.write_u32(height);
        hasher
    }

    /// Mix in a counter or id, little-endian.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.inner.update(value.to_le_bytes());
    }

    /// Mix in a coordinate as two little-endian `i32`s.
    #[inline]
    pub fn write_point(&mut self, point: Point) {
        self.inner.update(point.x.to_le_bytes());
        self.inner.update(point.y.to_le_bytes());
    }

    /// Finish the digest.
    pub fn finish(self) -> BoardDigest {
        self.inner.finalize().into()
    }
}

/// Digest a board: dimensions first, then whatever `write` adds.
pub fn compute_board_digest<F>(width: u32, height: u32, write: F) -> BoardDigest
where
    F: FnOnce(&mut BoardHasher),
{
    let mut hasher = BoardHasher::new(width, height);
    write(&mut hasher);
    hasher.finish()
}
