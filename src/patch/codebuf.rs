//! Append-only byte buffer anchored at an absolute address.
//!
//! A [`PatchBuilder`] accumulates the bytes of a patch that will later be
//! written, verbatim, starting at its anchor address. Every append consumes
//! the builder and hands back the extended one, so an older state can never
//! be observed after it has grown.

use super::result::PatchResult;

/// A patch under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchBuilder {
    /// Absolute address the first byte will occupy
    anchor: usize,
    /// The patch bytes accumulated so far
    code: Vec<u8>,
}

impl PatchBuilder {
    /// Start an empty patch at `addr`.
    pub fn new(addr: usize) -> Self {
        Self {
            anchor: addr,
            code: Vec::new(),
        }
    }

    /// Start an empty patch at `addr` with pre-allocated capacity.
    pub fn with_capacity(addr: usize, capacity: usize) -> Self {
        Self {
            anchor: addr,
            code: Vec::with_capacity(capacity),
        }
    }

    /// Start an empty patch at the address of `ptr`.
    pub fn at_ptr<T>(ptr: *const T) -> Self {
        Self::new(ptr as usize)
    }

    /// Get the anchor address.
    pub fn address(&self) -> usize {
        self.anchor
    }

    /// Get the current size of the patch.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Absolute address of the next byte to be appended.
    pub fn cursor(&self) -> usize {
        self.anchor.wrapping_add(self.code.len())
    }

    /// Get the patch bytes (for inspection).
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Append a single byte.
    pub fn byte(mut self, byte: u8) -> Self {
        self.code.push(byte);
        self
    }

    /// Append several bytes in order.
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.code.extend_from_slice(bytes);
        self
    }

    /// Append a 16-bit value (little-endian).
    pub fn word(self, value: u16) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    /// Append a 32-bit value (little-endian).
    pub fn dword(self, value: u32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    /// Freeze the patch into the result handed to the memory writer.
    pub fn finalize(self) -> PatchResult {
        tracing::debug!(
            address = format_args!("{:#x}", self.anchor),
            len = self.code.len(),
            "patch finalized"
        );
        PatchResult::new(self.anchor, self.code)
    }
}
