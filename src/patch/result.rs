//! Finalized patches.

use std::fmt::Write as _;

use serde::Serialize;

/// An immutable patch: bytes to be copied verbatim starting at `address`.
///
/// Writing the bytes (and making the page writable first) is up to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchResult {
    address: usize,
    bytes: Vec<u8>,
}

impl PatchResult {
    pub(crate) fn new(address: usize, bytes: Vec<u8>) -> Self {
        Self { address, bytes }
    }

    /// Address the first byte must be written to.
    pub fn address(&self) -> usize {
        self.address
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// First address past the patch.
    pub fn end(&self) -> usize {
        self.address.wrapping_add(self.bytes.len())
    }

    /// Consume the result and return the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Space-separated uppercase hex, e.g. `9C 50 E8 ..`.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.bytes.len() * 3);
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{:02X}", b);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let result = PatchResult::new(0x1000, vec![0x90, 0xC3]);
        assert_eq!(result.address(), 0x1000);
        assert_eq!(result.len(), 2);
        assert_eq!(result.end(), 0x1002);
        assert!(!result.is_empty());
        assert_eq!(result.into_bytes(), vec![0x90, 0xC3]);
    }

    #[test]
    fn test_to_hex() {
        let result = PatchResult::new(0, vec![0x0F, 0x85, 0x00]);
        assert_eq!(result.to_hex(), "0F 85 00");
        assert_eq!(PatchResult::new(0, vec![]).to_hex(), "");
    }

    #[test]
    fn test_serialize_json() {
        let result = PatchResult::new(16, vec![1, 2]);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"address":16,"bytes":[1,2]}"#);
    }
}
