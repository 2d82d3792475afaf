//! Deduplicating string pool writer

use std::collections::HashMap;

/// Builds the NUL-separated string pool of a star catalog
///
/// Offset 0 always holds an empty string and doubles as "absent". Each
/// distinct string is stored once.
#[derive(Debug, Clone)]
pub struct StringPoolBuilder {
    bytes: Vec<u8>,
    offsets: HashMap<String, i32>,
}

impl StringPoolBuilder {
    pub fn new() -> Self {
        Self {
            bytes: vec![0],
            offsets: HashMap::new(),
        }
    }

    /// Offset of `value`, interning it on first use; 0 for absent or blank
    pub fn offset_or_zero(&mut self, value: Option<&str>) -> i32 {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return 0;
        };
        if let Some(&offset) = self.offsets.get(value) {
            return offset;
        }
        let offset = self.bytes.len() as i32;
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.push(0);
        self.offsets.insert(value.to_string(), offset);
        offset
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for StringPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
