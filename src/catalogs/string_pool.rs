//! Read-only view of a catalog string pool
//!
//! The pool is one buffer of NUL-terminated UTF-8 strings. Offset 0 holds an
//! empty string and stands for "absent". Strings are decoded on demand; the
//! pool is never split up front.

use crate::errors::CatalogError;

#[derive(Debug, Clone, Default)]
pub struct StringPool {
    bytes: Vec<u8>,
}

impl StringPool {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// String starting at `offset`
    ///
    /// Returns `Ok(None)` for offset 0 and for an empty run. Fails with
    /// [`CatalogError::MalformedStringOffset`] when the offset is negative,
    /// past the end, has no terminating NUL or is not valid UTF-8.
    pub fn resolve(&self, offset: i32) -> Result<Option<&str>, CatalogError> {
        if offset == 0 {
            return Ok(None);
        }
        let malformed = || CatalogError::MalformedStringOffset {
            offset: offset as i64,
            pool_size: self.bytes.len(),
        };

        let start = usize::try_from(offset).map_err(|_| malformed())?;
        let tail = self.bytes.get(start..).filter(|t| !t.is_empty()).ok_or_else(malformed)?;
        let end = tail.iter().position(|&b| b == 0).ok_or_else(malformed)?;
        let text = std::str::from_utf8(&tail[..end]).map_err(|_| malformed())?;

        Ok((!text.is_empty()).then_some(text))
    }
}
