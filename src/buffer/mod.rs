use std::collections::TryReserveError;
use std::ffi::CStr;

/// Bytes added to the backing storage each time it fills up.
pub const BUFFER_GROW_BY: usize = 128;

/// A growable, append-only byte buffer that always keeps a trailing NUL
/// once it holds anything, so `as_text` never has to copy.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    // content followed by one NUL, or empty before the first push
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("could not grow buffer: {0}")]
    Alloc(#[from] TryReserveError),
}

impl ByteBuffer {
    pub fn new() -> Self {
        ByteBuffer { bytes: Vec::new() }
    }

    /// Drop the contents and release the backing storage.
    pub fn reset(&mut self) {
        self.bytes = Vec::new();
    }

    pub fn push(&mut self, byte: u8) -> Result<&mut Self, BufferError> {
        let needed = if self.bytes.is_empty() { 2 } else { 1 };
        if self.bytes.capacity() - self.bytes.len() < needed {
            self.bytes.try_reserve_exact(BUFFER_GROW_BY)?;
        }
        match self.bytes.last_mut() {
            Some(nul) => *nul = byte,
            None => self.bytes.push(byte),
        }
        self.bytes.push(0);
        Ok(self)
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<&mut Self, BufferError> {
        for &b in bytes {
            self.push(b)?;
        }
        Ok(self)
    }

    /// NUL-terminated view of the contents. If a NUL byte was pushed, the
    /// view ends there.
    pub fn as_text(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.bytes).unwrap_or(c"")
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self.bytes.split_last() {
            Some((_, content)) => content,
            None => &[],
        }
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.bytes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}
