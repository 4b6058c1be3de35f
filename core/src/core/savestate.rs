//! Save-state primitives.
//!
//! States are a flat little-endian byte stream with a fixed field order; no
//! tags, no self-description. Serializing, restoring, and serializing again
//! must yield byte-identical output, so every chip writes exactly the fields
//! it reads back, in the same order.

/// Errors that can occur when restoring a save state.
#[derive(Debug)]
pub enum StateError {
    /// The stream does not start with the expected magic bytes.
    BadMagic,
    /// The stream was produced by an incompatible version.
    BadVersion { expected: u8, actual: u8 },
    /// The stream ended before all fields were read.
    UnexpectedEof,
    /// The stream has bytes left over after all fields were read.
    TrailingData,
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadMagic => write!(f, "not a save state (bad magic)"),
            Self::BadVersion { expected, actual } => {
                write!(f, "save state version {actual}, expected {expected}")
            }
            Self::UnexpectedEof => write!(f, "save state truncated"),
            Self::TrailingData => write!(f, "save state has trailing data"),
        }
    }
}

impl std::error::Error for StateError {}

/// Appends fields to a growing byte vector.
pub struct StateWriter {
    buf: Vec<u8>,
}

impl StateWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for StateWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumes fields from a byte stream in the order they were written.
pub struct StateReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StateReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], StateError> {
        if self.pos + n > self.data.len() {
            return Err(StateError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, StateError> {
        Ok(self.take(1)?[0])
    }

    pub fn bool(&mut self) -> Result<bool, StateError> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn u16(&mut self) -> Result<u16, StateError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn u32(&mut self) -> Result<u32, StateError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn u64(&mut self) -> Result<u64, StateError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn i16(&mut self) -> Result<i16, StateError> {
        Ok(i16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn bytes(&mut self, out: &mut [u8]) -> Result<(), StateError> {
        out.copy_from_slice(self.take(out.len())?);
        Ok(())
    }

    /// Succeeds only if every byte of the stream has been consumed.
    pub fn finish(self) -> Result<(), StateError> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(StateError::TrailingData)
        }
    }
}
