//! Sequential cursor over an immutable byte buffer.
//!
//! Fixed-width integers are read in the stream's configured byte order
//! (little-endian unless chosen otherwise). Every read either consumes exactly
//! the requested bytes or fails with an [`UnderrunError`] and leaves the cursor
//! where it was.

/// Byte order used for multi-byte integer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// The stream ran out of bytes before a read could be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("underrun at offset {offset}: expected {expected} bytes, got {actual}")]
pub struct UnderrunError {
    pub expected: usize,
    pub actual: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct ByteStream<'a> {
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> ByteStream<'a> {
    /// Little-endian stream over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_order(data, ByteOrder::Little)
    }

    pub fn with_order(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            pos: 0,
            order,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Absolute position of the cursor from the start of the buffer.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_len() == 0
    }

    /// Consumes exactly `n` bytes and returns them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], UnderrunError> {
        let remaining = self.remaining_len();
        if remaining < n {
            return Err(UnderrunError {
                expected: n,
                actual: remaining,
                offset: self.pos,
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), UnderrunError> {
        self.read_bytes(n).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], UnderrunError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, UnderrunError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, UnderrunError> {
        let raw = self.read_array::<2>()?;
        Ok(match self.order {
            ByteOrder::Little => u16::from_le_bytes(raw),
            ByteOrder::Big => u16::from_be_bytes(raw),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32, UnderrunError> {
        let raw = self.read_array::<4>()?;
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(raw),
            ByteOrder::Big => u32::from_be_bytes(raw),
        })
    }

    /// Reads text up to (and consumes, but excludes) the first zero byte, or up
    /// to the end of the buffer when no terminator follows.
    ///
    /// Bytes are taken as Latin-1, so every byte maps to exactly one `char`
    /// and nothing is lost for non-UTF-8 server strings. Calling this on an
    /// exhausted stream is an underrun: there is no field to read at all.
    pub fn read_zero_terminated_string(&mut self) -> Result<String, UnderrunError> {
        if self.is_empty() {
            return Err(UnderrunError {
                expected: 1,
                actual: 0,
                offset: self.pos,
            });
        }

        let rest = &self.data[self.pos..];
        let (text, consumed) = match rest.iter().position(|&b| b == 0) {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        Ok(latin1_to_string(text))
    }
}

/// Maps each byte to the `char` with the same code point.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
