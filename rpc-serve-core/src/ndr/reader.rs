use super::{Error, Unmarshal};

/// A cursor over a borrowed request or response stub.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The current offset from the start of the stub.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Return `true` if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Skip padding so the next read starts at a multiple of `alignment`.
    ///
    /// An alignment of 0 or 1 never skips anything.
    pub fn align(&mut self, alignment: usize) -> Result<(), Error> {
        if alignment <= 1 {
            return Ok(());
        }
        let pad = (alignment - self.pos % alignment) % alignment;
        self.read_bytes(pad).map(|_| ())
    }

    /// Borrow the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < len {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        self.align(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.read_array::<1>().map(|b| b[0])
    }

    /// Read a 2-byte aligned `u16`.
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a 4-byte aligned `u32`.
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read an 8-byte aligned `u64`.
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read a conformance or variance count, ensuring at least `min_element_size`
    /// bytes per announced element are still available.
    pub fn read_count(&mut self, min_element_size: usize) -> Result<u32, Error> {
        let offset = self.pos;
        let count = self.read_u32()?;
        if (count as usize).saturating_mul(min_element_size) > self.remaining() {
            return Err(Error::CountOutOfRange {
                offset,
                count,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    /// Decode a value of type `T`.
    pub fn read<T: Unmarshal>(&mut self) -> Result<T, Error> {
        T::unmarshal(self)
    }

    /// Consume the reader, failing if any bytes were left unread.
    pub fn finish(self) -> Result<(), Error> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }
}
