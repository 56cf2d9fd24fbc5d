use super::{Error, Marshal};

/// First referent id handed out for non-null unique pointers.
const FIRST_REFERENT_ID: u32 = 0x0002_0000;

/// An append-only buffer producing a stub.
#[derive(Debug)]
pub struct Writer {
    buf: Vec<u8>,
    next_referent: u32,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            next_referent: FIRST_REFERENT_ID,
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Return `true` if nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pad with zeros until the length is a multiple of `alignment`.
    ///
    /// An alignment of 0 or 1 never pads.
    pub fn align(&mut self, alignment: usize) {
        if alignment <= 1 {
            return;
        }
        let pad = (alignment - self.buf.len() % alignment) % alignment;
        self.buf.resize(self.buf.len() + pad, 0);
    }

    /// Append raw bytes without alignment.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Write a 2-byte aligned `u16`.
    pub fn write_u16(&mut self, v: u16) {
        self.align(2);
        self.write_bytes(&v.to_le_bytes());
    }

    /// Write a 4-byte aligned `u32`.
    pub fn write_u32(&mut self, v: u32) {
        self.align(4);
        self.write_bytes(&v.to_le_bytes());
    }

    /// Write an 8-byte aligned `u64`.
    pub fn write_u64(&mut self, v: u64) {
        self.align(8);
        self.write_bytes(&v.to_le_bytes());
    }

    /// Write a conformance or variance count.
    pub fn write_count(&mut self, len: usize) -> Result<(), Error> {
        let count = u32::try_from(len).map_err(|_| Error::TooLarge { len })?;
        self.write_u32(count);
        Ok(())
    }

    /// Write the referent id of a non-null unique pointer.
    pub fn write_referent(&mut self) {
        let id = self.next_referent;
        self.next_referent = self.next_referent.wrapping_add(4).max(FIRST_REFERENT_ID);
        self.write_u32(id);
    }

    /// Encode `value`.
    pub fn write<T: Marshal + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value.marshal(self)
    }

    /// Return the encoded stub.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
