//! Connection-oriented PDU headers that correlate replies with requests.
//!
//! Each header starts with the call id taken from the common header, followed by the
//! body fields of the request, response or fault PDU. The stub itself follows the
//! header and is opaque at this layer.

use uuid::Uuid;

use crate::ndr::{self, Marshal, Reader, Unmarshal, Writer};

/// Fault status codes reported in [`Fault`] PDUs.
pub mod status {
    /// The operation number is out of range for the interface.
    pub const NCA_S_OP_RNG_ERROR: u32 = 0x1c01_0002;
    /// The interface is unknown to the server.
    pub const NCA_S_UNK_IF: u32 = 0x1c01_0003;
    /// A protocol error was detected.
    pub const NCA_S_PROTO_ERROR: u32 = 0x1c01_000b;
    /// The call was cancelled.
    pub const NCA_S_FAULT_CANCEL: u32 = 0x1c00_000d;
    /// Unspecified server fault.
    pub const NCA_S_FAULT_UNSPEC: u32 = 0x1c00_0012;
    /// The server ran out of memory.
    pub const NCA_S_FAULT_REMOTE_NO_MEMORY: u32 = 0x1c00_001b;
    /// The stub data could not be decoded.
    pub const NCA_S_FAULT_NDR: u32 = 0x0000_06f7;
    /// The requested operation is not supported.
    pub const RPC_S_CANNOT_SUPPORT: u32 = 0x0000_06e4;
}

/// Common header flag announcing an object UUID in the request body.
pub const PFC_OBJECT_UUID: u8 = 0x80;

/// Header of an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestHeader {
    /// Correlates the reply with this request.
    pub call_id: u32,
    /// Hint of the total stub size across fragments.
    pub alloc_hint: u32,
    /// Presentation context the call is made on.
    pub context_id: u16,
    /// The operation to invoke.
    pub opnum: u16,
    /// Optional object the call is directed at.
    pub object: Option<Uuid>,
}

impl RequestHeader {
    /// Read a request header, including the object UUID if `has_object` is set.
    ///
    /// `has_object` comes from the [`PFC_OBJECT_UUID`] bit of the common header's flags.
    pub fn read(r: &mut Reader<'_>, has_object: bool) -> Result<Self, ndr::Error> {
        let call_id = r.read_u32()?;
        let alloc_hint = r.read_u32()?;
        let context_id = r.read_u16()?;
        let opnum = r.read_u16()?;
        let object = if has_object { Some(Uuid::unmarshal(r)?) } else { None };
        Ok(Self {
            call_id,
            alloc_hint,
            context_id,
            opnum,
            object,
        })
    }

    /// Decode a complete request header from `bytes`, rejecting anything left over.
    pub fn decode(bytes: &[u8], has_object: bool) -> Result<Self, ndr::Error> {
        let mut r = Reader::new(bytes);
        let header = Self::read(&mut r, has_object)?;
        r.finish()?;
        Ok(header)
    }

    /// The common header flags this request contributes: [`PFC_OBJECT_UUID`] if it has an object.
    pub fn pfc_flags(&self) -> u8 {
        if self.object.is_some() {
            PFC_OBJECT_UUID
        } else {
            0
        }
    }

    /// A request header for `opnum` on presentation context `context_id`.
    pub fn new(call_id: u32, context_id: u16, opnum: u16) -> Self {
        Self {
            call_id,
            context_id,
            opnum,
            ..Default::default()
        }
    }
}

/// Header of a successful reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseHeader {
    /// Copied from the request.
    pub call_id: u32,
    /// Size of the stub that follows.
    pub alloc_hint: u32,
    /// Copied from the request.
    pub context_id: u16,
    /// Number of cancels received for the call.
    pub cancel_count: u8,
}

impl ResponseHeader {
    /// The reply header for `request` carrying a stub of `stub_len` bytes.
    pub fn reply_to(request: &RequestHeader, stub_len: usize) -> Self {
        Self {
            call_id: request.call_id,
            alloc_hint: u32::try_from(stub_len).unwrap_or(u32::MAX),
            context_id: request.context_id,
            cancel_count: 0,
        }
    }
}

/// Header of a fault reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fault {
    /// Copied from the request.
    pub call_id: u32,
    /// Size of the stub that follows, usually zero.
    pub alloc_hint: u32,
    /// Copied from the request.
    pub context_id: u16,
    /// Number of cancels received for the call.
    pub cancel_count: u8,
    /// One of the [`status`] codes.
    pub status: u32,
}

impl Fault {
    /// The fault header answering `request` with `status`.
    pub fn reply_to(request: &RequestHeader, status: u32) -> Self {
        Self {
            call_id: request.call_id,
            alloc_hint: 0,
            context_id: request.context_id,
            cancel_count: 0,
            status,
        }
    }
}

// The object UUID is present only when the common header carries `PFC_OBJECT_UUID`,
// so it is written raw without a referent.
impl Marshal for RequestHeader {
    fn marshal(&self, w: &mut Writer) -> Result<(), ndr::Error> {
        w.write_u32(self.call_id);
        w.write_u32(self.alloc_hint);
        w.write_u16(self.context_id);
        w.write_u16(self.opnum);
        match &self.object {
            Some(object) => w.write(object),
            None => Ok(()),
        }
    }
}

impl Marshal for ResponseHeader {
    fn marshal(&self, w: &mut Writer) -> Result<(), ndr::Error> {
        w.write_u32(self.call_id);
        w.write_u32(self.alloc_hint);
        w.write_u16(self.context_id);
        w.write_u8(self.cancel_count);
        w.write_u8(0);
        Ok(())
    }
}

impl Unmarshal for ResponseHeader {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, ndr::Error> {
        let header = Self {
            call_id: r.read_u32()?,
            alloc_hint: r.read_u32()?,
            context_id: r.read_u16()?,
            cancel_count: r.read_u8()?,
        };
        let _pad = r.read_u8()?;
        Ok(header)
    }
}

impl Marshal for Fault {
    fn marshal(&self, w: &mut Writer) -> Result<(), ndr::Error> {
        w.write_u32(self.call_id);
        w.write_u32(self.alloc_hint);
        w.write_u16(self.context_id);
        w.write_u8(self.cancel_count);
        w.write_u8(0);
        w.write_u32(self.status);
        w.write_u32(0);
        Ok(())
    }
}

impl Unmarshal for Fault {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, ndr::Error> {
        let call_id = r.read_u32()?;
        let alloc_hint = r.read_u32()?;
        let context_id = r.read_u16()?;
        let cancel_count = r.read_u8()?;
        let _flags = r.read_u8()?;
        let status = r.read_u32()?;
        let _reserved = r.read_u32()?;
        Ok(Self {
            call_id,
            alloc_hint,
            context_id,
            cancel_count,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_header_with_object_round_trips() {
        let header = RequestHeader {
            object: Some(Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef)),
            alloc_hint: 64,
            ..RequestHeader::new(7, 1, 15)
        };
        let bytes = ndr::to_vec(&header).unwrap();
        assert_eq!(bytes.len(), 12 + 16, "the object follows the opnum without a referent");
        assert_eq!(header.pfc_flags(), PFC_OBJECT_UUID);
        assert_eq!(RequestHeader::decode(&bytes, true).unwrap(), header);
    }

    #[test]
    fn request_header_without_object_is_twelve_bytes() {
        let wire = [1, 0, 0, 0, 8, 0, 0, 0, 0, 0, 5, 0];
        let header = RequestHeader::decode(&wire, false).unwrap();
        assert_eq!(
            header,
            RequestHeader {
                alloc_hint: 8,
                ..RequestHeader::new(1, 0, 5)
            }
        );
        assert_eq!(header.pfc_flags(), 0);
        assert_eq!(ndr::to_vec(&header).unwrap(), wire);
    }

    #[test]
    fn object_presence_comes_from_the_flags() {
        let wire = [1, 0, 0, 0, 8, 0, 0, 0, 0, 0, 5, 0];
        assert!(matches!(
            RequestHeader::decode(&wire, true),
            Err(ndr::Error::UnexpectedEof { offset: 12, .. })
        ));
    }

    #[test]
    fn replies_echo_the_correlation_fields() {
        let request = RequestHeader::new(42, 3, 9);
        let response = ResponseHeader::reply_to(&request, 128);
        assert_eq!(
            response,
            ResponseHeader {
                call_id: 42,
                alloc_hint: 128,
                context_id: 3,
                cancel_count: 0
            }
        );

        let fault = Fault::reply_to(&request, status::NCA_S_OP_RNG_ERROR);
        assert_eq!((fault.call_id, fault.context_id), (42, 3));
        let bytes = ndr::to_vec(&fault).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(ndr::from_slice::<Fault>(&bytes).unwrap(), fault);
    }
}
