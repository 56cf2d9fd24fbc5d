//! Interface identities: the UUID and version pair an interface is bound by.

use std::fmt;

pub use uuid::Uuid;

use crate::ndr::{self, Marshal, Reader, Unmarshal, Writer};

/// Major and minor version of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    /// Incompatible revisions bump the major version.
    pub major: u16,
    /// Compatible additions bump the minor version.
    pub minor: u16,
}

impl Version {
    /// Create a new version.
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Return `true` if a client asking for `requested` can be served by this version.
    ///
    /// Majors must match exactly and the server must be at least as new as the client.
    pub fn serves(&self, requested: Version) -> bool {
        self.major == requested.major && self.minor >= requested.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// A stable identity token for an interface (abstract syntax) or encoding (transfer syntax).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyntaxId {
    /// Interface UUID.
    pub uuid: Uuid,
    /// Interface version.
    pub version: Version,
}

impl SyntaxId {
    /// The NDR 2.0 transfer syntax, `8a885d04-1ceb-11c9-9fe8-08002b104860 v2.0`.
    pub const NDR20: SyntaxId = SyntaxId::new(
        Uuid::from_u128(0x8a885d04_1ceb_11c9_9fe8_08002b104860),
        Version::new(2, 0),
    );

    /// Create a syntax identifier.
    pub const fn new(uuid: Uuid, version: Version) -> Self {
        Self { uuid, version }
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.uuid, self.version)
    }
}

// GUIDs go on the wire as three little-endian integers followed by eight raw bytes.
impl Marshal for Uuid {
    fn marshal(&self, w: &mut Writer) -> Result<(), ndr::Error> {
        let (d1, d2, d3, d4) = self.as_fields();
        w.write_u32(d1);
        w.write_u16(d2);
        w.write_u16(d3);
        w.write_bytes(d4);
        Ok(())
    }
}

impl Unmarshal for Uuid {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, ndr::Error> {
        let d1 = r.read_u32()?;
        let d2 = r.read_u16()?;
        let d3 = r.read_u16()?;
        let mut d4 = [0u8; 8];
        d4.copy_from_slice(r.read_bytes(8)?);
        Ok(Uuid::from_fields(d1, d2, d3, &d4))
    }
}

// The interface version is a single u32 with the major version in the low half.
impl Marshal for SyntaxId {
    fn marshal(&self, w: &mut Writer) -> Result<(), ndr::Error> {
        self.uuid.marshal(w)?;
        w.write_u16(self.version.major);
        w.write_u16(self.version.minor);
        Ok(())
    }
}

impl Unmarshal for SyntaxId {
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, ndr::Error> {
        let uuid = Uuid::unmarshal(r)?;
        let major = r.read_u16()?;
        let minor = r.read_u16()?;
        Ok(SyntaxId::new(uuid, Version::new(major, minor)))
    }
}
