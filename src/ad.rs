//! Advertising Data (AD) structures
//!
//! An advertisement payload is a sequence of AD structures, each laid out as a length octet, a type octet, and
//! `length - 1` octets of data (Bluetooth Core Specification v5.3, Vol 3, Part C, §11). The assigned type numbers are
//! listed in the Bluetooth SIG *Assigned Numbers* document, §2.3.

use num_enum::TryFromPrimitive;
use tracing::trace;

/// Assigned numbers for the AD types this crate knows by name.
#[allow(missing_docs)]
#[repr(u8)]
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive)]
pub enum AdType {
    Flags = 0x01,
    IncompleteServiceUuids16 = 0x02,
    CompleteServiceUuids16 = 0x03,
    IncompleteServiceUuids32 = 0x04,
    CompleteServiceUuids32 = 0x05,
    IncompleteServiceUuids128 = 0x06,
    CompleteServiceUuids128 = 0x07,
    ShortenedLocalName = 0x08,
    CompleteLocalName = 0x09,
    TxPowerLevel = 0x0A,
    ClassOfDevice = 0x0D,
    PeripheralConnectionIntervalRange = 0x12,
    SolicitedServiceUuids16 = 0x14,
    SolicitedServiceUuids128 = 0x15,
    ServiceData16 = 0x16,
    PublicTargetAddress = 0x17,
    RandomTargetAddress = 0x18,
    Appearance = 0x19,
    AdvertisingInterval = 0x1A,
    LeBluetoothDeviceAddress = 0x1B,
    LeRole = 0x1C,
    SolicitedServiceUuids32 = 0x1F,
    ServiceData32 = 0x20,
    ServiceData128 = 0x21,
    Uri = 0x24,
    LeSupportedFeatures = 0x27,
    ManufacturerSpecificData = 0xFF,
}

impl AdType {
    /// The raw assigned number.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

impl From<AdType> for u8 {
    fn from(value: AdType) -> Self {
        value.to_u8()
    }
}

/// A single AD structure: the type code and the data octets that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdField<'a> {
    ad_type: u8,
    data: &'a [u8],
}

impl<'a> AdField<'a> {
    /// Creates a field for encoding.
    ///
    /// The encoded length octet counts the type octet, so `data` may be at most 254 octets long.
    pub fn new(ad_type: impl Into<u8>, data: &'a [u8]) -> Self {
        AdField {
            ad_type: ad_type.into(),
            data,
        }
    }

    /// The raw type code.
    pub fn ad_type(&self) -> u8 {
        self.ad_type
    }

    /// The type code as a named [`AdType`], if it is one this crate knows.
    pub fn kind(&self) -> Option<AdType> {
        AdType::try_from(self.ad_type).ok()
    }

    /// The data octets, not including the length and type octets.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of octets this field occupies on the air.
    pub fn encoded_len(&self) -> usize {
        self.data.len() + 2
    }

    /// Appends the length, type and data octets to `buf`.
    ///
    /// # Panics
    ///
    /// Panics if the data is longer than 254 octets.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        let len = u8::try_from(self.data.len() + 1).expect("AD structure data longer than 254 octets");
        buf.reserve(self.encoded_len());
        buf.push(len);
        buf.push(self.ad_type);
        buf.extend_from_slice(self.data);
    }
}

/// Iterator over the AD structures in an advertisement payload.
///
/// Iteration ends at the first zero-length structure (padding) or at the first structure whose declared length runs
/// past the end of the buffer. Neither case is an error: the structures before it are still yielded.
#[derive(Debug, Clone)]
pub struct AdStructures<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> AdStructures<'a> {
    /// Starts iterating over `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        AdStructures { buf, pos: 0 }
    }

    /// Number of octets consumed by the structures yielded so far.
    pub fn consumed(&self) -> usize {
        self.pos.min(self.buf.len())
    }
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = AdField<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.buf.get(self.pos)? as usize;
        if len == 0 {
            trace!(offset = self.pos, "zero-length AD structure, stopping");
            self.pos = self.buf.len();
            return None;
        }

        let end = self.pos + len + 1;
        if end > self.buf.len() {
            trace!(
                offset = self.pos,
                declared = len,
                available = self.buf.len() - self.pos - 1,
                "truncated AD structure, stopping"
            );
            self.pos = self.buf.len();
            return None;
        }

        let field = AdField {
            ad_type: self.buf[self.pos + 1],
            data: &self.buf[self.pos + 2..end],
        };
        self.pos = end;
        Some(field)
    }
}

impl std::iter::FusedIterator for AdStructures<'_> {}

/// Splits an advertisement payload into its AD structures.
pub fn parse_fields(buf: &[u8]) -> Vec<AdField<'_>> {
    AdStructures::new(buf).collect()
}

/// Encodes a list of AD structures back into an advertisement payload.
pub fn encode_fields<'a, 'b: 'a>(fields: impl IntoIterator<Item = &'a AdField<'b>>) -> Vec<u8> {
    let mut buf = Vec::new();
    for field in fields {
        field.write_to(&mut buf);
    }
    buf
}
