//! `Uuid` extensions for Bluetooth UUIDs
//!
//! Advertisements carry 16-, 32- and 128-bit UUIDs in little-endian byte order. Every UUID decoded by this crate is
//! byte-reversed into network order and, for the shortened forms, expanded onto the [Bluetooth Base
//! UUID][BLUETOOTH_BASE_UUID]. The `Display` form is therefore always the 36-character lowercase `8-4-4-4-12`
//! string, e.g. `0000180d-0000-1000-8000-00805f9b34fb` for the 16-bit Heart Rate service.

use uuid::Uuid;

/// This is the Bluetooth Base UUID. It is used with 16-bit and 32-bit UUIDs
/// [defined](https://www.bluetooth.com/specifications/assigned-numbers/) by the Bluetooth SIG.
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Const function to create a 16-bit Bluetooth UUID
pub const fn bluetooth_uuid_from_u16(uuid: u16) -> Uuid {
    Uuid::from_u128(((uuid as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Const function to create a 32-bit Bluetooth UUID
pub const fn bluetooth_uuid_from_u32(uuid: u32) -> Uuid {
    Uuid::from_u128(((uuid as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Formats a company identifier the way manufacturer data keys are displayed: four lowercase hex digits.
///
/// ```
/// assert_eq!(blueadv::btuuid::company_id_string(0x004C), "004c");
/// ```
pub fn company_id_string(company_id: u16) -> String {
    format!("{company_id:04x}")
}

/// Extension trait for [uuid::Uuid] with helper methods for dealing with Bluetooth 16-bit and 32-bit UUIDs
pub trait BluetoothUuidExt: private::Sealed + Sized {
    /// Creates a 16-bit Bluetooth UUID
    fn from_u16(uuid: u16) -> Self;

    /// Creates a 32-bit Bluetooth UUID
    fn from_u32(uuid: u32) -> Self;

    /// Creates a UUID from big-endian `bytes`
    ///
    /// Returns `None` if `bytes.len()` is not one of 2, 4, or 16
    fn from_bluetooth_bytes(bytes: &[u8]) -> Option<Self>;

    /// Creates a UUID from `bytes` in over-the-air (little-endian) order
    ///
    /// Returns `None` if `bytes.len()` is not one of 2, 4, or 16
    fn from_le_bluetooth_bytes(bytes: &[u8]) -> Option<Self>;

    /// Parses a UUID string as reported by CoreBluetooth: four hex digits for a 16-bit UUID, eight for a 32-bit
    /// UUID, or a full hyphenated UUID. Case is ignored.
    fn parse_bluetooth_str(s: &str) -> Option<Self>;

    /// Returns `true` if self is a valid 16-bit Bluetooth UUID
    fn is_u16_uuid(&self) -> bool;

    /// Returns `true` if self is a valid 32-bit Bluetooth UUID
    fn is_u32_uuid(&self) -> bool;

    /// Tries to convert self into a 16-bit Bluetooth UUID
    fn try_to_u16(&self) -> Option<u16>;

    /// Tries to convert self into a 32-bit Bluetooth UUID
    fn try_to_u32(&self) -> Option<u32>;

    /// Returns the shortest over-the-air (little-endian) encoding of self: 2, 4, or 16 octets.
    fn to_le_bluetooth_bytes(&self) -> Vec<u8>;
}

impl BluetoothUuidExt for Uuid {
    fn from_u16(uuid: u16) -> Self {
        bluetooth_uuid_from_u16(uuid)
    }

    fn from_u32(uuid: u32) -> Self {
        bluetooth_uuid_from_u32(uuid)
    }

    fn from_bluetooth_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes.len() {
            2 => bytes.try_into().ok().map(|x| Self::from_u16(u16::from_be_bytes(x))),
            4 => bytes.try_into().ok().map(|x| Self::from_u32(u32::from_be_bytes(x))),
            16 => bytes.try_into().ok().map(Self::from_bytes),
            _ => None,
        }
    }

    fn from_le_bluetooth_bytes(bytes: &[u8]) -> Option<Self> {
        let mut reversed = bytes.to_vec();
        reversed.reverse();
        Self::from_bluetooth_bytes(&reversed)
    }

    fn parse_bluetooth_str(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.len() {
            4 => u16::from_str_radix(s, 16).ok().map(Self::from_u16),
            8 => u32::from_str_radix(s, 16).ok().map(Self::from_u32),
            _ => Uuid::parse_str(s).ok(),
        }
    }

    fn is_u16_uuid(&self) -> bool {
        let u = self.as_u128();
        (u & ((1 << 96) - 1)) == BLUETOOTH_BASE_UUID && (((u >> 96) as u32) & 0xffff0000) == 0
    }

    fn is_u32_uuid(&self) -> bool {
        let u = self.as_u128();
        (u & ((1 << 96) - 1)) == BLUETOOTH_BASE_UUID
    }

    fn try_to_u16(&self) -> Option<u16> {
        let u = self.as_u128();
        self.is_u16_uuid().then(|| (u >> 96) as u16)
    }

    fn try_to_u32(&self) -> Option<u32> {
        let u = self.as_u128();
        self.is_u32_uuid().then(|| (u >> 96) as u32)
    }

    fn to_le_bluetooth_bytes(&self) -> Vec<u8> {
        if let Some(short) = self.try_to_u16() {
            short.to_le_bytes().to_vec()
        } else if let Some(short) = self.try_to_u32() {
            short.to_le_bytes().to_vec()
        } else {
            self.as_u128().to_le_bytes().to_vec()
        }
    }
}

mod private {
    use uuid::Uuid;

    pub trait Sealed {}

    impl Sealed for Uuid {}
}

/// Bluetooth GATT Service 16-bit UUIDs commonly seen in advertisements
pub mod services {
    #![allow(missing_docs)]

    use uuid::Uuid;

    use super::bluetooth_uuid_from_u16;

    pub const GENERIC_ACCESS: Uuid = bluetooth_uuid_from_u16(0x1800);
    pub const GENERIC_ATTRIBUTE: Uuid = bluetooth_uuid_from_u16(0x1801);
    pub const IMMEDIATE_ALERT: Uuid = bluetooth_uuid_from_u16(0x1802);
    pub const TX_POWER: Uuid = bluetooth_uuid_from_u16(0x1804);
    pub const DEVICE_INFORMATION: Uuid = bluetooth_uuid_from_u16(0x180A);
    pub const HEART_RATE: Uuid = bluetooth_uuid_from_u16(0x180D);
    pub const BATTERY: Uuid = bluetooth_uuid_from_u16(0x180F);
    pub const HUMAN_INTERFACE_DEVICE: Uuid = bluetooth_uuid_from_u16(0x1812);
    pub const ENVIRONMENTAL_SENSING: Uuid = bluetooth_uuid_from_u16(0x181A);
    pub const EDDYSTONE: Uuid = bluetooth_uuid_from_u16(0xFEAA);
}

/// Company identifiers [assigned](https://www.bluetooth.com/specifications/assigned-numbers/company-identifiers/)
/// by the Bluetooth SIG, used as manufacturer data keys
pub mod companies {
    #![allow(missing_docs)]

    pub const ERICSSON: u16 = 0x0000;
    pub const MICROSOFT: u16 = 0x0006;
    pub const APPLE: u16 = 0x004C;
    pub const NORDIC_SEMICONDUCTOR: u16 = 0x0059;
    pub const SAMSUNG: u16 = 0x0075;
    pub const GOOGLE: u16 = 0x00E0;
}
