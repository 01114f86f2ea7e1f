#![warn(missing_docs)]

//! Blueadv decodes [Bluetooth Low Energy] advertisements as they are reported by the Cordova BLE central plugin,
//! and provides a small, runtime-agnostic scanning facade on top of an injected host scan source.
//!
//! [Bluetooth Low Energy]: https://www.bluetooth.com/specifications/specs/
//!
//! # Usage
//!
//! ```rust
//!# use blueadv::{AdvertisementData, btuuid::services};
//!let adv = AdvertisementData::from_raw(&[0x02, 0x01, 0x06, 0x05, 0x02, 0x0A, 0x18, 0x0D, 0x18]);
//!assert_eq!(adv.flags.map(|f| f.bits()), Some(0x06));
//!assert_eq!(adv.services, [services::DEVICE_INFORMATION, services::HEART_RATE]);
//! ```
//!
//! # Platform specifics
//!
//! The two mobile platforms hand advertisements to the plugin in different shapes. Android exposes the raw
//! advertising payload, a sequence of GAP AD structures which [`AdvertisementData::from_raw`] decodes. iOS never
//! exposes the raw bytes; CoreBluetooth delivers a pre-parsed dictionary instead, which
//! [`AdvertisementData::from_dictionary`] reads. Both produce the same [`AdvertisementData`] shape.
//!
//! The [`Decoder`] picks the right path once, from the platform reported by the host's [`DeviceInfoSource`]. A
//! [`Scanner`] combines a decoder with a [`ScanSource`] and turns host scan callbacks into a stream of
//! [`Peripheral`]s.
//!
//! # Byte order and formatting
//!
//! All UUIDs and company identifiers are little-endian on the air and are byte-reversed while decoding. UUIDs
//! display as lowercase `8-4-4-4-12` strings, and 16- and 32-bit UUIDs are expanded onto the Bluetooth Base UUID.
//! See [`btuuid`] for details.
//!
//! # Malformed data
//!
//! Advertisements arrive over a lossy radio link. A truncated or corrupt payload is never an error: decoding stops
//! at the first bad structure and everything decoded before it is kept.
//!
//! # Feature flags
//!
//! The `serde` feature is available to enable serializing/deserializing the decoded records, device info and the
//! iOS advertisement dictionary (using the CoreBluetooth key names).

pub mod ad;
pub mod advertisement;
pub mod btuuid;
pub mod callback;
pub mod decoder;
pub mod dictionary;
pub mod error;
pub mod platform;
pub mod scan;
mod util;

use std::collections::{BTreeMap, HashMap};

pub use btuuid::BluetoothUuidExt;
pub use decoder::{AdvertisementDecoder, Decoder, DictionaryDecoder, RawDecoder};
pub use dictionary::AdvertisingDictionary;
pub use error::Error;
pub use platform::{DeviceInfo, DeviceInfoSource, Platform};
pub use scan::{ReportSink, Scan, ScanOptions, ScanReport, ScanSource, Scanner};
pub use uuid::Uuid;

/// Convenience alias for a result with [`Error`]
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A platform-specific device identifier.
///
/// On Android it contains the Bluetooth address in the format `AB:CD:EF:01:23:45`. On iOS it is the identifier
/// CoreBluetooth assigns to the peripheral.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceId(pub String);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        DeviceId(id.to_owned())
    }
}

/// The payload of an advertisement as handed over by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advertising {
    /// Raw advertising payload (Android)
    Raw(Vec<u8>),
    /// Pre-parsed advertisement dictionary (iOS)
    Dictionary(AdvertisingDictionary),
}

/// A peripheral discovered during a scan, built from one advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peripheral {
    /// The source of the advertisement
    pub id: DeviceId,
    /// The name the host reported for the device, which may come from its cache rather than this advertisement
    pub name: Option<String>,
    /// The signal strength in dBm of the received advertisement packet
    pub rssi: Option<i16>,
    /// The advertisement data
    pub adv_data: AdvertisementData,
}

impl Peripheral {
    /// The device name, falling back to the advertised local name, or an empty string if neither is known.
    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.adv_data.name())
    }
}

/// Data included in a Bluetooth advertisement or scan reponse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvertisementData {
    /// The local name of the device (CSS §A.1.2). The complete name is preferred over the shortened one.
    pub local_name: Option<String>,
    /// Advertised GATT service UUIDs, in order of appearance and without duplicates (CSS §A.1.1)
    pub services: Vec<Uuid>,
    /// Service solicitation UUIDs (CSS §A.1.10)
    pub solicited_services: Vec<Uuid>,
    /// Service associated data (CSS §A.1.11)
    pub service_data: HashMap<Uuid, Vec<u8>>,
    /// Manufacturer specific data keyed by company identifier (CSS §A.1.4)
    pub manufacturer_data: BTreeMap<u16, Vec<u8>>,
    /// Transmitted power level in dBm (CSS §A.1.5)
    pub tx_power_level: Option<i16>,
    /// Advertising flags (CSS §A.1.3)
    pub flags: Option<AdvertisingFlags>,
    /// Set to true for connectable advertising packets. Only reported on iOS.
    pub is_connectable: bool,
    /// AD structures that were not interpreted, keyed by AD type
    pub unknown: BTreeMap<u8, Vec<u8>>,
}

/// The advertising flags bitmask. See the Bluetooth Core Specification Supplement §A.1.3 for details.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvertisingFlags(u8);

impl AdvertisingFlags {
    /// LE Limited Discoverable Mode
    pub const LE_LIMITED_DISCOVERABLE: u8 = 1 << 0;
    /// LE General Discoverable Mode
    pub const LE_GENERAL_DISCOVERABLE: u8 = 1 << 1;
    /// BR/EDR Not Supported
    pub const BR_EDR_NOT_SUPPORTED: u8 = 1 << 2;
    /// Simultaneous LE and BR/EDR to Same Device Capable (Controller)
    pub const SIMULTANEOUS_LE_BR_EDR_CONTROLLER: u8 = 1 << 3;

    /// Raw transmutation from [`u8`].
    pub const fn from_bits(bits: u8) -> Self {
        AdvertisingFlags(bits)
    }

    /// Raw transmutation to [`u8`].
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if all bits in `mask` are set.
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    #[allow(missing_docs)]
    pub const fn le_limited_discoverable(self) -> bool {
        self.contains(Self::LE_LIMITED_DISCOVERABLE)
    }

    #[allow(missing_docs)]
    pub const fn le_general_discoverable(self) -> bool {
        self.contains(Self::LE_GENERAL_DISCOVERABLE)
    }

    #[allow(missing_docs)]
    pub const fn br_edr_not_supported(self) -> bool {
        self.contains(Self::BR_EDR_NOT_SUPPORTED)
    }
}

impl From<u8> for AdvertisingFlags {
    fn from(bits: u8) -> Self {
        AdvertisingFlags(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits() {
        let flags = AdvertisingFlags::from_bits(0x06);
        assert!(flags.le_general_discoverable());
        assert!(flags.br_edr_not_supported());
        assert!(!flags.le_limited_discoverable());
        assert_eq!(flags.bits(), 6);
        assert_eq!(AdvertisingFlags::from(0x06), flags);
    }

    #[test]
    fn peripheral_name_falls_back_to_advertised_name() {
        let mut peripheral = Peripheral {
            id: "AB:CD:EF:01:23:45".into(),
            name: None,
            rssi: Some(-60),
            adv_data: AdvertisementData {
                local_name: Some("HRM".into()),
                ..Default::default()
            },
        };
        assert_eq!(peripheral.name(), "HRM");

        peripheral.name = Some("Polar H10".into());
        assert_eq!(peripheral.name(), "Polar H10");

        peripheral.name = Some(String::new());
        assert_eq!(peripheral.name(), "HRM");
        assert_eq!(peripheral.id.to_string(), "AB:CD:EF:01:23:45");
    }
}
