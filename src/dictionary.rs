//! The pre-parsed advertisement dictionary delivered on iOS.
//!
//! CoreBluetooth never hands the raw advertising payload to applications. The plugin forwards the
//! `advertisementData` dictionary of `centralManager:didDiscoverPeripheral:advertisementData:RSSI:` instead, with
//! UUIDs already rendered as `CBUUID` strings and binary values as byte arrays.

use std::collections::BTreeMap;

use tracing::warn;

use crate::ad::AdType;
use crate::{AdvertisementData, BluetoothUuidExt, Uuid};

/// An advertisement as reported by CoreBluetooth.
///
/// With the `serde` feature enabled, fields (de)serialize under their CoreBluetooth key names, e.g.
/// `kCBAdvDataLocalName`. Missing keys take their default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AdvertisingDictionary {
    /// `kCBAdvDataLocalName`
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataLocalName"))]
    pub local_name: Option<String>,
    /// `kCBAdvDataTxPowerLevel`
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataTxPowerLevel"))]
    pub tx_power_level: Option<i16>,
    /// `kCBAdvDataServiceUUIDs`
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataServiceUUIDs"))]
    pub service_uuids: Vec<String>,
    /// `kCBAdvDataOverflowServiceUUIDs`, services found in the overflow area of a backgrounded iOS advertiser
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataOverflowServiceUUIDs"))]
    pub overflow_service_uuids: Vec<String>,
    /// `kCBAdvDataSolicitedServiceUUIDs`
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataSolicitedServiceUUIDs"))]
    pub solicited_service_uuids: Vec<String>,
    /// `kCBAdvDataServiceData`
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataServiceData"))]
    pub service_data: BTreeMap<String, Vec<u8>>,
    /// `kCBAdvDataManufacturerData`, starting with the little-endian company identifier
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataManufacturerData"))]
    pub manufacturer_data: Option<Vec<u8>>,
    /// `kCBAdvDataIsConnectable`
    #[cfg_attr(feature = "serde", serde(rename = "kCBAdvDataIsConnectable"))]
    pub is_connectable: Option<bool>,
}

impl AdvertisementData {
    /// Reads an iOS advertisement dictionary.
    ///
    /// Entries with UUID strings that cannot be parsed are skipped. Manufacturer data too short to hold a company
    /// identifier is kept in [`unknown`][AdvertisementData::unknown] under the manufacturer specific data type, the
    /// same as [`from_raw`][AdvertisementData::from_raw] does. CoreBluetooth does not report the advertising flags.
    pub fn from_dictionary(dict: &AdvertisingDictionary) -> Self {
        let mut adv = AdvertisementData {
            local_name: dict.local_name.clone(),
            tx_power_level: dict.tx_power_level,
            is_connectable: dict.is_connectable.unwrap_or(false),
            ..Default::default()
        };

        for s in dict.service_uuids.iter().chain(&dict.overflow_service_uuids) {
            if let Some(uuid) = parse_uuid(s, "service") {
                if !adv.services.contains(&uuid) {
                    adv.services.push(uuid);
                }
            }
        }

        for s in &dict.solicited_service_uuids {
            if let Some(uuid) = parse_uuid(s, "solicited service") {
                if !adv.solicited_services.contains(&uuid) {
                    adv.solicited_services.push(uuid);
                }
            }
        }

        for (key, value) in &dict.service_data {
            if let Some(uuid) = parse_uuid(key, "service data") {
                adv.service_data.entry(uuid).or_insert_with(|| value.clone());
            }
        }

        match dict.manufacturer_data.as_deref() {
            Some([lo, hi, payload @ ..]) => {
                adv.manufacturer_data
                    .insert(u16::from_le_bytes([*lo, *hi]), payload.to_vec());
            }
            Some(short) if !short.is_empty() => {
                adv.unknown
                    .insert(AdType::ManufacturerSpecificData.into(), short.to_vec());
            }
            _ => (),
        }

        adv
    }
}

impl From<&AdvertisingDictionary> for AdvertisementData {
    fn from(dict: &AdvertisingDictionary) -> Self {
        AdvertisementData::from_dictionary(dict)
    }
}

fn parse_uuid(s: &str, what: &str) -> Option<Uuid> {
    let uuid = Uuid::parse_bluetooth_str(s);
    if uuid.is_none() {
        warn!("ignoring {} entry with invalid UUID {:?}", what, s);
    }
    uuid
}
