//! Decoding and encoding of raw advertisement payloads, as delivered by Android scan callbacks.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::ad::{AdField, AdStructures, AdType};
use crate::btuuid::company_id_string;
use crate::{AdvertisementData, AdvertisingFlags, BluetoothUuidExt, Uuid};

/// Largest data section a single AD structure can carry (the length octet also counts the type octet).
pub const MAX_AD_DATA_LEN: usize = 254;

impl AdvertisementData {
    /// Decodes a raw advertisement payload.
    ///
    /// Decoding never fails. A zero-length structure or a structure running past the end of `buf` ends decoding, and
    /// the fields decoded up to that point are returned. AD types that are not interpreted, and interpreted types whose
    /// data is too short to make sense of, are kept verbatim in [`unknown`][AdvertisementData::unknown].
    pub fn from_raw(buf: &[u8]) -> Self {
        let mut adv = AdvertisementData::default();
        let mut shortened_name = None;

        for field in AdStructures::new(buf) {
            if !adv.apply(&field, &mut shortened_name) {
                adv.unknown
                    .entry(field.ad_type())
                    .or_insert_with(|| field.data().to_vec());
            }
        }

        if adv.local_name.is_none() {
            adv.local_name = shortened_name;
        }
        adv
    }

    // Returns `false` if the field should be kept as unknown.
    fn apply(&mut self, field: &AdField<'_>, shortened_name: &mut Option<String>) -> bool {
        let data = field.data();
        let Some(kind) = field.kind() else {
            return false;
        };

        match kind {
            AdType::Flags => match data.first() {
                Some(&bits) => {
                    self.flags.get_or_insert(AdvertisingFlags::from_bits(bits));
                    true
                }
                None => false,
            },
            AdType::IncompleteServiceUuids16 | AdType::CompleteServiceUuids16 => {
                push_uuids(&mut self.services, data, 2);
                true
            }
            AdType::IncompleteServiceUuids32 | AdType::CompleteServiceUuids32 => {
                push_uuids(&mut self.services, data, 4);
                true
            }
            AdType::IncompleteServiceUuids128 | AdType::CompleteServiceUuids128 => {
                push_uuids(&mut self.services, data, 16);
                true
            }
            AdType::SolicitedServiceUuids16 => {
                push_uuids(&mut self.solicited_services, data, 2);
                true
            }
            AdType::SolicitedServiceUuids32 => {
                push_uuids(&mut self.solicited_services, data, 4);
                true
            }
            AdType::SolicitedServiceUuids128 => {
                push_uuids(&mut self.solicited_services, data, 16);
                true
            }
            AdType::ShortenedLocalName => {
                shortened_name.get_or_insert_with(|| String::from_utf8_lossy(data).into_owned());
                true
            }
            AdType::CompleteLocalName => {
                self.local_name
                    .get_or_insert_with(|| String::from_utf8_lossy(data).into_owned());
                true
            }
            AdType::TxPowerLevel => match data.first() {
                Some(&level) => {
                    self.tx_power_level.get_or_insert(i16::from(level as i8));
                    true
                }
                None => false,
            },
            AdType::ServiceData16 => insert_service_data(&mut self.service_data, data, 2),
            AdType::ServiceData32 => insert_service_data(&mut self.service_data, data, 4),
            AdType::ServiceData128 => insert_service_data(&mut self.service_data, data, 16),
            AdType::ManufacturerSpecificData => match data {
                [lo, hi, payload @ ..] => {
                    self.manufacturer_data
                        .entry(u16::from_le_bytes([*lo, *hi]))
                        .or_insert_with(|| payload.to_vec());
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Encodes the record as an advertisement payload.
    ///
    /// Structures are written in a fixed order: flags, service UUID lists (16-, 32-, then 128-bit, as complete
    /// lists), solicited service UUID lists, the local name (as a complete name), TX power level, service data
    /// (ordered by UUID), manufacturer data (ordered by company id), then unknown structures (ordered by type).
    /// A payload already in that order decodes and re-encodes to the same bytes.
    ///
    /// UUID lists too long for one structure are split across several. Names and data sections longer than
    /// [`MAX_AD_DATA_LEN`] are truncated.
    pub fn to_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        if let Some(flags) = self.flags {
            push_field(&mut buf, AdType::Flags.into(), &[flags.bits()]);
        }

        push_uuid_lists(
            &mut buf,
            &self.services,
            [
                AdType::CompleteServiceUuids16,
                AdType::CompleteServiceUuids32,
                AdType::CompleteServiceUuids128,
            ],
        );
        push_uuid_lists(
            &mut buf,
            &self.solicited_services,
            [
                AdType::SolicitedServiceUuids16,
                AdType::SolicitedServiceUuids32,
                AdType::SolicitedServiceUuids128,
            ],
        );

        if let Some(name) = &self.local_name {
            push_field(&mut buf, AdType::CompleteLocalName.into(), name.as_bytes());
        }

        if let Some(level) = self.tx_power_level {
            let level = level.clamp(i8::MIN.into(), i8::MAX.into()) as i8;
            push_field(&mut buf, AdType::TxPowerLevel.into(), &[level as u8]);
        }

        let mut service_data: Vec<_> = self.service_data.iter().collect();
        service_data.sort_by_key(|(uuid, _)| **uuid);
        for (uuid, value) in service_data {
            let key = uuid.to_le_bluetooth_bytes();
            let ad_type = match key.len() {
                2 => AdType::ServiceData16,
                4 => AdType::ServiceData32,
                _ => AdType::ServiceData128,
            };
            let mut data = key;
            data.extend_from_slice(value);
            push_field(&mut buf, ad_type.into(), &data);
        }

        for (company_id, payload) in &self.manufacturer_data {
            let mut data = company_id.to_le_bytes().to_vec();
            data.extend_from_slice(payload);
            push_field(&mut buf, AdType::ManufacturerSpecificData.into(), &data);
        }

        for (ad_type, data) in &self.unknown {
            push_field(&mut buf, *ad_type, data);
        }

        buf
    }

    /// The local name, or an empty string if none was advertised.
    pub fn name(&self) -> &str {
        self.local_name.as_deref().unwrap_or_default()
    }

    /// Manufacturer data keyed by the company identifier formatted as four lowercase hex digits.
    pub fn manufacturer_data_strings(&self) -> BTreeMap<String, &[u8]> {
        self.manufacturer_data
            .iter()
            .map(|(id, data)| (company_id_string(*id), data.as_slice()))
            .collect()
    }

    /// Service data keyed by the hyphenated lowercase service UUID.
    pub fn service_data_strings(&self) -> BTreeMap<String, &[u8]> {
        self.service_data
            .iter()
            .map(|(uuid, data)| (uuid.to_string(), data.as_slice()))
            .collect()
    }

    /// Returns `true` if nothing was decoded.
    pub fn is_empty(&self) -> bool {
        *self == AdvertisementData::default()
    }
}

fn push_uuids(list: &mut Vec<Uuid>, data: &[u8], width: usize) {
    let chunks = data.chunks_exact(width);
    if !chunks.remainder().is_empty() {
        trace!(width, len = data.len(), "dropping partial UUID at end of list");
    }
    for uuid in chunks.filter_map(Uuid::from_le_bluetooth_bytes) {
        if !list.contains(&uuid) {
            list.push(uuid);
        }
    }
}

fn insert_service_data(service_data: &mut HashMap<Uuid, Vec<u8>>, data: &[u8], width: usize) -> bool {
    if data.len() < width {
        return false;
    }
    let (key, value) = data.split_at(width);
    match Uuid::from_le_bluetooth_bytes(key) {
        Some(uuid) => {
            service_data.entry(uuid).or_insert_with(|| value.to_vec());
            true
        }
        None => false,
    }
}

fn push_field(buf: &mut Vec<u8>, ad_type: u8, data: &[u8]) {
    let data = &data[..data.len().min(MAX_AD_DATA_LEN)];
    AdField::new(ad_type, data).write_to(buf);
}

fn push_uuid_lists(buf: &mut Vec<u8>, uuids: &[Uuid], types: [AdType; 3]) {
    let mut by_width: [Vec<u8>; 3] = Default::default();
    for uuid in uuids {
        let bytes = uuid.to_le_bluetooth_bytes();
        let slot = match bytes.len() {
            2 => 0,
            4 => 1,
            _ => 2,
        };
        by_width[slot].extend_from_slice(&bytes);
    }

    for ((bytes, ad_type), width) in by_width.iter().zip(types).zip([2, 4, 16]) {
        let per_field = MAX_AD_DATA_LEN / width * width;
        for chunk in bytes.chunks(per_field) {
            push_field(buf, ad_type.into(), chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btuuid::{companies, services};

    #[test]
    fn decodes_flags_and_16_bit_services() {
        let adv = AdvertisementData::from_raw(&[0x02, 0x01, 0x06, 0x05, 0x02, 0x0A, 0x18, 0x0D, 0x18]);
        assert_eq!(adv.flags.map(|f| f.bits()), Some(6));
        assert_eq!(adv.services, vec![services::DEVICE_INFORMATION, services::HEART_RATE]);
        assert!(adv.unknown.is_empty());
    }

    #[test]
    fn complete_name_wins_over_shortened() {
        let buf = [
            0x04, 0x08, b'H', b'R', b'M', 0x08, 0x09, b'H', b'R', b'M', b' ', b'P', b'r', b'o',
        ];
        assert_eq!(AdvertisementData::from_raw(&buf).name(), "HRM Pro");
        assert_eq!(AdvertisementData::from_raw(&buf[..5]).name(), "HRM");
    }

    #[test]
    fn short_sections_are_kept_as_unknown() {
        let buf = [0x01, 0x01, 0x02, 0xFF, 0x4C, 0x02, 0x16, 0x0D];
        let adv = AdvertisementData::from_raw(&buf);
        assert_eq!(adv.flags, None);
        assert!(adv.manufacturer_data.is_empty());
        assert!(adv.service_data.is_empty());
        assert_eq!(adv.unknown.get(&0x01), Some(&vec![]));
        assert_eq!(adv.unknown.get(&0xFF), Some(&vec![0x4C]));
        assert_eq!(adv.unknown.get(&0x16), Some(&vec![0x0D]));
    }

    #[test]
    fn first_duplicate_wins() {
        let buf = [
            0x02, 0x0A, 0x04, 0x02, 0x0A, 0x08, 0x04, 0xFF, 0x4C, 0x00, 0x01, 0x04, 0xFF, 0x4C, 0x00, 0x02,
        ];
        let adv = AdvertisementData::from_raw(&buf);
        assert_eq!(adv.tx_power_level, Some(4));
        assert_eq!(adv.manufacturer_data.get(&companies::APPLE), Some(&vec![0x01]));
    }

    #[test]
    fn service_uuids_are_deduplicated_in_order() {
        let buf = [0x05, 0x02, 0x0F, 0x18, 0x0A, 0x18, 0x03, 0x03, 0x0F, 0x18];
        let adv = AdvertisementData::from_raw(&buf);
        assert_eq!(adv.services, vec![services::BATTERY, services::DEVICE_INFORMATION]);
    }

    #[test]
    fn negative_tx_power() {
        let adv = AdvertisementData::from_raw(&[0x02, 0x0A, 0xEC]);
        assert_eq!(adv.tx_power_level, Some(-20));
        assert_eq!(adv.to_raw(), vec![0x02, 0x0A, 0xEC]);
    }

    #[test]
    fn service_data_keys_by_width() {
        let mut buf = vec![0x05, 0x16, 0xAA, 0xFE, 0x10, 0x00];
        buf.extend([0x06, 0x20, 0x78, 0x56, 0x34, 0x12, 0x01]);
        let mut long = vec![0x12, 0x21];
        long.extend(0u8..16);
        long.push(0x99);
        buf.extend(long);

        let adv = AdvertisementData::from_raw(&buf);
        assert_eq!(adv.service_data.get(&services::EDDYSTONE), Some(&vec![0x10, 0x00]));
        assert_eq!(adv.service_data.get(&Uuid::from_u32(0x12345678)), Some(&vec![0x01]));
        let long_uuid = Uuid::parse_str("0f0e0d0c-0b0a-0908-0706-050403020100").unwrap();
        assert_eq!(adv.service_data.get(&long_uuid), Some(&vec![0x99]));

        let strings = adv.service_data_strings();
        assert_eq!(
            strings.get("0000feaa-0000-1000-8000-00805f9b34fb").copied(),
            Some(&[0x10u8, 0x00][..])
        );
    }

    #[test]
    fn canonical_payload_round_trips() {
        let buf = [
            0x02, 0x01, 0x06, // flags
            0x05, 0x03, 0x0A, 0x18, 0x0D, 0x18, // 16-bit services
            0x03, 0x14, 0x12, 0x18, // solicited
            0x04, 0x09, b'H', b'R', b'M', // name
            0x02, 0x0A, 0x00, // tx power
            0x04, 0x16, 0x0D, 0x18, 0x3C, // service data
            0x05, 0xFF, 0x59, 0x00, 0xBE, 0xEF, // manufacturer data
            0x02, 0x19, 0xC1, // appearance, kept as unknown
        ];
        let adv = AdvertisementData::from_raw(&buf);
        assert_eq!(adv.solicited_services, vec![services::HUMAN_INTERFACE_DEVICE]);
        assert_eq!(adv.to_raw(), buf);
    }

    #[test]
    fn long_uuid_lists_are_split() {
        let adv = AdvertisementData {
            services: (0..200u16).map(Uuid::from_u16).collect(),
            ..Default::default()
        };
        let raw = adv.to_raw();
        assert_eq!(raw[0], 255);
        assert_eq!(AdvertisementData::from_raw(&raw).services, adv.services);
    }

    #[test]
    fn empty_buffer_is_empty_record() {
        let adv = AdvertisementData::from_raw(&[]);
        assert!(adv.is_empty());
        assert_eq!(adv.name(), "");
        assert!(adv.to_raw().is_empty());
    }
}
