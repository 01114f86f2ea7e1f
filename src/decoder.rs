//! Selection of the advertisement decoding path for the host platform.

use tracing::{debug, warn};

use crate::scan::ScanReport;
use crate::{AdvertisementData, Advertising, DeviceInfoSource, Peripheral, Platform, Result};

/// Turns the advertisement payload handed over by the host into [`AdvertisementData`].
pub trait AdvertisementDecoder {
    /// The platform whose payload shape this decoder understands.
    fn platform(&self) -> Platform;

    /// Decodes one advertisement.
    ///
    /// Decoding never fails. A payload of the shape this decoder does not understand yields an empty record.
    fn decode(&self, advertising: &Advertising) -> AdvertisementData;
}

/// Decodes raw advertising payloads (Android).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RawDecoder;

impl AdvertisementDecoder for RawDecoder {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn decode(&self, advertising: &Advertising) -> AdvertisementData {
        match advertising {
            Advertising::Raw(buf) => AdvertisementData::from_raw(buf),
            Advertising::Dictionary(_) => {
                warn!("raw decoder received an advertisement dictionary");
                AdvertisementData::default()
            }
        }
    }
}

/// Reads CoreBluetooth advertisement dictionaries (iOS).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DictionaryDecoder;

impl AdvertisementDecoder for DictionaryDecoder {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn decode(&self, advertising: &Advertising) -> AdvertisementData {
        match advertising {
            Advertising::Dictionary(dict) => AdvertisementData::from_dictionary(dict),
            Advertising::Raw(_) => {
                warn!("dictionary decoder received a raw advertising payload");
                AdvertisementData::default()
            }
        }
    }
}

/// The decoder for one platform, chosen once when the host integration starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decoder {
    /// See [`RawDecoder`]
    Raw(RawDecoder),
    /// See [`DictionaryDecoder`]
    Dictionary(DictionaryDecoder),
}

impl Decoder {
    /// The decoder for `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Android => Decoder::Raw(RawDecoder),
            Platform::Ios => Decoder::Dictionary(DictionaryDecoder),
        }
    }

    /// The decoder for the platform reported by `device`.
    ///
    /// Fails with [`UnknownPlatform`][crate::error::ErrorKind::UnknownPlatform] if the platform is neither Android
    /// nor iOS, since no decoding path applies then.
    pub fn from_device_info(device: &(impl DeviceInfoSource + ?Sized)) -> Result<Self> {
        let info = device.device_info()?;
        let platform = info.platform()?;
        debug!(%platform, model = %info.model, version = %info.version, "selected advertisement decoder");
        Ok(Decoder::for_platform(platform))
    }

    /// Builds the [`Peripheral`] for one scan report.
    pub fn peripheral(&self, report: ScanReport) -> Peripheral {
        let adv_data = self.decode(&report.advertising);
        Peripheral {
            id: report.id,
            name: report.name,
            rssi: report.rssi,
            adv_data,
        }
    }
}

impl AdvertisementDecoder for Decoder {
    fn platform(&self) -> Platform {
        match self {
            Decoder::Raw(d) => d.platform(),
            Decoder::Dictionary(d) => d.platform(),
        }
    }

    fn decode(&self, advertising: &Advertising) -> AdvertisementData {
        match self {
            Decoder::Raw(d) => d.decode(advertising),
            Decoder::Dictionary(d) => d.decode(advertising),
        }
    }
}
