//! Host platform identity, as reported by the Cordova device plugin.

use std::str::FromStr;

use crate::error::{Error, ErrorKind};
use crate::Result;

/// The mobile platforms whose BLE scan results can be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Platform {
    /// Scan results carry the raw advertising payload.
    Android,
    /// Scan results carry a CoreBluetooth advertisement dictionary.
    Ios,
}

impl Platform {
    /// The platform name in the spelling the device plugin uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("android") {
            Ok(Platform::Android)
        } else if s.eq_ignore_ascii_case("ios") {
            Ok(Platform::Ios)
        } else {
            Err(Error::new(ErrorKind::UnknownPlatform, None, format!("{s:?}")))
        }
    }
}

/// The device's hardware and software description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct DeviceInfo {
    /// Version of Cordova running on the device
    pub cordova: String,
    /// Name of the device's model or product, as set by the manufacturer
    pub model: String,
    /// The operating system name, e.g. `Android` or `iOS`
    pub platform: String,
    /// The device's universally unique identifier
    pub uuid: String,
    /// Operating system version
    pub version: String,
    /// The device's manufacturer
    pub manufacturer: String,
    /// Whether the device is running on a simulator
    pub is_virtual: bool,
    /// Hardware serial number
    pub serial: String,
}

impl DeviceInfo {
    /// Identifies the platform from the `platform` field.
    pub fn platform(&self) -> Result<Platform> {
        self.platform.parse()
    }
}

/// Access to the host's device information.
///
/// Implemented by the host integration and handed to [`Decoder::from_device_info`][crate::Decoder::from_device_info]
/// or [`Scanner::new`][crate::Scanner::new].
pub trait DeviceInfoSource {
    /// Returns the device information, or an error if the host has not made it available (for example before the
    /// `deviceready` event).
    fn device_info(&self) -> Result<DeviceInfo>;
}

impl DeviceInfoSource for DeviceInfo {
    fn device_info(&self) -> Result<DeviceInfo> {
        Ok(self.clone())
    }
}

impl DeviceInfoSource for Platform {
    fn device_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo {
            platform: self.as_str().to_owned(),
            ..Default::default()
        })
    }
}
