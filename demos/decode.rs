use std::error::Error;

use blueadv::{Advertising, AdvertisingDictionary, Decoder, DeviceInfo, ScanReport};
use tracing::{info, metadata::LevelFilter};

fn main() -> Result<(), Box<dyn Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // An iBeacon captured on Android, zero padded to 31 octets
    let mut raw = vec![
        0x02, 0x01, 0x06, 0x1A, 0xFF, 0x4C, 0x00, 0x02, 0x15, 0xE2, 0xC5, 0x6D, 0xB5, 0xDF, 0xFB, 0x48, 0xD2, 0xB0,
        0x60, 0xD0, 0xF5, 0xA7, 0x10, 0x96, 0xE0, 0x00, 0x01, 0x00, 0x02, 0xC5,
    ];
    raw.resize(31, 0);

    let android = DeviceInfo {
        platform: "Android".into(),
        model: "Pixel 7".into(),
        ..Default::default()
    };
    let decoder = Decoder::from_device_info(&android)?;
    let peripheral = decoder.peripheral(ScanReport {
        id: "C1:02:03:04:05:06".into(),
        name: None,
        rssi: Some(-61),
        advertising: Advertising::Raw(raw),
    });
    info!("{} {:?} {:?}", peripheral.id, peripheral.rssi, peripheral.adv_data);
    for (company, data) in peripheral.adv_data.manufacturer_data_strings() {
        info!("manufacturer {company}: {data:02x?}");
    }

    // The same kind of device seen through CoreBluetooth on iOS
    let ios = DeviceInfo {
        platform: "iOS".into(),
        model: "iPhone14,2".into(),
        ..Default::default()
    };
    let decoder = Decoder::from_device_info(&ios)?;
    let peripheral = decoder.peripheral(ScanReport {
        id: "5D1F0A52-94C4-4D4E-9E8B-0C8C6B0B3C71".into(),
        name: Some("Thermo".into()),
        rssi: Some(-72),
        advertising: Advertising::Dictionary(AdvertisingDictionary {
            local_name: Some("Thermo".into()),
            service_uuids: vec!["181A".into()],
            tx_power_level: Some(-4),
            is_connectable: Some(true),
            ..Default::default()
        }),
    });
    info!("{} {:?} {:?}", peripheral.name(), peripheral.rssi, peripheral.adv_data);

    Ok(())
}
