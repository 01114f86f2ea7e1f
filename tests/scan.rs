use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blueadv::btuuid::services;
use blueadv::callback;
use blueadv::error::{Error, ErrorKind};
use blueadv::{
    Advertising, AdvertisingDictionary, DeviceInfo, Platform, ReportSink, Result, ScanOptions, ScanReport, ScanSource,
    Scanner, Uuid,
};
use futures_lite::StreamExt;
use tracing::metadata::LevelFilter;

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

#[derive(Default)]
struct MockSource {
    sink: Mutex<Option<ReportSink>>,
    started: Mutex<Vec<(Vec<Uuid>, ScanOptions)>>,
    stops: AtomicUsize,
    fail_start: bool,
}

impl MockSource {
    fn failing() -> Self {
        MockSource {
            fail_start: true,
            ..Default::default()
        }
    }

    fn sink(&self) -> ReportSink {
        self.sink.lock().unwrap().clone().expect("scan not started")
    }

    fn hang_up(&self) {
        self.sink.lock().unwrap().take();
    }
}

#[async_trait]
impl ScanSource for MockSource {
    async fn start_scan(&self, services: &[Uuid], options: &ScanOptions, sink: ReportSink) -> Result<()> {
        self.started.lock().unwrap().push((services.to_vec(), options.clone()));

        // the plugin answers on its own thread
        let (callbacks, answered) = callback::pair();
        let fail = self.fail_start;
        std::thread::spawn(move || {
            if fail {
                callbacks.failure(Error::new(ErrorKind::ScanFailed, None, "Bluetooth disabled"));
            } else {
                callbacks.success(());
            }
        });
        answered.await?;

        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn stop_scan(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn report(id: &str, advertising: Advertising) -> ScanReport {
    ScanReport {
        id: id.into(),
        name: None,
        rssi: Some(-70),
        advertising,
    }
}

#[tokio::test]
async fn android_reports_are_decoded() {
    init_tracing();
    let source = Arc::new(MockSource::default());
    let device = DeviceInfo {
        platform: "Android".into(),
        ..Default::default()
    };
    let scanner = Scanner::new(source.clone(), &device).unwrap();

    let mut scan = scanner
        .scan_with_options(&[services::HEART_RATE], ScanOptions::default().report_duplicates(true))
        .await
        .unwrap();
    assert!(scanner.is_scanning());
    assert_eq!(
        source.started.lock().unwrap()[0],
        (vec![services::HEART_RATE], ScanOptions { report_duplicates: true })
    );

    let sink = source.sink();
    assert!(sink.report(report(
        "AB:CD:EF:01:23:45",
        Advertising::Raw(vec![0x02, 0x01, 0x06, 0x03, 0x03, 0x0D, 0x18, 0x04, 0x09, b'H', b'R', b'M']),
    )));

    let peripheral = scan.next().await.unwrap();
    assert_eq!(peripheral.id.to_string(), "AB:CD:EF:01:23:45");
    assert_eq!(peripheral.name(), "HRM");
    assert_eq!(peripheral.rssi, Some(-70));
    assert_eq!(peripheral.adv_data.services, vec![services::HEART_RATE]);
}

#[tokio::test]
async fn ios_reports_are_read_from_the_dictionary() {
    init_tracing();
    let source = Arc::new(MockSource::default());
    let scanner = Scanner::new(source.clone(), &Platform::Ios).unwrap();
    let mut scan = scanner.scan(&[]).await.unwrap();

    source.sink().report(report(
        "5D1F0A52-94C4-4D4E-9E8B-0C8C6B0B3C71",
        Advertising::Dictionary(AdvertisingDictionary {
            local_name: Some("Thingy".into()),
            service_uuids: vec!["EF680100-9B35-4933-9B10-52FFA9740042".into()],
            is_connectable: Some(true),
            ..Default::default()
        }),
    ));

    let peripheral = scan.next().await.unwrap();
    assert_eq!(peripheral.name(), "Thingy");
    assert!(peripheral.adv_data.is_connectable);
    assert_eq!(
        peripheral.adv_data.services[0].to_string(),
        "ef680100-9b35-4933-9b10-52ffa9740042"
    );
}

#[tokio::test]
async fn dropping_the_scan_stops_it() {
    init_tracing();
    let source = Arc::new(MockSource::default());
    let scanner = Scanner::new(source.clone(), &Platform::Android).unwrap();

    let scan = scanner.scan(&[]).await.unwrap();
    let sink = source.sink();
    let err = scanner.scan(&[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyScanning);

    drop(scan);
    assert_eq!(source.stops.load(Ordering::SeqCst), 1);
    assert!(!scanner.is_scanning());
    assert!(sink.is_closed());
    assert!(!sink.report(report("AB:CD:EF:01:23:45", Advertising::Raw(vec![]))));

    // a new scan can start once the old one is gone
    let _scan = scanner.scan(&[]).await.unwrap();
    assert!(scanner.is_scanning());
}

#[tokio::test]
async fn failed_start_leaves_scanner_idle() {
    init_tracing();
    let source = Arc::new(MockSource::failing());
    let scanner = Scanner::new(source.clone(), &Platform::Android).unwrap();

    let err = scanner.scan(&[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScanFailed);
    assert!(!scanner.is_scanning());
    assert_eq!(source.stops.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stream_ends_when_host_hangs_up() {
    init_tracing();
    let source = Arc::new(MockSource::default());
    let scanner = Scanner::new(source.clone(), &Platform::Android).unwrap();
    let mut scan = scanner.scan(&[]).await.unwrap();

    source.sink().report(report("AB:CD:EF:01:23:45", Advertising::Raw(vec![0x02, 0x0A, 0x00])));
    source.hang_up();

    assert_eq!(scan.next().await.unwrap().adv_data.tx_power_level, Some(0));
    assert!(scan.next().await.is_none());
}

#[tokio::test]
async fn reports_queue_until_polled() {
    init_tracing();
    let source = Arc::new(MockSource::default());
    let scanner = Scanner::new(source.clone(), &Platform::Android).unwrap();
    let scan = scanner.scan(&[]).await.unwrap();

    let sink = source.sink();
    for level in 0..100u8 {
        assert!(sink.report(report("AB:CD:EF:01:23:45", Advertising::Raw(vec![0x02, 0x0A, level]))));
    }
    source.hang_up();
    drop(sink);

    let levels: Vec<Option<i16>> = scan.map(|p| p.adv_data.tx_power_level).collect().await;
    assert_eq!(levels, (0..100).map(Some).collect::<Vec<_>>());
}

#[test]
fn unknown_platform_is_rejected() {
    let device = DeviceInfo {
        platform: "browser".into(),
        ..Default::default()
    };
    let err = Scanner::new(Arc::new(MockSource::default()), &device).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownPlatform);
}
