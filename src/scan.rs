//! Scanning on top of a host-provided scan source.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use futures_core::Stream;
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::util::defer;
use crate::{Advertising, Decoder, DeviceId, DeviceInfoSource, Peripheral, Result, Uuid};

/// Options passed to the host when a scan starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScanOptions {
    /// Report every advertisement received, instead of once per device
    pub report_duplicates: bool,
}

impl ScanOptions {
    /// Sets [`report_duplicates`][ScanOptions::report_duplicates].
    pub fn report_duplicates(mut self, report_duplicates: bool) -> Self {
        self.report_duplicates = report_duplicates;
        self
    }
}

/// One advertisement as reported by the host scan callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Identifier of the advertising device
    pub id: DeviceId,
    /// Device name known to the host, if any
    pub name: Option<String>,
    /// Received signal strength in dBm
    pub rssi: Option<i16>,
    /// The advertisement payload
    pub advertising: Advertising,
}

/// Where the host delivers scan reports while a scan runs.
#[derive(Debug, Clone)]
pub struct ReportSink {
    sender: Sender<ScanReport>,
}

impl ReportSink {
    /// Delivers one report. Returns `false` once the scan has been dropped, after which further reports are
    /// discarded.
    pub fn report(&self, report: ScanReport) -> bool {
        self.sender.try_send(report).is_ok()
    }

    /// Returns `true` once the scan has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// The host's BLE scanning capability.
///
/// Implemented by the host integration (for example over the Cordova BLE central plugin) and handed to
/// [`Scanner`].
#[async_trait]
pub trait ScanSource: Send + Sync {
    /// Starts scanning for devices advertising any of `services` (all devices if empty). Every advertisement
    /// received until [`stop_scan`][ScanSource::stop_scan] is called must be passed to `sink`.
    async fn start_scan(&self, services: &[Uuid], options: &ScanOptions, sink: ReportSink) -> Result<()>;

    /// Stops the running scan. Called when the [`Scan`] stream is dropped.
    fn stop_scan(&self) -> Result<()>;
}

/// Scans through a [`ScanSource`] and decodes what it reports.
pub struct Scanner {
    source: Arc<dyn ScanSource>,
    decoder: Decoder,
    scanning: Arc<AtomicBool>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("decoder", &self.decoder)
            .field("scanning", &self.is_scanning())
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Creates a scanner decoding for the platform reported by `device`.
    pub fn new(source: Arc<dyn ScanSource>, device: &(impl DeviceInfoSource + ?Sized)) -> Result<Self> {
        Ok(Self::with_decoder(source, Decoder::from_device_info(device)?))
    }

    /// Creates a scanner with an explicitly chosen decoder.
    pub fn with_decoder(source: Arc<dyn ScanSource>, decoder: Decoder) -> Self {
        Scanner {
            source,
            decoder,
            scanning: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The decoder applied to scan reports.
    pub fn decoder(&self) -> Decoder {
        self.decoder
    }

    /// Returns `true` while a [`Scan`] is alive.
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Starts scanning with default [`ScanOptions`].
    pub async fn scan(&self, services: &[Uuid]) -> Result<Scan> {
        self.scan_with_options(services, ScanOptions::default()).await
    }

    /// Starts scanning for devices advertising any of `services`, or all devices if `services` is empty.
    ///
    /// Returns a stream of [`Peripheral`]s, one per advertisement reported by the host. Scanning is stopped when the
    /// stream is dropped. Only one scan may run at a time; starting a second one fails with
    /// [`AlreadyScanning`][ErrorKind::AlreadyScanning].
    pub async fn scan_with_options(&self, services: &[Uuid], options: ScanOptions) -> Result<Scan> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ErrorKind::AlreadyScanning.into());
        }
        let reset = defer(|| self.scanning.store(false, Ordering::Release));

        let (sender, receiver) = async_channel::unbounded();
        self.source.start_scan(services, &options, ReportSink { sender }).await?;
        reset.defuse();
        debug!(?services, report_duplicates = options.report_duplicates, "scan started");

        Ok(Scan {
            receiver: Box::pin(receiver),
            decoder: self.decoder,
            source: self.source.clone(),
            scanning: self.scanning.clone(),
        })
    }
}

/// A running scan. Yields a [`Peripheral`] per advertisement and stops the scan when dropped.
///
/// The stream ends if the host drops every [`ReportSink`] it was given.
///
/// Reports are queued without bound until polled. A scan that is kept alive but not polled keeps every report the
/// host delivers, so poll it or drop it.
#[must_use = "streams do nothing unless polled"]
pub struct Scan {
    receiver: Pin<Box<Receiver<ScanReport>>>,
    decoder: Decoder,
    source: Arc<dyn ScanSource>,
    scanning: Arc<AtomicBool>,
}

impl std::fmt::Debug for Scan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan")
            .field("decoder", &self.decoder)
            .field("pending", &self.receiver.len())
            .finish_non_exhaustive()
    }
}

impl Stream for Scan {
    type Item = Peripheral;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let decoder = this.decoder;
        this.receiver
            .as_mut()
            .poll_next(cx)
            .map(|report| report.map(|report| decoder.peripheral(report)))
    }
}

impl Drop for Scan {
    fn drop(&mut self) {
        self.receiver.close();
        if let Err(err) = self.source.stop_scan() {
            warn!("failed to stop scan: {err}");
        }
        self.scanning.store(false, Ordering::Release);
        debug!("scan stopped");
    }
}
