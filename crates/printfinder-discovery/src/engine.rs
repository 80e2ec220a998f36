// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Discovery orchestration.
//
// One task per enabled protocol, all feeding a single aggregator loop over an
// mpsc channel. The aggregate is released only after every launched scanner
// has reported completion; there is no partial result. Progress is tracked
// per protocol and the mean is forwarded, so the displayed percentage never
// jumps backwards when a slow scanner reports after a fast one.

use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use printfinder_core::config::AppConfig;
use printfinder_core::history::HistoryLog;
use printfinder_core::status;
use printfinder_core::types::{DeviceRecord, Protocol, ProtocolSet, ScanRange};

use crate::mdns::MdnsScanner;
use crate::port::PortScanner;
use crate::scanner::{Capability, Progress, ScanRequest, Scanner};
use crate::snmp::SnmpScanner;
use crate::usb::UsbScanner;

/// Receives progress and phase labels while a discovery runs.
pub trait DiscoveryObserver: Send + Sync {
    /// Mean completion across launched protocols, 0..=100, never decreasing.
    fn on_progress(&self, _percent: u8) {}

    /// Human-readable phase label or final summary.
    fn on_status(&self, _status: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DiscoveryObserver for NoopObserver {}

enum ScanMessage {
    Progress(Protocol, u8),
    Finished(Protocol, Vec<DeviceRecord>),
}

/// Runs the registered scanners for a protocol set and merges the results.
pub struct DiscoveryEngine {
    scanners: BTreeMap<Protocol, Arc<dyn Scanner>>,
    history: Option<HistoryLog>,
}

impl DiscoveryEngine {
    /// Engine over an arbitrary scanner set. A later scanner for the same
    /// protocol replaces an earlier one.
    pub fn new(scanners: impl IntoIterator<Item = Arc<dyn Scanner>>) -> Self {
        Self {
            scanners: scanners
                .into_iter()
                .map(|s| (s.protocol(), s))
                .collect(),
            history: None,
        }
    }

    /// Engine over the real scanners for the protocols enabled in
    /// `protocols`, configured from `config`. Disabled protocols get no
    /// scanner, so no mDNS daemon is started and no USB bus is enumerated
    /// unless asked for.
    pub fn from_config(config: &AppConfig, protocols: &ProtocolSet) -> Self {
        let scanners: Vec<Arc<dyn Scanner>> = protocols
            .enabled()
            .into_iter()
            .map(|protocol| -> Arc<dyn Scanner> {
                match protocol {
                    Protocol::Usb => Arc::new(UsbScanner::detect()),
                    Protocol::Network => Arc::new(PortScanner::new(&config.port)),
                    Protocol::Snmp => Arc::new(SnmpScanner::new(&config.snmp)),
                    Protocol::Mdns => Arc::new(MdnsScanner::new(&config.mdns)),
                }
            })
            .collect();
        for s in &scanners {
            if let Capability::Unsupported(reason) = s.capability() {
                warn!(protocol = %s.protocol(), %reason, "scanner unsupported here");
            }
        }
        Self::new(scanners)
    }

    /// Append every finalized aggregate to `history`.
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn history(&self) -> Option<&HistoryLog> {
        self.history.as_ref()
    }

    /// Capability of the scanner registered for `protocol`.
    pub fn capability(&self, protocol: Protocol) -> Capability {
        self.scanners
            .get(&protocol)
            .map(|s| s.capability())
            .unwrap_or_else(|| Capability::Unsupported(format!("no {protocol} scanner")))
    }

    /// Scan with every enabled protocol concurrently and return the merged
    /// records, once.
    ///
    /// An empty protocol set returns immediately without launching anything.
    /// Records from one scanner keep that scanner's discovery order; scanners
    /// are concatenated in completion order. Within one scanner's output,
    /// repeated `(name, id)` pairs are dropped. No cross-protocol merging is
    /// done.
    pub async fn discover(
        &self,
        protocols: &ProtocolSet,
        range: ScanRange,
        mdns_timeout: Duration,
        observer: &dyn DiscoveryObserver,
    ) -> Vec<DeviceRecord> {
        let enabled = protocols.enabled();
        let expected = enabled.len();
        if expected == 0 {
            debug!("no protocols enabled; nothing to scan");
            return Vec::new();
        }

        info!(protocols = ?enabled, %range, "discovery starting");
        observer.on_status(status::SEARCHING);
        observer.on_progress(0);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = ScanRequest::new(range, mdns_timeout);

        for &protocol in &enabled {
            let scanner = match self.scanners.get(&protocol) {
                Some(s) => match s.capability() {
                    Capability::Available => Arc::clone(s),
                    Capability::Unsupported(reason) => {
                        warn!(%protocol, %reason, "skipping unsupported scanner");
                        let _ = tx.send(ScanMessage::Finished(protocol, Vec::new()));
                        continue;
                    }
                },
                None => {
                    warn!(%protocol, "no scanner registered");
                    let _ = tx.send(ScanMessage::Finished(protocol, Vec::new()));
                    continue;
                }
            };

            observer.on_status(&status::searching_via(protocol));
            let progress_tx = tx.clone();
            let progress = Progress::new(move |percent| {
                let _ = progress_tx.send(ScanMessage::Progress(protocol, percent));
            });
            let done_tx = tx.clone();
            tokio::spawn(async move {
                let records = AssertUnwindSafe(async { scanner.scan(request, progress).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        warn!(%protocol, "scanner panicked; counting it as empty");
                        Vec::new()
                    });
                let _ = done_tx.send(ScanMessage::Finished(protocol, records));
            });
        }
        drop(tx);

        let mut per_protocol: BTreeMap<Protocol, u8> = enabled.iter().map(|&p| (p, 0)).collect();
        let mut reported = 0u8;
        let mut completed = 0usize;
        let mut aggregate = Vec::new();

        while completed < expected {
            let Some(message) = rx.recv().await else {
                warn!(completed, expected, "scanner channel closed early");
                break;
            };
            match message {
                ScanMessage::Progress(protocol, percent) => {
                    let slot = per_protocol.entry(protocol).or_default();
                    *slot = (*slot).max(percent);
                }
                ScanMessage::Finished(protocol, records) => {
                    let records = dedup_within_source(records);
                    info!(%protocol, found = records.len(), "scanner finished");
                    aggregate.extend(records);
                    per_protocol.insert(protocol, 100);
                    completed += 1;
                }
            }

            let mean = (per_protocol.values().map(|&p| usize::from(p)).sum::<usize>() / expected) as u8;
            if mean > reported {
                reported = mean;
                observer.on_progress(mean);
            }
        }
        if reported < 100 {
            observer.on_progress(100);
        }

        if let Some(history) = &self.history {
            if let Err(e) = history.append(&aggregate) {
                warn!(error = %e, "could not append to history");
            }
        }

        info!(found = aggregate.len(), "discovery finished");
        observer.on_status(&status::summary(aggregate.len()));
        aggregate
    }
}

fn dedup_within_source(records: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.name.clone(), r.id.clone())))
        .collect()
}
