// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The seam every discovery channel plugs into.
//
// A scanner never fails: anything that goes wrong inside it is "this host
// (or this protocol) contributed no record". That keeps the engine's only
// job counting completions.

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use printfinder_core::types::{DeviceRecord, Protocol, ScanRange};

/// Whether a scanner can run in this environment. Decided when the scanner
/// is constructed, not when a scan is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available,
    /// The backend is missing; the reason is logged and the protocol
    /// contributes nothing.
    Unsupported(String),
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Inputs shared by every scanner in one discovery run. Each scanner reads
/// the part it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRequest {
    pub range: ScanRange,
    pub mdns_timeout: Duration,
}

impl ScanRequest {
    pub fn new(range: ScanRange, mdns_timeout: Duration) -> Self {
        Self {
            range,
            mdns_timeout,
        }
    }
}

/// Per-scanner progress handle, reporting 0..=100.
#[derive(Clone)]
pub struct Progress {
    sink: Arc<dyn Fn(u8) + Send + Sync>,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

impl Progress {
    pub fn new(sink: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// A handle that drops every report.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, percent: u8) {
        (self.sink)(percent.min(100));
    }

    /// Report `done / total`, reaching exactly 100 when `done == total`.
    pub fn report_fraction(&self, done: usize, total: usize) {
        let percent = if total == 0 {
            100
        } else {
            (done.min(total) * 100 / total) as u8
        };
        self.report(percent);
    }
}

/// One discovery channel.
pub trait Scanner: Send + Sync {
    /// The protocol this scanner's records are tagged with.
    fn protocol(&self) -> Protocol;

    fn capability(&self) -> Capability {
        Capability::Available
    }

    /// Run one scan. Must complete (every wait inside is time-bounded) and
    /// must not panic on I/O failure.
    fn scan(&self, request: ScanRequest, progress: Progress) -> BoxFuture<'_, Vec<DeviceRecord>>;
}

/// Probe every address of `range`, at most `concurrency` at a time, keeping
/// hits in address order and reporting progress once per address.
pub(crate) async fn sweep<F, Fut>(
    range: &ScanRange,
    concurrency: usize,
    progress: &Progress,
    probe: F,
) -> Vec<DeviceRecord>
where
    F: FnMut(Ipv4Addr) -> Fut,
    Fut: Future<Output = Option<DeviceRecord>>,
{
    let total = range.len();
    let mut probes = std::pin::pin!(
        stream::iter(range.addresses())
            .map(probe)
            .buffered(concurrency.max(1))
    );

    let mut found = Vec::new();
    let mut done = 0;
    while let Some(hit) = probes.next().await {
        done += 1;
        progress.report_fraction(done, total);
        found.extend(hit);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (Progress, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |p| sink.lock().unwrap().push(p));
        (progress, seen)
    }

    #[test]
    fn fraction_reaches_exactly_one_hundred() {
        let (progress, seen) = recording();
        for done in 1..=3 {
            progress.report_fraction(done, 3);
        }
        assert_eq!(*seen.lock().unwrap(), vec![33, 66, 100]);
    }

    #[test]
    fn reports_are_clamped() {
        let (progress, seen) = recording();
        progress.report(250);
        progress.report_fraction(9, 4);
        progress.report_fraction(0, 0);
        assert_eq!(*seen.lock().unwrap(), vec![100, 100, 100]);
    }

    #[tokio::test]
    async fn sweep_probes_every_address_once_in_order() {
        let range = ScanRange::new(1, 10, "10.0.0");
        let (progress, seen) = recording();
        let probed = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&probed);
        let hits = sweep(&range, 4, &progress, move |ip| {
            log.lock().unwrap().push(ip);
            async move {
                (ip.octets()[3] % 3 == 0)
                    .then(|| DeviceRecord::new(Protocol::Network, ip.to_string(), "x", ip.to_string()))
            }
        })
        .await;

        assert_eq!(probed.lock().unwrap().len(), 10);
        let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["10.0.0.3", "10.0.0.6", "10.0.0.9"]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        assert_eq!(*seen.last().unwrap(), 100);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }
}
