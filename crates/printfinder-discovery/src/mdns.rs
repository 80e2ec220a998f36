// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mDNS service discovery for IPP printers on the local network.
//
// Browses `_ipp._tcp.local.` through `mdns-sd` for a bounded
// listen window, turning every distinct resolved service into a record. The
// daemon is started once when the scanner is built; if that fails (no
// multicast, sandboxed runtime) the scanner reports itself unsupported and
// every scan is empty.

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tracing::{debug, info, trace, warn};

use printfinder_core::config::MdnsConfig;
use printfinder_core::types::{DeviceRecord, Protocol};

use crate::scanner::{Capability, Progress, ScanRequest, Scanner};

/// mDNS service type for plain IPP.
pub const IPP_SERVICE: &str = "_ipp._tcp.local.";

/// Default listen window.
pub const DEFAULT_LISTEN_WINDOW: Duration = Duration::from_secs(2);

/// Bonjour browser for IPP printers.
pub struct MdnsScanner {
    /// `None` when the daemon could not be started.
    daemon: Option<ServiceDaemon>,
    service_type: String,
    capability: Capability,
}

impl std::fmt::Debug for MdnsScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MdnsScanner")
            .field("service_type", &self.service_type)
            .field("capability", &self.capability)
            .finish()
    }
}

impl MdnsScanner {
    /// Start the mDNS daemon thread. Browsing only happens during a scan.
    pub fn new(config: &MdnsConfig) -> Self {
        match ServiceDaemon::new() {
            Ok(daemon) => Self {
                daemon: Some(daemon),
                service_type: config.service_type.clone(),
                capability: Capability::Available,
            },
            Err(e) => {
                warn!(error = %e, "mDNS daemon unavailable");
                Self::unsupported(format!("mDNS daemon: {e}"))
            }
        }
    }

    /// A scanner that never finds anything.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            daemon: None,
            service_type: IPP_SERVICE.to_string(),
            capability: Capability::Unsupported(reason.into()),
        }
    }

    /// Browse for `window`, collecting one record per distinct service.
    /// Blocking.
    fn browse(daemon: &ServiceDaemon, service_type: &str, window: Duration) -> Vec<DeviceRecord> {
        let receiver = match daemon.browse(service_type) {
            Ok(r) => r,
            Err(e) => {
                warn!(service_type, error = %e, "mDNS browse failed");
                return Vec::new();
            }
        };

        let deadline = Instant::now() + window;
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let event = match receiver.recv_timeout(remaining) {
                Ok(event) => event,
                // Timeout or daemon gone: either way the window is over.
                Err(_) => break,
            };
            match event {
                ServiceEvent::ServiceResolved(info) => {
                    let fullname = info.get_fullname().to_owned();
                    if seen.contains(&fullname) {
                        trace!(name = %fullname, "service re-announced");
                        continue;
                    }
                    match service_to_record(&info) {
                        Some(record) => {
                            info!(name = %record.name, ip = %record.id, "IPP service resolved");
                            seen.insert(fullname);
                            found.push(record);
                        }
                        None => debug!(name = %fullname, "service has no IPv4 address"),
                    }
                }
                ServiceEvent::SearchStopped(stype) => {
                    debug!(service_type = %stype, "mDNS search stopped");
                    break;
                }
                other => trace!(event = ?other, "mDNS event"),
            }
        }

        if let Err(e) = daemon.stop_browse(service_type) {
            debug!(service_type, error = %e, "stop browse failed");
        }
        found
    }
}

impl Drop for MdnsScanner {
    fn drop(&mut self) {
        if let Some(daemon) = self.daemon.take() {
            if let Err(e) = daemon.shutdown() {
                debug!(error = %e, "mDNS daemon shutdown failed");
            }
        }
    }
}

impl Scanner for MdnsScanner {
    fn protocol(&self) -> Protocol {
        Protocol::Mdns
    }

    fn capability(&self) -> Capability {
        self.capability.clone()
    }

    fn scan(&self, request: ScanRequest, progress: Progress) -> BoxFuture<'_, Vec<DeviceRecord>> {
        Box::pin(async move {
            let found = match &self.daemon {
                Some(daemon) => {
                    let daemon = daemon.clone();
                    let service_type = self.service_type.clone();
                    let window = request.mdns_timeout;
                    debug!(service_type = %service_type, ?window, "mDNS browse starting");
                    tokio::task::spawn_blocking(move || Self::browse(&daemon, &service_type, window))
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "mDNS browse task failed");
                            Vec::new()
                        })
                }
                None => Vec::new(),
            };
            info!(found = found.len(), "mDNS browse finished");
            progress.report(100);
            found
        })
    }
}

/// Convert a resolved service into a record using its lowest IPv4
/// address. `None` without one.
pub fn service_to_record(info: &ServiceInfo) -> Option<DeviceRecord> {
    let ip = info
        .get_addresses()
        .iter()
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
        .min()?;
    Some(DeviceRecord::new(
        Protocol::Mdns,
        info.get_fullname(),
        "mDNS Printer",
        ip.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn resolved_service_becomes_a_record() {
        let info = ServiceInfo::new(
            IPP_SERVICE,
            "Brother HL-L2350DW",
            "brother.local.",
            "10.0.0.5",
            631,
            HashMap::<String, String>::new(),
        )
        .unwrap();

        let record = service_to_record(&info).unwrap();
        assert_eq!(record.name, "Brother HL-L2350DW._ipp._tcp.local.");
        assert_eq!(record.driver_hint, "mDNS Printer");
        assert_eq!(record.id, "10.0.0.5");
        assert_eq!(record.source, Protocol::Mdns);
    }

    #[test]
    fn multi_homed_service_reports_the_lowest_ipv4() {
        let info = ServiceInfo::new(
            IPP_SERVICE,
            "Epson ET-4850",
            "epson.local.",
            "10.0.0.9,10.0.0.5,192.168.1.20",
            631,
            HashMap::<String, String>::new(),
        )
        .unwrap();
        for _ in 0..5 {
            assert_eq!(service_to_record(&info).unwrap().id, "10.0.0.5");
        }
    }

    #[test]
    fn ipv6_only_service_is_skipped() {
        let info = ServiceInfo::new(
            IPP_SERVICE,
            "v6-only",
            "v6.local.",
            "fe80::1",
            631,
            HashMap::<String, String>::new(),
        )
        .unwrap();
        assert!(service_to_record(&info).is_none());
    }

    #[tokio::test]
    async fn unsupported_scanner_returns_nothing() {
        let scanner = MdnsScanner::unsupported("no multicast");
        assert!(!scanner.capability().is_available());

        let request = ScanRequest::new(Default::default(), Duration::from_millis(10));
        let found = scanner.scan(request, Progress::noop()).await;
        assert!(found.is_empty());
    }
}
