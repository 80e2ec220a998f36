// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw print port sweep (JetDirect, port 9100).
//
// A completed TCP handshake on the raw port counts as a printer. No data is
// sent and nothing is retried: a short timeout keeps a full /24 sweep around
// thirty seconds, at the cost of missing slow hosts.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::net::TcpStream;
use tracing::{debug, info, trace};

use printfinder_core::config::PortConfig;
use printfinder_core::types::{DeviceRecord, Protocol};

use crate::scanner::{Progress, ScanRequest, Scanner, sweep};

/// Default raw TCP port (HP JetDirect).
pub const RAW_PORT: u16 = 9100;

/// Connect timeout tuned for a 254-host sweep.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(120);

/// Sweeps a range for hosts listening on the raw print port.
#[derive(Debug, Clone)]
pub struct PortScanner {
    port: u16,
    timeout: Duration,
    concurrency: usize,
}

impl Default for PortScanner {
    fn default() -> Self {
        Self {
            port: RAW_PORT,
            timeout: DEFAULT_CONNECT_TIMEOUT,
            concurrency: 1,
        }
    }
}

impl PortScanner {
    pub fn new(config: &PortConfig) -> Self {
        Self {
            port: config.port,
            timeout: config.timeout(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Probe a single host. `None` means nothing answered in time.
    pub async fn probe(&self, ip: Ipv4Addr) -> Option<DeviceRecord> {
        let addr = SocketAddr::from((ip, self.port));
        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => {
                info!(%addr, "raw print port open");
                Some(DeviceRecord::new(
                    Protocol::Network,
                    format!("Network Printer ({ip})"),
                    "Generic Network Printer Driver",
                    ip.to_string(),
                ))
            }
            Ok(Err(e)) => {
                trace!(%addr, error = %e, "raw print port closed");
                None
            }
            Err(_) => {
                trace!(%addr, "raw print port timed out");
                None
            }
        }
    }
}

impl Scanner for PortScanner {
    fn protocol(&self) -> Protocol {
        Protocol::Network
    }

    fn scan(&self, request: ScanRequest, progress: Progress) -> BoxFuture<'_, Vec<DeviceRecord>> {
        Box::pin(async move {
            let range = request.range;
            debug!(%range, port = self.port, "raw port sweep starting");
            let found = sweep(&range, self.concurrency, &progress, |ip| self.probe(ip)).await;
            info!(%range, found = found.len(), "raw port sweep finished");
            found
        })
    }
}
