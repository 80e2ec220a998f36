// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SNMP printer-MIB sweep.
//
// Each host gets three independent SNMPv1 GETs (community "public" by
// default) over one UDP socket: system description, host-resources device
// description, and the printer-MIB product name. A host with at least one
// answer becomes a record; silence, error-status, or garbage is absence.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use printfinder_core::config::SnmpConfig;
use printfinder_core::error::{PrintfinderError, Result};
use printfinder_core::types::{DeviceRecord, Protocol};

use crate::ber::{Message, PDU_GET_RESPONSE};
use crate::scanner::{Progress, ScanRequest, Scanner, sweep};

pub const SNMP_PORT: u16 = 161;
pub const DEFAULT_COMMUNITY: &str = "public";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// What a host told us, keyed by what the OID means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoKey {
    Description,
    Model,
    Product,
}

/// The queried OIDs, in query order.
pub const PRINTER_OIDS: [(&str, InfoKey); 3] = [
    // SNMPv2-MIB::sysDescr.0
    ("1.3.6.1.2.1.1.1.0", InfoKey::Description),
    // HOST-RESOURCES-MIB::hrDeviceDescr.1
    ("1.3.6.1.2.1.25.3.2.1.3.1", InfoKey::Model),
    // Printer-MIB::prtGeneralPrinterName.1
    ("1.3.6.1.2.1.43.5.1.1.16.1", InfoKey::Product),
];

/// Largest datagram we accept.
const MAX_DATAGRAM: usize = 65_507;

static NEXT_REQUEST_ID: AtomicI32 = AtomicI32::new(1);

fn next_request_id() -> i32 {
    // Stay positive; some agents mishandle negative request ids.
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed) & 0x7FFF_FFFF
}

/// Sweeps a range with printer-MIB queries.
#[derive(Debug, Clone)]
pub struct SnmpScanner {
    port: u16,
    community: String,
    timeout: Duration,
    retries: u32,
    concurrency: usize,
}

impl Default for SnmpScanner {
    fn default() -> Self {
        Self::new(&SnmpConfig::default())
    }
}

impl SnmpScanner {
    pub fn new(config: &SnmpConfig) -> Self {
        Self {
            port: config.port,
            community: config.community.clone(),
            timeout: config.timeout(),
            retries: config.retries,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Query one host. `None` when no OID answered.
    pub async fn probe(&self, ip: Ipv4Addr) -> Option<DeviceRecord> {
        let info = match self.query_host(ip).await {
            Ok(info) => info,
            Err(e) => {
                debug!(%ip, error = %e, "SNMP query skipped");
                return None;
            }
        };
        if info.is_empty() {
            trace!(%ip, "no SNMP answer");
            return None;
        }

        let name = info
            .get(&InfoKey::Description)
            .cloned()
            .unwrap_or_else(|| format!("SNMP Printer ({ip})"));
        let driver_hint = info
            .get(&InfoKey::Model)
            .cloned()
            .unwrap_or_else(|| "Generic SNMP Printer".to_string());

        info!(%ip, name = %name, model = %driver_hint, "SNMP agent answered");
        Some(DeviceRecord::new(Protocol::Snmp, name, driver_hint, ip.to_string()))
    }

    /// Run every printer OID against `ip`, keeping the ones that answered.
    pub async fn query_host(&self, ip: Ipv4Addr) -> Result<HashMap<InfoKey, String>> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))).await?;
        socket.connect(SocketAddr::from((ip, self.port))).await?;

        let mut info = HashMap::new();
        for (oid, key) in PRINTER_OIDS {
            match self.get(&socket, oid).await {
                Ok(Some(value)) => {
                    trace!(%ip, oid, value = %value, "OID answered");
                    info.insert(key, value);
                }
                Ok(None) => trace!(%ip, oid, "OID absent"),
                Err(e) => trace!(%ip, oid, error = %e, "OID failed"),
            }
        }
        Ok(info)
    }

    /// One GET with the configured retries. `Ok(None)` means the agent
    /// answered without a usable value.
    async fn get(&self, socket: &UdpSocket, oid: &str) -> Result<Option<String>> {
        let mut last_err = None;
        for _attempt in 0..=self.retries {
            match self.get_once(socket, oid).await {
                Ok(value) => return Ok(value),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| PrintfinderError::Snmp("no attempt made".into())))
    }

    async fn get_once(&self, socket: &UdpSocket, oid: &str) -> Result<Option<String>> {
        let request_id = next_request_id();
        let packet = Message::get_request(&self.community, request_id, oid).encode()?;
        socket.send(&packet).await?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = match tokio::time::timeout_at(deadline, socket.recv(&mut buf)).await {
                Ok(received) => received?,
                Err(_) => return Err(PrintfinderError::Snmp(format!("{oid}: timed out"))),
            };
            // Anything that isn't our response (late replies to an earlier
            // request, junk) is dropped and we keep waiting.
            let Ok(response) = Message::decode(&buf[..len]) else {
                continue;
            };
            if response.pdu_tag != PDU_GET_RESPONSE || response.request_id != i64::from(request_id) {
                continue;
            }
            if response.error_status != 0 {
                return Ok(None);
            }
            return Ok(response
                .varbinds
                .into_iter()
                .next()
                .and_then(|(_, value)| value.as_text()));
        }
    }
}

impl Scanner for SnmpScanner {
    fn protocol(&self) -> Protocol {
        Protocol::Snmp
    }

    fn scan(&self, request: ScanRequest, progress: Progress) -> BoxFuture<'_, Vec<DeviceRecord>> {
        Box::pin(async move {
            let range = request.range;
            debug!(%range, port = self.port, "SNMP sweep starting");
            if self.community.is_empty() {
                warn!("empty SNMP community string; agents will likely ignore us");
            }
            let found = sweep(&range, self.concurrency, &progress, |ip| self.probe(ip)).await;
            info!(%range, found = found.len(), "SNMP sweep finished");
            found
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oids_match_the_printer_mib() {
        let oids: Vec<&str> = PRINTER_OIDS.iter().map(|(oid, _)| *oid).collect();
        assert_eq!(
            oids,
            vec![
                "1.3.6.1.2.1.1.1.0",
                "1.3.6.1.2.1.25.3.2.1.3.1",
                "1.3.6.1.2.1.43.5.1.1.16.1"
            ]
        );
    }

    #[test]
    fn defaults() {
        let scanner = SnmpScanner::default();
        assert_eq!(scanner.port, SNMP_PORT);
        assert_eq!(scanner.community, DEFAULT_COMMUNITY);
        assert_eq!(scanner.timeout, DEFAULT_TIMEOUT);
        assert_eq!(scanner.retries, 0);
    }

    #[test]
    fn request_ids_are_positive_and_distinct() {
        let a = next_request_id();
        let b = next_request_id();
        assert!(a >= 0 && b >= 0);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn silent_host_is_absent() {
        // Bound but never answering: every GET times out.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let scanner = SnmpScanner::new(&SnmpConfig {
            port: silent.local_addr().unwrap().port(),
            timeout_ms: 50,
            ..SnmpConfig::default()
        });
        assert!(scanner.probe(Ipv4Addr::LOCALHOST).await.is_none());
    }
}
