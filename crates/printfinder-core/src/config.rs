// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PrintfinderError, Result};
use crate::types::{ProtocolSet, ScanRange};

/// Persistent application settings, stored as `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub port: PortConfig,
    pub snmp: SnmpConfig,
    pub mdns: MdnsConfig,
    pub history: HistoryConfig,
}

/// Default target range and protocol selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// First three octets, e.g. "192.168.1".
    pub prefix: String,
    pub start: u32,
    pub end: u32,
    pub protocols: ProtocolSet,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            prefix: "192.168.1".into(),
            start: 1,
            end: 254,
            protocols: ProtocolSet::default(),
        }
    }
}

/// Raw print port sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// TCP port probed on each host (default 9100).
    pub port: u16,
    /// Connect timeout in milliseconds.
    pub timeout_ms: u64,
    /// Hosts probed at once. 1 keeps the sweep strictly sequential.
    pub concurrency: usize,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port: 9100,
            timeout_ms: 120,
            concurrency: 1,
        }
    }
}

impl PortConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Printer-MIB queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpConfig {
    /// UDP port of the agent (default 161).
    pub port: u16,
    pub community: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Extra attempts per OID after a timeout.
    pub retries: u32,
    /// Hosts queried at once. 1 keeps the sweep strictly sequential.
    pub concurrency: usize,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            port: 161,
            community: "public".into(),
            timeout_ms: 1000,
            retries: 0,
            concurrency: 1,
        }
    }
}

impl SnmpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Bonjour browse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdnsConfig {
    pub service_type: String,
    /// Listen window in seconds.
    pub timeout_secs: u64,
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            service_type: "_ipp._tcp.local.".into(),
            timeout_secs: 2,
        }
    }
}

impl MdnsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// File name inside the data directory.
    pub file_name: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file_name: crate::history::HISTORY_FILE.into(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields defaults; malformed JSON is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data)
            .map_err(|e| PrintfinderError::Config(format!("{}: {e}", path.display())))
    }

    /// Persist as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The configured target range, normalized.
    pub fn scan_range(&self) -> ScanRange {
        ScanRange::new(self.scan.start, self.scan.end, &self.scan.prefix)
    }
}
