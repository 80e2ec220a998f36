// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printfinder discovery engine.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::{PrintfinderError, Result};
use crate::lookup;

/// The discovery channel that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Locally attached USB printer-class device.
    Usb,
    /// Host answering on the raw print port (9100).
    Network,
    /// Host answering printer-MIB queries.
    Snmp,
    /// `_ipp._tcp` service announcement.
    Mdns,
}

impl Protocol {
    /// Every protocol, in launch order.
    pub const ALL: [Protocol; 4] = [Self::Usb, Self::Network, Self::Snmp, Self::Mdns];

    /// Lower-case key used in history lines and configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Usb => "usb",
            Self::Network => "network",
            Self::Snmp => "snmp",
            Self::Mdns => "mdns",
        }
    }

    /// Human-readable name for status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Usb => "USB",
            Self::Network => "Network",
            Self::Snmp => "SNMP",
            Self::Mdns => "Bonjour/mDNS",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Protocol {
    type Err = PrintfinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usb" => Ok(Self::Usb),
            "network" | "net" | "raw" => Ok(Self::Network),
            "snmp" => Ok(Self::Snmp),
            "mdns" | "bonjour" => Ok(Self::Mdns),
            other => Err(PrintfinderError::Config(format!("unknown protocol '{other}'"))),
        }
    }
}

/// One discovered candidate printer.
///
/// Records are built once by a scanner and never mutated afterwards; the
/// lookup URL is derived from the other fields at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Human-readable device identity.
    pub name: String,
    /// Best-effort label for driver lookup.
    pub driver_hint: String,
    /// `vendor:product` hex pair for USB, otherwise an IPv4 address.
    pub id: String,
    /// Which scanner produced the record.
    pub source: Protocol,
    /// Web-search URL for the driver.
    pub lookup_url: String,
}

impl DeviceRecord {
    pub fn new(
        source: Protocol,
        name: impl Into<String>,
        driver_hint: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let id = id.into();
        let lookup_url = lookup::lookup_url(source, &name, &id);
        Self {
            name,
            driver_hint: driver_hint.into(),
            id,
            source,
            lookup_url,
        }
    }

    /// The line appended to the history log for this record.
    ///
    /// Control characters inside a field become spaces so one record is
    /// always exactly one line.
    pub fn history_line(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            single_line(&self.name),
            single_line(&self.driver_hint),
            single_line(&self.id),
            self.source
        )
    }
}

fn single_line(field: &str) -> String {
    field
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Fallback range used whenever user input cannot be trusted.
pub const DEFAULT_PREFIX: [u8; 3] = [192, 168, 1];
pub const DEFAULT_START: u8 = 1;
pub const DEFAULT_END: u8 = 254;

/// An IPv4 sweep `prefix.start ..= prefix.end` over a /24.
///
/// Always normalized: `1 <= start <= end <= 254`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    start: u8,
    end: u8,
    prefix: [u8; 3],
}

impl Default for ScanRange {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
            prefix: DEFAULT_PREFIX,
        }
    }
}

impl ScanRange {
    /// Build a range, falling back to the default when the prefix or the
    /// octet bounds are invalid. Reversed bounds are swapped.
    pub fn new(start: u32, end: u32, prefix: &str) -> Self {
        match Self::try_new(start, end, prefix) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!(error = %e, "using default scan range");
                Self::default()
            }
        }
    }

    /// Strict variant of [`ScanRange::new`].
    pub fn try_new(start: u32, end: u32, prefix: &str) -> Result<Self> {
        let prefix = parse_prefix(prefix)?;
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        for octet in [start, end] {
            if !(1..=254).contains(&octet) {
                return Err(PrintfinderError::InvalidRange(format!(
                    "host octet {octet} outside 1..=254"
                )));
            }
        }
        Ok(Self {
            start: start as u8,
            end: end as u8,
            prefix,
        })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Dotted prefix, e.g. `"192.168.1"`.
    pub fn prefix(&self) -> String {
        let [a, b, c] = self.prefix;
        format!("{a}.{b}.{c}")
    }

    /// Number of addresses in the sweep.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Target addresses in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let [a, b, c] = self.prefix;
        (self.start..=self.end).map(move |host| Ipv4Addr::new(a, b, c, host))
    }
}

impl std::fmt::Display for ScanRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}-{}", self.prefix(), self.start, self.end)
    }
}

fn parse_prefix(prefix: &str) -> Result<[u8; 3]> {
    let parts: Vec<&str> = prefix.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(PrintfinderError::InvalidRange(format!(
            "prefix '{prefix}' must have three octets"
        )));
    }
    let mut octets = [0u8; 3];
    for (slot, part) in octets.iter_mut().zip(&parts) {
        *slot = part.trim().parse::<u8>().map_err(|_| {
            PrintfinderError::InvalidRange(format!("bad octet '{part}' in prefix '{prefix}'"))
        })?;
    }
    Ok(octets)
}

/// Which protocols a scan should use. Any subset is legal, including none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSet {
    pub usb: bool,
    pub network: bool,
    pub snmp: bool,
    pub mdns: bool,
}

impl Default for ProtocolSet {
    fn default() -> Self {
        Self {
            usb: true,
            network: true,
            snmp: false,
            mdns: false,
        }
    }
}

impl ProtocolSet {
    /// No protocols enabled.
    pub fn none() -> Self {
        Self {
            usb: false,
            network: false,
            snmp: false,
            mdns: false,
        }
    }

    /// Exactly the given protocols.
    pub fn only(protocols: &[Protocol]) -> Self {
        let mut set = Self::none();
        for &p in protocols {
            set.set(p, true);
        }
        set
    }

    pub fn is_enabled(&self, protocol: Protocol) -> bool {
        match protocol {
            Protocol::Usb => self.usb,
            Protocol::Network => self.network,
            Protocol::Snmp => self.snmp,
            Protocol::Mdns => self.mdns,
        }
    }

    pub fn set(&mut self, protocol: Protocol, enabled: bool) {
        match protocol {
            Protocol::Usb => self.usb = enabled,
            Protocol::Network => self.network = enabled,
            Protocol::Snmp => self.snmp = enabled,
            Protocol::Mdns => self.mdns = enabled,
        }
    }

    /// Enabled protocols in launch order.
    pub fn enabled(&self) -> Vec<Protocol> {
        Protocol::ALL
            .into_iter()
            .filter(|p| self.is_enabled(*p))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.enabled().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_prefix_falls_back_to_default() {
        let range = ScanRange::new(5, 1, "999.1.1");
        assert_eq!(range, ScanRange::default());
        assert_eq!(range.start(), 1);
        assert_eq!(range.end(), 254);
        assert_eq!(range.prefix(), "192.168.1");
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let range = ScanRange::new(20, 10, "10.0.0");
        assert_eq!(range.start(), 10);
        assert_eq!(range.end(), 20);
        assert_eq!(range.len(), 11);
    }

    #[test]
    fn out_of_bounds_octets_fall_back() {
        assert_eq!(ScanRange::new(0, 10, "10.0.0"), ScanRange::default());
        assert_eq!(ScanRange::new(1, 255, "10.0.0"), ScanRange::default());
        assert!(ScanRange::try_new(1, 300, "10.0.0").is_err());
    }

    #[test]
    fn malformed_prefixes_are_rejected() {
        for bad in ["", "10.0", "10.0.0.1", "a.b.c", "10..0", "256.0.0"] {
            assert!(ScanRange::try_new(1, 2, bad).is_err(), "accepted '{bad}'");
        }
    }

    #[test]
    fn addresses_cover_the_whole_range() {
        let range = ScanRange::new(1, 3, "10.0.0");
        let addrs: Vec<String> = range.addresses().map(|a| a.to_string()).collect();
        assert_eq!(addrs, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(range.len(), addrs.len());
        assert_eq!(range.to_string(), "10.0.0.1-3");
    }

    #[test]
    fn protocol_set_counts_and_orders() {
        let set = ProtocolSet::only(&[Protocol::Mdns, Protocol::Usb]);
        assert_eq!(set.enabled(), vec![Protocol::Usb, Protocol::Mdns]);
        assert_eq!(set.count(), 2);
        assert_eq!(ProtocolSet::none().count(), 0);
        assert_eq!(ProtocolSet::default().enabled(), vec![Protocol::Usb, Protocol::Network]);
    }

    #[test]
    fn protocol_parses_from_config_keys() {
        assert_eq!("USB".parse::<Protocol>().unwrap(), Protocol::Usb);
        assert_eq!("bonjour".parse::<Protocol>().unwrap(), Protocol::Mdns);
        assert!("lpd".parse::<Protocol>().is_err());
    }

    #[test]
    fn history_line_uses_pipe_format() {
        let record = DeviceRecord::new(
            Protocol::Network,
            "Network Printer (10.0.0.2)",
            "Generic Network Printer Driver",
            "10.0.0.2",
        );
        assert_eq!(
            record.history_line(),
            "Network Printer (10.0.0.2) | Generic Network Printer Driver | 10.0.0.2 | network"
        );
    }

    #[test]
    fn history_line_never_spans_lines() {
        let record = DeviceRecord::new(
            Protocol::Snmp,
            "HP LaserJet 4250\r\nFW 20.1",
            "HP\tPCL6",
            "127.0.0.1",
        );
        let line = record.history_line();
        assert_eq!(line.lines().count(), 1);
        assert_eq!(line, "HP LaserJet 4250  FW 20.1 | HP PCL6 | 127.0.0.1 | snmp");
    }
}
