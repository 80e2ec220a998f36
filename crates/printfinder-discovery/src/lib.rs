// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printfinder discovery: the four printer scanners (USB, raw port 9100,
// SNMP printer-MIB, mDNS `_ipp._tcp`) and the engine that runs them
// concurrently and merges their results behind a single completion barrier.

pub mod ber;
pub mod engine;
pub mod mdns;
pub mod port;
pub mod scanner;
pub mod snmp;
pub mod usb;

pub use engine::{DiscoveryEngine, DiscoveryObserver, NoopObserver};
pub use mdns::MdnsScanner;
pub use port::PortScanner;
pub use scanner::{Capability, Progress, ScanRequest, Scanner};
pub use snmp::SnmpScanner;
pub use usb::UsbScanner;
