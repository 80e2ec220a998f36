// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Locally attached USB printers.
//
// A device is a printer if its device class or any interface class is the
// USB Printer Class (0x07). Names come from the manufacturer and product
// string descriptors, falling back to the hex vendor/product ids when a
// descriptor can't be read.

use std::collections::HashSet;

use futures::future::BoxFuture;
use nusb::MaybeFuture;
use tracing::{debug, info, warn};

use printfinder_core::types::{DeviceRecord, Protocol};

use crate::scanner::{Capability, Progress, ScanRequest, Scanner};

/// USB-IF base class code for printers.
pub const PRINTER_CLASS: u8 = 0x07;

/// What we need from one enumerated USB device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_class: u8,
    pub interface_classes: Vec<u8>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl UsbDeviceSummary {
    fn from_device_info(dev: &nusb::DeviceInfo) -> Self {
        Self {
            vendor_id: dev.vendor_id(),
            product_id: dev.product_id(),
            device_class: dev.class(),
            interface_classes: dev.interfaces().map(|i| i.class()).collect(),
            manufacturer: dev.manufacturer_string().map(String::from),
            product: dev.product_string().map(String::from),
        }
    }

    /// Printer class at device level or on any interface.
    pub fn is_printer(&self) -> bool {
        self.device_class == PRINTER_CLASS || self.interface_classes.contains(&PRINTER_CLASS)
    }

    /// `"<manufacturer> <product>"`, with hex-id fallbacks for unreadable
    /// descriptors.
    pub fn display_name(&self) -> String {
        let manufacturer = non_blank(self.manufacturer.as_deref())
            .unwrap_or_else(|| format!("Vendor:{:#06x}", self.vendor_id));
        let product = non_blank(self.product.as_deref())
            .unwrap_or_else(|| format!("Product:{:#06x}", self.product_id));
        format!("{manufacturer} {product}").trim().to_string()
    }

    /// `"<vendorHex>:<productHex>"`, e.g. `0x03f0:0x1234`.
    pub fn device_id(&self) -> String {
        format!("{:#06x}:{:#06x}", self.vendor_id, self.product_id)
    }

    /// The record for this device, or `None` if it isn't a printer.
    pub fn to_record(&self) -> Option<DeviceRecord> {
        if !self.is_printer() {
            return None;
        }
        let name = self.display_name();
        let driver_hint = format!("{name} Driver");
        Some(DeviceRecord::new(Protocol::Usb, name, driver_hint, self.device_id()))
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// Printer records for `devices`, deduplicated by `(name, id)`. The first
/// occurrence wins and enumeration order is kept.
pub fn printers_from(devices: impl IntoIterator<Item = UsbDeviceSummary>) -> Vec<DeviceRecord> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter_map(|dev| dev.to_record())
        .filter(|record| seen.insert((record.name.clone(), record.id.clone())))
        .collect()
}

/// Enumerate the host's USB bus. Blocking.
fn enumerate() -> Result<Vec<UsbDeviceSummary>, String> {
    let devices = nusb::list_devices().wait().map_err(|e| e.to_string())?;
    Ok(devices
        .map(|dev| UsbDeviceSummary::from_device_info(&dev))
        .collect())
}

/// Scans locally attached USB devices for printers.
#[derive(Debug, Clone)]
pub struct UsbScanner {
    capability: Capability,
}

impl UsbScanner {
    /// Check that the USB backend can enumerate at all.
    pub fn detect() -> Self {
        let capability = match nusb::list_devices().wait() {
            Ok(_) => Capability::Available,
            Err(e) => {
                warn!(error = %e, "USB enumeration unavailable");
                Capability::Unsupported(format!("USB enumeration: {e}"))
            }
        };
        Self { capability }
    }
}

impl Scanner for UsbScanner {
    fn protocol(&self) -> Protocol {
        Protocol::Usb
    }

    fn capability(&self) -> Capability {
        self.capability.clone()
    }

    fn scan(&self, _request: ScanRequest, progress: Progress) -> BoxFuture<'_, Vec<DeviceRecord>> {
        Box::pin(async move {
            let devices = match tokio::task::spawn_blocking(enumerate).await {
                Ok(Ok(devices)) => devices,
                Ok(Err(e)) => {
                    warn!(error = %e, "USB enumeration failed");
                    Vec::new()
                }
                Err(e) => {
                    warn!(error = %e, "USB enumeration task failed");
                    Vec::new()
                }
            };
            debug!(count = devices.len(), "USB devices enumerated");

            let printers = printers_from(devices);
            for p in &printers {
                info!(name = %p.name, id = %p.id, "USB printer found");
            }
            progress.report(100);
            printers
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(vendor_id: u16, product_id: u16, class: u8, interfaces: &[u8]) -> UsbDeviceSummary {
        UsbDeviceSummary {
            vendor_id,
            product_id,
            device_class: class,
            interface_classes: interfaces.to_vec(),
            manufacturer: Some("HP".into()),
            product: Some("LaserJet".into()),
        }
    }

    #[test]
    fn printer_class_on_device_or_interface() {
        assert!(device(1, 2, PRINTER_CLASS, &[]).is_printer());
        assert!(device(1, 2, 0x00, &[0x03, PRINTER_CLASS]).is_printer());
        assert!(!device(1, 2, 0x00, &[0x03, 0x08]).is_printer());
        assert!(!device(1, 2, 0x09, &[0x09]).is_printer());
    }

    #[test]
    fn record_fields() {
        let record = device(0x03f0, 0x1234, 0x00, &[PRINTER_CLASS])
            .to_record()
            .unwrap();
        assert_eq!(record.name, "HP LaserJet");
        assert_eq!(record.driver_hint, "HP LaserJet Driver");
        assert_eq!(record.id, "0x03f0:0x1234");
        assert_eq!(record.source, Protocol::Usb);
        assert_eq!(
            record.lookup_url,
            "https://www.google.com/search?q=HP+LaserJet+printer+driver"
        );
    }

    #[test]
    fn unreadable_descriptors_fall_back_to_hex_ids() {
        let mut dev = device(0x04a9, 0x1746, PRINTER_CLASS, &[]);
        dev.manufacturer = None;
        dev.product = Some("   ".into());
        assert_eq!(dev.display_name(), "Vendor:0x04a9 Product:0x1746");
    }

    #[test]
    fn duplicate_devices_collapse_to_one_record() {
        let dev = device(0x03f0, 0x1234, PRINTER_CLASS, &[]);
        let printers = printers_from(vec![dev.clone(), dev]);
        assert_eq!(printers.len(), 1);
    }

    #[test]
    fn non_printers_are_skipped_and_order_is_kept() {
        let mut canon = device(0x04a9, 0x1746, 0x00, &[PRINTER_CLASS]);
        canon.manufacturer = Some("Canon".into());
        canon.product = Some("PIXMA".into());
        let keyboard = device(0x046d, 0xc31c, 0x00, &[0x03]);
        let hp = device(0x03f0, 0x1234, PRINTER_CLASS, &[]);

        let printers = printers_from(vec![canon, keyboard, hp]);
        let names: Vec<&str> = printers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Canon PIXMA", "HP LaserJet"]);
    }

    #[test]
    fn same_name_different_id_is_kept() {
        let a = device(0x03f0, 0x1234, PRINTER_CLASS, &[]);
        let b = device(0x03f0, 0x1235, PRINTER_CLASS, &[]);
        assert_eq!(printers_from(vec![a, b]).len(), 2);
    }
}
