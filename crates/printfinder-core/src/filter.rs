// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory narrowing of a scan result. Never touches the network.

use crate::types::DeviceRecord;

/// Keep records matching both filters.
///
/// Each non-empty filter keeps a record iff it is a case-insensitive
/// substring of the record's `name` or `driver_hint`. Empty (or blank)
/// filters pass everything through. Order is preserved.
pub fn filter_records(
    records: &[DeviceRecord],
    free_text: &str,
    model_text: &str,
) -> Vec<DeviceRecord> {
    let free = normalize(free_text);
    let model = normalize(model_text);

    records
        .iter()
        .filter(|r| {
            let name = r.name.to_lowercase();
            let hint = r.driver_hint.to_lowercase();
            let hit = |needle: &Option<String>| match needle {
                Some(n) => name.contains(n.as_str()) || hint.contains(n.as_str()),
                None => true,
            };
            hit(&free) && hit(&model)
        })
        .cloned()
        .collect()
}

fn normalize(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Protocol;

    fn sample() -> Vec<DeviceRecord> {
        vec![
            DeviceRecord::new(Protocol::Usb, "HP LaserJet 1020", "HP LaserJet 1020 Driver", "0x03f0:0x2b17"),
            DeviceRecord::new(Protocol::Usb, "Canon PIXMA", "Canon PIXMA Driver", "0x04a9:0x1746"),
            DeviceRecord::new(
                Protocol::Network,
                "Network Printer (10.0.0.2)",
                "Generic Network Printer Driver",
                "10.0.0.2",
            ),
            DeviceRecord::new(Protocol::Snmp, "HP ETHERNET MULTI-ENVIRONMENT", "HP Color LaserJet", "10.0.0.9"),
        ]
    }

    #[test]
    fn empty_filters_pass_through() {
        let records = sample();
        assert_eq!(filter_records(&records, "", ""), records);
        assert_eq!(filter_records(&records, "   ", ""), records);
    }

    #[test]
    fn free_text_matches_name_or_driver_case_insensitively() {
        let records = sample();
        let hits = filter_records(&records, "laserjet", "");
        let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0x03f0:0x2b17", "10.0.0.9"]);

        let hits = filter_records(&records, "GENERIC", "");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "10.0.0.2");
    }

    #[test]
    fn both_filters_are_anded() {
        let records = sample();
        let hits = filter_records(&records, "hp", "color");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "10.0.0.9");
        assert!(filter_records(&records, "canon", "color").is_empty());
    }

    #[test]
    fn filtering_is_idempotent_and_a_subset() {
        let records = sample();
        for (a, b) in [("", ""), ("hp", ""), ("", "driver"), ("printer", "10.0"), ("zzz", "")] {
            let once = filter_records(&records, a, b);
            let twice = filter_records(&once, a, b);
            assert_eq!(once, twice);
            assert!(once.iter().all(|r| records.contains(r)));
        }
    }
}
