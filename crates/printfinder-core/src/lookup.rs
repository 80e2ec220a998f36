// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driver lookup URLs.
//
// A record's "download" action is a web search. USB records search by the
// device name; network-derived records only know an address, so they search
// by that.

use crate::types::Protocol;

/// Search endpoint the query is appended to.
pub const SEARCH_BASE: &str = "https://www.google.com/search?q=";

/// Free-text search query for a record.
pub fn lookup_query(source: Protocol, name: &str, id: &str) -> String {
    match source {
        Protocol::Usb => format!("{name} printer driver"),
        Protocol::Network => format!("network printer driver {id}"),
        Protocol::Snmp | Protocol::Mdns => format!("printer driver {id}"),
    }
}

/// Full lookup URL for a record.
pub fn lookup_url(source: Protocol, name: &str, id: &str) -> String {
    format!("{SEARCH_BASE}{}", form_encode(&lookup_query(source, name, id)))
}

/// `application/x-www-form-urlencoded` encoding: spaces become `+`,
/// unreserved bytes pass through, everything else is percent-escaped.
pub fn form_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'*' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usb_records_search_by_name() {
        assert_eq!(
            lookup_url(Protocol::Usb, "HP LaserJet", "0x03f0:0x1234"),
            "https://www.google.com/search?q=HP+LaserJet+printer+driver"
        );
    }

    #[test]
    fn network_records_search_by_address() {
        assert_eq!(
            lookup_url(Protocol::Network, "Network Printer (10.0.0.2)", "10.0.0.2"),
            "https://www.google.com/search?q=network+printer+driver+10.0.0.2"
        );
        assert_eq!(
            lookup_url(Protocol::Snmp, "whatever", "10.0.0.7"),
            "https://www.google.com/search?q=printer+driver+10.0.0.7"
        );
        assert_eq!(
            lookup_url(Protocol::Mdns, "whatever", "10.0.0.8"),
            "https://www.google.com/search?q=printer+driver+10.0.0.8"
        );
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(form_encode("a&b=c"), "a%26b%3Dc");
        assert_eq!(form_encode("Brother (USB)"), "Brother+%28USB%29");
        assert_eq!(form_encode("é"), "%C3%A9");
    }
}
