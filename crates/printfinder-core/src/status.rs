// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-English status lines shown while a scan runs and when it ends.
//
// An empty result is a normal outcome ("No printers found."), never an error.

use crate::error::PrintfinderError;
use crate::types::Protocol;

pub const SEARCHING: &str = "Searching for printers...";
pub const NO_PRINTERS: &str = "No printers found.";

/// Phase label for a protocol starting its sweep.
pub fn searching_via(protocol: Protocol) -> String {
    format!("Searching via {}...", protocol.label())
}

/// Final line for a finished scan.
pub fn summary(found: usize) -> String {
    if found == 0 {
        NO_PRINTERS.to_string()
    } else {
        format!("Found {found} printer(s).")
    }
}

/// One-line, user-facing explanation of an error with a suggestion.
pub fn humanize_error(err: &PrintfinderError) -> String {
    match err {
        PrintfinderError::InvalidRange(_) => {
            "Invalid IP range. Using 192.168.1.1-254 instead.".into()
        }
        PrintfinderError::Config(detail) => {
            format!("The settings file could not be used ({detail}). Defaults apply.")
        }
        PrintfinderError::Browser(_) => {
            "Could not open a web browser. Copy the link and open it manually.".into()
        }
        PrintfinderError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            "Permission denied. Check that the data directory is writable.".into()
        }
        PrintfinderError::Unsupported(what) => {
            format!("{what} is not available on this system.")
        }
        other => format!("Something went wrong: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scan_is_reported_plainly() {
        assert_eq!(summary(0), "No printers found.");
        assert_eq!(summary(3), "Found 3 printer(s).");
    }

    #[test]
    fn phase_labels_name_the_protocol() {
        assert_eq!(searching_via(Protocol::Usb), "Searching via USB...");
        assert_eq!(searching_via(Protocol::Mdns), "Searching via Bonjour/mDNS...");
    }

    #[test]
    fn errors_become_sentences() {
        let msg = humanize_error(&PrintfinderError::Unsupported("mDNS".into()));
        assert_eq!(msg, "mDNS is not available on this system.");
    }
}
