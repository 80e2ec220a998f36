// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printfinder.

use thiserror::Error;

/// Top-level error type for all Printfinder operations.
///
/// Scanners never hand these to the orchestrator: a failed probe is "no
/// record". They surface from configuration, history, and the front end.
#[derive(Debug, Error)]
pub enum PrintfinderError {
    // -- Discovery --
    #[error("printer discovery failed: {0}")]
    Discovery(String),

    #[error("USB enumeration failed: {0}")]
    Usb(String),

    #[error("SNMP exchange failed: {0}")]
    Snmp(String),

    #[error("mDNS browse failed: {0}")]
    Mdns(String),

    #[error("capability not available: {0}")]
    Unsupported(String),

    // -- User input --
    #[error("invalid scan range: {0}")]
    InvalidRange(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Front end --
    #[error("could not open browser: {0}")]
    Browser(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintfinderError>;
