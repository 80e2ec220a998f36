// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printfinder core types, filtering, and history shared across all crates.

pub mod config;
pub mod error;
pub mod filter;
pub mod history;
pub mod lookup;
pub mod status;
pub mod types;

pub use config::AppConfig;
pub use error::PrintfinderError;
pub use filter::filter_records;
pub use history::HistoryLog;
pub use types::*;
