// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan history: an append-only flat text file, one line per displayed record.
//
// Format (UTF-8, newline-terminated):
//   <name> | <driver_hint> | <id> | <source>
//
// The file is opened per operation; no handle outlives a call.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::Result;
use crate::types::DeviceRecord;

/// Default file name inside the data directory.
pub const HISTORY_FILE: &str = "printer_history.txt";

/// Append-only history of every record a scan produced.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Bind to a history file. Nothing is created until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per record, in order.
    #[instrument(skip_all, fields(path = %self.path.display(), count = records.len()))]
    pub fn append(&self, records: &[DeviceRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut buf = String::new();
        for record in records {
            buf.push_str(&record.history_line());
            buf.push('\n');
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf.as_bytes())?;
        debug!("history appended");
        Ok(())
    }

    /// Every non-blank line, trimmed, in file order. A missing file is an
    /// empty history.
    pub fn read(&self) -> Result<Vec<String>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Truncate the history to zero length.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn clear(&self) -> Result<()> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        debug!("history cleared");
        Ok(())
    }
}
