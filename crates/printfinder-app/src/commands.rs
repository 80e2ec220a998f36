// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface and the handlers behind each subcommand.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use printfinder_core::error::{PrintfinderError, Result};
use printfinder_core::status;
use printfinder_core::types::{DeviceRecord, Protocol, ProtocolSet, ScanRange};
use printfinder_core::{AppConfig, HistoryLog, filter_records, lookup};
use printfinder_discovery::{DiscoveryEngine, DiscoveryObserver};

use crate::data_dir::{self, CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "printfinder")]
#[command(about = "Find printers over USB, raw TCP, SNMP, and mDNS, and look up their drivers")]
#[command(version)]
pub struct Cli {
    /// Directory holding config.json and the scan history
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one discovery pass and print what was found
    Scan(ScanArgs),
    /// Print every line of the scan history
    History,
    /// Empty the scan history
    ClearHistory,
    /// Open the driver search page for a record
    Open(OpenArgs),
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Enumerate USB printer-class devices
    #[arg(long)]
    pub usb: bool,
    /// Probe the raw print port on every host in the range
    #[arg(long)]
    pub network: bool,
    /// Query the printer MIB on every host in the range
    #[arg(long)]
    pub snmp: bool,
    /// Browse for IPP services
    #[arg(long)]
    pub mdns: bool,
    /// First three octets of the target range, e.g. 192.168.1
    #[arg(long)]
    pub prefix: Option<String>,
    /// First host octet
    #[arg(long)]
    pub start: Option<u32>,
    /// Last host octet
    #[arg(long)]
    pub end: Option<u32>,
    /// mDNS listen window in seconds
    #[arg(long)]
    pub mdns_timeout: Option<u64>,
    /// Keep records whose name or driver hint contains this text
    #[arg(long, default_value = "")]
    pub filter: String,
    /// Keep records whose name or driver hint contains this model text
    #[arg(long, default_value = "")]
    pub model: String,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// usb, network, snmp, or mdns
    #[arg(long)]
    pub source: Protocol,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub id: String,
    /// Print the URL instead of launching a browser
    #[arg(long)]
    pub print_only: bool,
}

/// Data directory, configuration, and history log for one invocation.
pub struct Context {
    pub config: AppConfig,
    pub history: HistoryLog,
}

impl Context {
    /// Resolve the data directory and load settings. Unusable settings fall
    /// back to defaults with a notice.
    pub fn load(data_dir: Option<&std::path::Path>) -> Result<Self> {
        let dir = data_dir::data_dir(data_dir)?;
        let config = match AppConfig::load(&dir.join(CONFIG_FILE)) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "config unusable; using defaults");
                eprintln!("{}", status::humanize_error(&e));
                AppConfig::default()
            }
        };
        let history = HistoryLog::new(dir.join(&config.history.file_name));
        info!(dir = %dir.display(), history = %history.path().display(), "data directory ready");
        Ok(Self { config, history })
    }
}

/// Progress and status to stderr.
struct TerminalObserver;

impl DiscoveryObserver for TerminalObserver {
    fn on_progress(&self, percent: u8) {
        let mut err = std::io::stderr();
        let _ = write!(err, "\r[{percent:>3}%]");
        if percent == 100 {
            let _ = writeln!(err);
        }
        let _ = err.flush();
    }

    fn on_status(&self, status: &str) {
        eprintln!("\r{status}");
    }
}

#[derive(Serialize)]
struct ScanReport<'a> {
    scanned_at: DateTime<Utc>,
    range: String,
    protocols: Vec<Protocol>,
    printers: &'a [DeviceRecord],
}

/// Protocol flags replace the configured set when any is given.
fn protocols_for(args: &ScanArgs, configured: ProtocolSet) -> ProtocolSet {
    let flags = [
        (Protocol::Usb, args.usb),
        (Protocol::Network, args.network),
        (Protocol::Snmp, args.snmp),
        (Protocol::Mdns, args.mdns),
    ];
    if flags.iter().any(|(_, on)| *on) {
        let chosen: Vec<Protocol> = flags.iter().filter(|(_, on)| *on).map(|(p, _)| *p).collect();
        ProtocolSet::only(&chosen)
    } else {
        configured
    }
}

/// Command-line range over configured range; an invalid range falls back to
/// the default with a notice.
fn range_for(args: &ScanArgs, config: &AppConfig) -> ScanRange {
    let prefix = args.prefix.as_deref().unwrap_or(&config.scan.prefix);
    let start = args.start.unwrap_or(config.scan.start);
    let end = args.end.unwrap_or(config.scan.end);
    ScanRange::try_new(start, end, prefix).unwrap_or_else(|e| {
        warn!(error = %e, "invalid scan range; using default");
        eprintln!("{}", status::humanize_error(&e));
        ScanRange::default()
    })
}

pub async fn scan(ctx: Context, args: ScanArgs) -> Result<()> {
    let protocols = protocols_for(&args, ctx.config.scan.protocols);
    let range = range_for(&args, &ctx.config);
    let mdns_timeout = args
        .mdns_timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.mdns.timeout());

    // USB detection enumerates the bus; keep it off the async workers.
    let config = ctx.config.clone();
    let engine = tokio::task::spawn_blocking(move || DiscoveryEngine::from_config(&config, &protocols))
        .await
        .map_err(|e| PrintfinderError::Discovery(format!("scanner setup: {e}")))?
        .with_history(ctx.history);
    let found = engine
        .discover(&protocols, range, mdns_timeout, &TerminalObserver)
        .await;
    let shown = filter_records(&found, &args.filter, &args.model);

    if args.json {
        let report = ScanReport {
            scanned_at: Utc::now(),
            range: range.to_string(),
            protocols: protocols.enabled(),
            printers: &shown,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&shown);
        if shown.len() != found.len() {
            println!("{} of {} shown after filtering.", shown.len(), found.len());
        }
    }
    Ok(())
}

fn print_table(records: &[DeviceRecord]) {
    for record in records {
        println!("{} [{}]", record.name, record.source.label());
        println!("    driver: {}", record.driver_hint);
        println!("    id:     {}", record.id);
        println!("    lookup: {}", record.lookup_url);
    }
}

pub fn history(ctx: &Context) -> Result<()> {
    let lines = ctx.history.read()?;
    if lines.is_empty() {
        println!("{}", status::NO_PRINTERS);
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

pub fn clear_history(ctx: &Context) -> Result<()> {
    ctx.history.clear()?;
    println!("History cleared.");
    Ok(())
}

pub fn open(args: &OpenArgs) -> Result<()> {
    let url = lookup::lookup_url(args.source, &args.name, &args.id);
    println!("{url}");
    if args.print_only {
        return Ok(());
    }
    open::that(&url).map_err(|e| PrintfinderError::Browser(e.to_string()))?;
    info!(%url, "opened driver lookup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_a_full_scan() {
        let cli = Cli::try_parse_from([
            "printfinder", "--data-dir", "/tmp/pf", "scan", "--snmp", "--prefix", "10.0.0",
            "--start", "5", "--end", "9", "--filter", "hp", "--json",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/pf")));
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(args.snmp && !args.usb);
        assert_eq!(args.prefix.as_deref(), Some("10.0.0"));
        assert_eq!((args.start, args.end), (Some(5), Some(9)));
        assert_eq!(args.filter, "hp");
        assert!(args.json);
    }

    #[test]
    fn open_parses_the_source() {
        let cli = Cli::try_parse_from([
            "printfinder", "open", "--source", "network", "--name", "x", "--id", "10.0.0.2",
        ])
        .unwrap();
        let Command::Open(args) = cli.command else {
            panic!("expected open");
        };
        assert_eq!(args.source, Protocol::Network);
        assert!(Cli::try_parse_from(["printfinder", "open", "--source", "fax", "--name", "x", "--id", "y"]).is_err());
    }

    #[test]
    fn flags_replace_the_configured_protocols() {
        let configured = ProtocolSet::default();
        let none = ScanArgs::default();
        assert_eq!(protocols_for(&none, configured), configured);

        let args = ScanArgs { mdns: true, ..ScanArgs::default() };
        assert_eq!(protocols_for(&args, configured).enabled(), vec![Protocol::Mdns]);
    }

    #[test]
    fn invalid_range_falls_back_to_default() {
        let config = AppConfig::default();
        let args = ScanArgs {
            start: Some(0),
            end: Some(300),
            ..ScanArgs::default()
        };
        assert_eq!(range_for(&args, &config), ScanRange::default());

        let args = ScanArgs {
            prefix: Some("10.1.2".into()),
            start: Some(20),
            end: Some(10),
            ..ScanArgs::default()
        };
        let range = range_for(&args, &config);
        assert_eq!((range.start(), range.end()), (10, 20));
        assert_eq!(range.prefix(), "10.1.2");
    }

    #[test]
    fn context_uses_defaults_for_a_broken_config() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "{ not json").unwrap();
        let ctx = Context::load(Some(tmp.path())).unwrap();
        assert_eq!(ctx.config, AppConfig::default());
        assert_eq!(ctx.history.path(), tmp.path().join("printer_history.txt"));
    }
}
