// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for result filtering and the SNMP codec.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use printfinder_core::filter::filter_records;
use printfinder_core::types::{DeviceRecord, Protocol};
use printfinder_discovery::ber::{Message, PDU_GET_RESPONSE, Value};

/// A 254-host sweep's worth of mixed records.
fn sample_records() -> Vec<DeviceRecord> {
    (1..=254u32)
        .map(|i| match i % 3 {
            0 => DeviceRecord::new(
                Protocol::Network,
                format!("Network Printer (192.168.1.{i})"),
                "Generic Network Printer Driver",
                format!("192.168.1.{i}"),
            ),
            1 => DeviceRecord::new(
                Protocol::Snmp,
                format!("HP LaserJet {i}"),
                format!("HP LaserJet {i} PCL6"),
                format!("192.168.1.{i}"),
            ),
            _ => DeviceRecord::new(
                Protocol::Mdns,
                format!("Brother HL-{i}._ipp._tcp.local."),
                "mDNS Printer",
                format!("192.168.1.{i}"),
            ),
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let records = sample_records();

    c.bench_function("filter_records (text + model)", |b| {
        b.iter(|| filter_records(black_box(&records), black_box("laserjet"), black_box("pcl6")));
    });

    c.bench_function("filter_records (empty filters)", |b| {
        b.iter(|| filter_records(black_box(&records), "", ""));
    });
}

fn bench_snmp_codec(c: &mut Criterion) {
    c.bench_function("snmp get_request encode", |b| {
        b.iter(|| {
            Message::get_request(black_box("public"), black_box(42), "1.3.6.1.2.1.25.3.2.1.3.1")
                .encode()
                .unwrap()
        });
    });

    let response = Message {
        pdu_tag: PDU_GET_RESPONSE,
        varbinds: vec![(
            "1.3.6.1.2.1.1.1.0".to_string(),
            Value::OctetString(b"HP ETHERNET MULTI-ENVIRONMENT,ROM none,JETDIRECT,JD153".to_vec()),
        )],
        ..Message::get_request("public", 42, "1.3.6.1.2.1.1.1.0")
    }
    .encode()
    .unwrap();

    c.bench_function("snmp get_response decode", |b| {
        b.iter(|| Message::decode(black_box(&response)).unwrap());
    });
}

criterion_group!(benches, bench_filter, bench_snmp_codec);
criterion_main!(benches);
