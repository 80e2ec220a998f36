// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal BER codec for SNMPv1 messages.
//
// Just enough ASN.1 for a single-varbind GetRequest and the matching
// GetResponse:
//
//   Message ::= SEQUENCE {
//       version    INTEGER,          -- 0 = v1
//       community  OCTET STRING,
//       pdu        [0xA0 | 0xA2] IMPLICIT SEQUENCE {
//           request-id    INTEGER,
//           error-status  INTEGER,
//           error-index   INTEGER,
//           varbinds      SEQUENCE OF SEQUENCE { name OID, value ANY }
//       }
//   }
//
// Only definite lengths are supported; that is all SNMP agents emit.

use printfinder_core::error::{PrintfinderError, Result};

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_OID: u8 = 0x06;
pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_IP_ADDRESS: u8 = 0x40;
pub const TAG_COUNTER32: u8 = 0x41;
pub const TAG_GAUGE32: u8 = 0x42;
pub const TAG_TIMETICKS: u8 = 0x43;

pub const PDU_GET_REQUEST: u8 = 0xA0;
pub const PDU_GET_RESPONSE: u8 = 0xA2;

/// v2 exception markers (noSuchObject, noSuchInstance, endOfMibView).
pub const EXCEPTION_TAGS: std::ops::RangeInclusive<u8> = 0x80..=0x82;

/// SNMP version field value for v1.
pub const SNMP_V1: i64 = 0;

/// A decoded varbind value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectId(String),
    IpAddress([u8; 4]),
    Unsigned(u8, u64),
    Exception(u8),
    Other(u8, Vec<u8>),
}

impl Value {
    /// Printable form of a real value. `None` for NULL, exceptions, and
    /// blank strings: those mean the agent has nothing for this OID.
    /// Control characters inside strings become spaces.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            Self::Integer(i) => i.to_string(),
            Self::OctetString(bytes) => String::from_utf8_lossy(bytes)
                .chars()
                .map(|c| if c.is_control() { ' ' } else { c })
                .collect::<String>()
                .trim()
                .to_string(),
            Self::ObjectId(oid) => oid.clone(),
            Self::IpAddress([a, b, c, d]) => format!("{a}.{b}.{c}.{d}"),
            Self::Unsigned(_, v) => v.to_string(),
            Self::Null | Self::Exception(_) | Self::Other(..) => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

/// A whole SNMP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: i64,
    pub community: String,
    pub pdu_tag: u8,
    pub request_id: i64,
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<(String, Value)>,
}

impl Message {
    /// A v1 GetRequest for one OID.
    pub fn get_request(community: &str, request_id: i32, oid: &str) -> Self {
        Self {
            version: SNMP_V1,
            community: community.to_string(),
            pdu_tag: PDU_GET_REQUEST,
            request_id: i64::from(request_id),
            error_status: 0,
            error_index: 0,
            varbinds: vec![(oid.to_string(), Value::Null)],
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut varbinds = Vec::new();
        for (oid, value) in &self.varbinds {
            let mut bind = Vec::new();
            write_tlv(&mut bind, TAG_OID, &encode_oid(oid)?);
            write_value(&mut bind, value);
            write_tlv(&mut varbinds, TAG_SEQUENCE, &bind);
        }

        let mut pdu = Vec::new();
        write_tlv(&mut pdu, TAG_INTEGER, &integer_content(self.request_id));
        write_tlv(&mut pdu, TAG_INTEGER, &integer_content(self.error_status));
        write_tlv(&mut pdu, TAG_INTEGER, &integer_content(self.error_index));
        write_tlv(&mut pdu, TAG_SEQUENCE, &varbinds);

        let mut body = Vec::new();
        write_tlv(&mut body, TAG_INTEGER, &integer_content(self.version));
        write_tlv(&mut body, TAG_OCTET_STRING, self.community.as_bytes());
        write_tlv(&mut body, self.pdu_tag, &pdu);

        let mut out = Vec::with_capacity(body.len() + 4);
        write_tlv(&mut out, TAG_SEQUENCE, &body);
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut outer = Reader::new(buf);
        let mut body = Reader::new(outer.expect(TAG_SEQUENCE)?);

        let version = decode_integer(body.expect(TAG_INTEGER)?)?;
        let community = String::from_utf8_lossy(body.expect(TAG_OCTET_STRING)?).into_owned();
        let (pdu_tag, pdu) = body.read_tlv()?;
        if !(0xA0..=0xA4).contains(&pdu_tag) {
            return Err(malformed(format!("unexpected PDU tag {pdu_tag:#04x}")));
        }

        let mut pdu = Reader::new(pdu);
        let request_id = decode_integer(pdu.expect(TAG_INTEGER)?)?;
        let error_status = decode_integer(pdu.expect(TAG_INTEGER)?)?;
        let error_index = decode_integer(pdu.expect(TAG_INTEGER)?)?;

        let mut list = Reader::new(pdu.expect(TAG_SEQUENCE)?);
        let mut varbinds = Vec::new();
        while !list.is_empty() {
            let mut bind = Reader::new(list.expect(TAG_SEQUENCE)?);
            let oid = decode_oid(bind.expect(TAG_OID)?)?;
            let (tag, content) = bind.read_tlv()?;
            varbinds.push((oid, decode_value(tag, content)?));
        }

        Ok(Self {
            version,
            community,
            pdu_tag,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

// -- encoding ---------------------------------------------------------------

fn write_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    write_length(out, content.len());
    out.extend_from_slice(content);
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => write_tlv(out, TAG_INTEGER, &integer_content(*i)),
        Value::OctetString(bytes) => write_tlv(out, TAG_OCTET_STRING, bytes),
        Value::Null => write_tlv(out, TAG_NULL, &[]),
        Value::ObjectId(oid) => match encode_oid(oid) {
            Ok(content) => write_tlv(out, TAG_OID, &content),
            Err(_) => write_tlv(out, TAG_NULL, &[]),
        },
        Value::IpAddress(octets) => write_tlv(out, TAG_IP_ADDRESS, octets),
        Value::Unsigned(tag, v) => {
            let mut content = v.to_be_bytes().to_vec();
            while content.len() > 1 && content[0] == 0 && content[1] & 0x80 == 0 {
                content.remove(0);
            }
            if content[0] & 0x80 != 0 {
                content.insert(0, 0);
            }
            write_tlv(out, *tag, &content)
        }
        Value::Exception(tag) => write_tlv(out, *tag, &[]),
        Value::Other(tag, bytes) => write_tlv(out, *tag, bytes),
    }
}

/// Minimal two's-complement big-endian encoding.
fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let (b, next) = (bytes[start], bytes[start + 1]);
        let redundant = (b == 0x00 && next & 0x80 == 0) || (b == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Content octets of a dotted OID such as `1.3.6.1.2.1.1.1.0`.
pub fn encode_oid(oid: &str) -> Result<Vec<u8>> {
    let arcs = oid
        .trim()
        .trim_start_matches('.')
        .split('.')
        .map(|arc| arc.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| malformed(format!("bad OID '{oid}'")))?;

    if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
        return Err(malformed(format!("bad OID '{oid}'")));
    }

    let mut out = Vec::new();
    write_subid(&mut out, arcs[0] * 40 + arcs[1]);
    for &arc in &arcs[2..] {
        write_subid(&mut out, arc);
    }
    Ok(out)
}

fn write_subid(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        groups.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    out.extend(groups.iter().rev());
}

// -- decoding ---------------------------------------------------------------

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn byte(&mut self) -> Result<u8> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| malformed("truncated message"))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_length(&mut self) -> Result<usize> {
        let first = self.byte()?;
        if first < 0x80 {
            return Ok(usize::from(first));
        }
        let count = usize::from(first & 0x7F);
        if count == 0 || count > 4 {
            return Err(malformed("unsupported length form"));
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | usize::from(self.byte()?);
        }
        Ok(len)
    }

    fn read_tlv(&mut self) -> Result<(u8, &'a [u8])> {
        let tag = self.byte()?;
        let len = self.read_length()?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| malformed("length overruns buffer"))?;
        let buf = self.buf;
        let content = &buf[self.pos..end];
        self.pos = end;
        Ok((tag, content))
    }

    fn expect(&mut self, tag: u8) -> Result<&'a [u8]> {
        let (found, content) = self.read_tlv()?;
        if found != tag {
            return Err(malformed(format!("expected tag {tag:#04x}, found {found:#04x}")));
        }
        Ok(content)
    }
}

fn decode_integer(content: &[u8]) -> Result<i64> {
    if content.is_empty() || content.len() > 8 {
        return Err(malformed("bad INTEGER length"));
    }
    let negative = content[0] & 0x80 != 0;
    let mut value: i64 = if negative { -1 } else { 0 };
    for &b in content {
        value = (value << 8) | i64::from(b);
    }
    Ok(value)
}

fn decode_unsigned(content: &[u8]) -> Result<u64> {
    if content.is_empty() || content.len() > 9 {
        return Err(malformed("bad unsigned length"));
    }
    Ok(content.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

fn decode_oid(content: &[u8]) -> Result<String> {
    let mut subids = Vec::new();
    let mut value: u64 = 0;
    for (i, &b) in content.iter().enumerate() {
        value = (value << 7) | u64::from(b & 0x7F);
        if b & 0x80 == 0 {
            subids.push(value);
            value = 0;
        } else if i == content.len() - 1 {
            return Err(malformed("unterminated OID"));
        }
    }
    let first = *subids.first().ok_or_else(|| malformed("empty OID"))?;
    let (a, b) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };
    let mut parts = vec![a.to_string(), b.to_string()];
    parts.extend(subids[1..].iter().map(u64::to_string));
    Ok(parts.join("."))
}

fn decode_value(tag: u8, content: &[u8]) -> Result<Value> {
    Ok(match tag {
        TAG_INTEGER => Value::Integer(decode_integer(content)?),
        TAG_OCTET_STRING => Value::OctetString(content.to_vec()),
        TAG_NULL => Value::Null,
        TAG_OID => Value::ObjectId(decode_oid(content)?),
        TAG_IP_ADDRESS => match content {
            [a, b, c, d] => Value::IpAddress([*a, *b, *c, *d]),
            _ => return Err(malformed("bad IpAddress length")),
        },
        TAG_COUNTER32 | TAG_GAUGE32 | TAG_TIMETICKS => {
            Value::Unsigned(tag, decode_unsigned(content)?)
        }
        t if EXCEPTION_TAGS.contains(&t) => Value::Exception(t),
        other => Value::Other(other, content.to_vec()),
    })
}

fn malformed(detail: impl Into<String>) -> PrintfinderError {
    PrintfinderError::Snmp(format!("malformed BER: {}", detail.into()))
}
