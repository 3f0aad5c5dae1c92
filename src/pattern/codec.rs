use crate::attributes::{get_things, Payload};
use crate::engine::channel::CommandChannel;
use crate::engine::messages::Value;
use crate::error::{CboxError, CboxResult};
use crate::schema::Schema;

// record: i32 LE time, u8 payload length n (1..=3), n payload bytes
const HEADER_SIZE: usize = 5;
pub const MAX_PAYLOAD: usize = 3;
pub const RECORD_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedEvent {
  pub time: i32,
  len: u8,
  bytes: [u8; MAX_PAYLOAD],
}

impl TimedEvent {
  pub fn new(time: i32, status: u8, data1: i8, data2: i8) -> Self {
    Self { time, len: 3, bytes: [status, data1 as u8, data2 as u8] }
  }

  pub fn from_payload(time: i32, payload: &[u8]) -> CboxResult<Self> {
    if payload.is_empty() || payload.len() > MAX_PAYLOAD {
      return Err(CboxError::InvalidEventArity(payload.len()));
    }
    let mut bytes = [0u8; MAX_PAYLOAD];
    bytes[..payload.len()].copy_from_slice(payload);
    Ok(Self { time, len: payload.len() as u8, bytes })
  }

  pub fn arity(&self) -> usize { self.len as usize }
  pub fn payload(&self) -> &[u8] { &self.bytes[..self.arity()] }
  pub fn status(&self) -> u8 { self.bytes[0] }
  pub fn data1(&self) -> Option<i8> { self.payload().get(1).map(|b| *b as i8) }
  pub fn data2(&self) -> Option<i8> { self.payload().get(2).map(|b| *b as i8) }

  pub fn write_to(&self, out: &mut Vec<u8>) {
    out.extend_from_slice(&self.time.to_le_bytes());
    out.push(self.len);
    out.extend_from_slice(self.payload());
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + self.arity());
    self.write_to(&mut out);
    out
  }
}

/// Packs one event record of `5 + payload.len()` bytes.
pub fn encode_event(time: i32, payload: &[u8]) -> CboxResult<Vec<u8>> {
  Ok(TimedEvent::from_payload(time, payload)?.to_bytes())
}

pub fn encode_events(events: &[TimedEvent]) -> Vec<u8> {
  let mut out = Vec::with_capacity(events.len() * RECORD_SIZE);
  for ev in events {
    ev.write_to(&mut out);
  }
  out
}

/// Splits a blob into events, following each record's length byte. Fails
/// without a partial result if the blob does not end on a record boundary.
pub fn decode_events(blob: &[u8]) -> CboxResult<Vec<TimedEvent>> {
  let malformed = |offset| CboxError::MalformedBlob { len: blob.len(), offset };
  let mut events = Vec::with_capacity(blob.len() / RECORD_SIZE);
  let mut ofs = 0;
  while ofs < blob.len() {
    let header = blob.get(ofs..ofs + HEADER_SIZE).ok_or_else(|| malformed(ofs))?;
    let time = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let n = header[4] as usize;
    if n == 0 || n > MAX_PAYLOAD {
      return Err(malformed(ofs));
    }
    let payload = blob.get(ofs + HEADER_SIZE..ofs + HEADER_SIZE + n).ok_or_else(|| malformed(ofs))?;
    events.push(TimedEvent::from_payload(time, payload)?);
    ofs += HEADER_SIZE + n;
  }
  Ok(events)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternData {
  pub events: Vec<TimedEvent>,
  pub length: i32,
}

impl PatternData {
  /// Parses the `(blob, length)` tuple the engine replies with.
  pub fn from_payload(p: &Payload) -> CboxResult<Self> {
    match p.values() {
      [Value::Blob(blob), Value::Int(length)] => Ok(Self { events: decode_events(blob)?, length: *length }),
      other => Err(CboxError::MalformedStatus {
        field: "pattern".into(),
        detail: format!("expected (blob, length), got {} values", other.len()),
      }),
    }
  }

  pub fn to_blob(&self) -> Vec<u8> { encode_events(&self.events) }

  /// Arguments for the engine's pattern-from-blob loader.
  pub fn to_args(&self) -> Vec<Value> {
    vec![Value::Blob(self.to_blob()), Value::Int(self.length)]
  }
}

/// Fetches the pattern currently being edited, if the engine has one.
pub fn get_pattern(ch: &dyn CommandChannel) -> CboxResult<Option<PatternData>> {
  let attrs = get_things(ch, "/get_pattern", &Schema::new().scalar("pattern"), &[])?;
  attrs.scalar("pattern").map(PatternData::from_payload).transpose()
}
