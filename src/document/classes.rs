use std::fmt;
use std::sync::Arc;

use super::{DocClass, DocObj, Document};
use crate::attributes::{Attributes, Payload};
use crate::engine::messages::Value;
use crate::error::{CboxError, CboxResult};
use crate::schema::Schema;

fn malformed(field: &str, detail: impl Into<String>) -> CboxError {
  CboxError::MalformedStatus { field: field.to_string(), detail: detail.into() }
}

fn tuple<'a>(p: &'a Payload, field: &str, arity: usize) -> CboxResult<&'a [Value]> {
  let vs = p.values();
  if vs.len() != arity {
    return Err(malformed(field, format!("expected {arity} values, got {}", vs.len())));
  }
  Ok(vs)
}

fn int_at(vs: &[Value], i: usize, field: &str) -> CboxResult<i32> {
  vs.get(i).and_then(Value::as_i32).ok_or_else(|| malformed(field, format!("item {i} is not an integer")))
}

fn str_at<'a>(vs: &'a [Value], i: usize, field: &str) -> CboxResult<&'a str> {
  vs.get(i).and_then(Value::as_str).ok_or_else(|| malformed(field, format!("item {i} is not a string")))
}

fn require_i32(attrs: &Attributes, field: &str) -> CboxResult<i32> {
  attrs.get_i32(field).ok_or_else(|| malformed(field, "missing or not an integer"))
}

fn require_str<'a>(attrs: &'a Attributes, field: &str) -> CboxResult<&'a str> {
  attrs.get_str(field).ok_or_else(|| malformed(field, "missing or not a string"))
}

/// A MIDI pattern. Its status is the raw attribute bag.
#[derive(Debug)]
pub struct DocPattern {
  uuid: String,
}

impl DocPattern {
  pub fn new(uuid: String) -> Self { Self { uuid } }

  pub fn set_name(&self, doc: &Document, name: &str) -> CboxResult<()> {
    doc.cmd_by_uuid(&self.uuid, "/name", &[name.into()], None)
  }
}

impl DocClass for DocPattern {
  const CLASS_NAME: &'static str = "cbox_midi_pattern";
  type Status = Attributes;

  fn uuid(&self) -> &str { &self.uuid }

  fn status_fields() -> Schema {
    Schema::new().scalar("event_count").scalar("loop_end").scalar("name")
  }

  fn transform_status(_doc: &Document, status: Attributes) -> CboxResult<Attributes> {
    Ok(status)
  }
}

/// One clip placed on a track. Pattern and clip references are resolved to
/// shared proxies when the status is transformed, not when replies arrive.
#[derive(Clone, Debug)]
pub struct ClipItem {
  pub pos: i32,
  pub offset: i32,
  pub length: i32,
  pub pattern: Arc<DocObj>,
  pub clip: Arc<DocObj>,
}

impl ClipItem {
  fn resolve(doc: &Document, pos: i32, offset: i32, length: i32, pattern: &str, clip: &str) -> CboxResult<Self> {
    Ok(Self { pos, offset, length, pattern: doc.map_uuid(pattern)?, clip: doc.map_uuid(clip)? })
  }
}

impl fmt::Display for ClipItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "pos={} offset={} length={} pattern={} clip={}",
      self.pos,
      self.offset,
      self.length,
      self.pattern.uuid(),
      self.clip.uuid()
    )
  }
}

impl PartialEq for ClipItem {
  fn eq(&self, other: &Self) -> bool {
    self.pos == other.pos
      && self.offset == other.offset
      && self.length == other.length
      && self.pattern.uuid() == other.pattern.uuid()
      && self.clip.uuid() == other.clip.uuid()
  }
}

#[derive(Debug)]
pub struct DocTrackClip {
  uuid: String,
}

impl DocTrackClip {
  pub fn new(uuid: String) -> Self { Self { uuid } }

  pub fn delete(&self, doc: &Document) -> CboxResult<()> {
    doc.cmd_by_uuid(&self.uuid, "/delete", &[], None)
  }
}

impl DocClass for DocTrackClip {
  const CLASS_NAME: &'static str = "cbox_track_item";
  type Status = ClipItem;

  fn uuid(&self) -> &str { &self.uuid }

  fn status_fields() -> Schema {
    Schema::new().scalar("pos").scalar("offset").scalar("length").scalar("pattern").scalar("uuid")
  }

  fn transform_status(doc: &Document, status: Attributes) -> CboxResult<ClipItem> {
    ClipItem::resolve(
      doc,
      require_i32(&status, "pos")?,
      require_i32(&status, "offset")?,
      require_i32(&status, "length")?,
      require_str(&status, "pattern")?,
      require_str(&status, "uuid")?,
    )
  }
}

#[derive(Debug)]
pub struct TrackStatus {
  pub name: Option<String>,
  pub clips: Vec<ClipItem>,
}

#[derive(Debug)]
pub struct DocTrack {
  uuid: String,
}

impl DocTrack {
  pub fn new(uuid: String) -> Self { Self { uuid } }

  pub fn set_name(&self, doc: &Document, name: &str) -> CboxResult<()> {
    doc.cmd_by_uuid(&self.uuid, "/name", &[name.into()], None)
  }

  pub fn add_clip(&self, doc: &Document, pos: i32, offset: i32, length: i32, pattern: &DocObj) -> CboxResult<Arc<DocObj>> {
    let args: [Value; 4] = [pos.into(), offset.into(), length.into(), pattern.uuid().into()];
    doc.makeobj_by_uuid(&self.uuid, "/add_clip", &args)
  }
}

impl DocClass for DocTrack {
  const CLASS_NAME: &'static str = "cbox_track";
  type Status = TrackStatus;

  fn uuid(&self) -> &str { &self.uuid }

  fn status_fields() -> Schema {
    Schema::new().sequence("clip").scalar("name")
  }

  fn transform_status(doc: &Document, status: Attributes) -> CboxResult<TrackStatus> {
    let clips = status
      .sequence("clip")
      .iter()
      .map(|p| -> CboxResult<ClipItem> {
        let vs = tuple(p, "clip", 5)?;
        ClipItem::resolve(
          doc,
          int_at(vs, 0, "clip")?,
          int_at(vs, 1, "clip")?,
          int_at(vs, 2, "clip")?,
          str_at(vs, 3, "clip")?,
          str_at(vs, 4, "clip")?,
        )
      })
      .collect::<CboxResult<Vec<_>>>()?;
    Ok(TrackStatus { name: status.get_str("name").map(str::to_string), clips })
  }
}

#[derive(Debug)]
pub struct TrackItem {
  pub name: String,
  pub count: i32,
  pub track: Arc<DocObj>,
}

#[derive(Debug)]
pub struct PatternItem {
  pub name: String,
  pub length: i32,
  pub pattern: Arc<DocObj>,
}

#[derive(Debug)]
pub struct SongStatus {
  pub tracks: Vec<TrackItem>,
  pub patterns: Vec<PatternItem>,
}

#[derive(Debug)]
pub struct DocSong {
  uuid: String,
}

impl DocSong {
  pub fn new(uuid: String) -> Self { Self { uuid } }
}

impl DocClass for DocSong {
  const CLASS_NAME: &'static str = "cbox_song";
  type Status = SongStatus;

  fn uuid(&self) -> &str { &self.uuid }

  fn status_fields() -> Schema {
    Schema::new().sequence("track").sequence("pattern")
  }

  fn transform_status(doc: &Document, status: Attributes) -> CboxResult<SongStatus> {
    let tracks = status
      .sequence("track")
      .iter()
      .map(|p| -> CboxResult<TrackItem> {
        let vs = tuple(p, "track", 3)?;
        Ok(TrackItem {
          name: str_at(vs, 0, "track")?.to_string(),
          count: int_at(vs, 1, "track")?,
          track: doc.map_uuid(str_at(vs, 2, "track")?)?,
        })
      })
      .collect::<CboxResult<Vec<_>>>()?;
    let patterns = status
      .sequence("pattern")
      .iter()
      .map(|p| -> CboxResult<PatternItem> {
        let vs = tuple(p, "pattern", 3)?;
        Ok(PatternItem {
          name: str_at(vs, 0, "pattern")?.to_string(),
          length: int_at(vs, 1, "pattern")?,
          pattern: doc.map_uuid(str_at(vs, 2, "pattern")?)?,
        })
      })
      .collect::<CboxResult<Vec<_>>>()?;
    Ok(SongStatus { tracks, patterns })
  }
}
