pub mod classes;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::attributes::{get_things_with, Attributes, UnmatchedReplies};
use crate::commands;
use crate::engine::channel::{CommandChannel, ReplyFn};
use crate::engine::messages::Value;
use crate::error::{CboxError, CboxResult};
use crate::schema::Schema;
use crate::settings::ClientSettings;

pub use classes::{ClipItem, DocPattern, DocSong, DocTrack, DocTrackClip, PatternItem, SongStatus, TrackItem, TrackStatus};

pub const DEFAULT_UUID_PREFIX: &str = "/doc/uuid";

/// Behaviour shared by every proxy class: the class name the engine reports,
/// the fields its `/status` command returns, and how those fields become a
/// richer status value.
pub trait DocClass {
  const CLASS_NAME: &'static str;
  type Status;

  fn uuid(&self) -> &str;

  fn status_fields() -> Schema;

  /// Builds the class status from the raw attributes. May resolve UUIDs
  /// through `doc`, but issues no other engine commands.
  fn transform_status(doc: &Document, status: Attributes) -> CboxResult<Self::Status>;

  fn status(&self, doc: &Document) -> CboxResult<Self::Status>
  where
    Self: Sized,
  {
    let attrs = doc.get_things_by_uuid(self.uuid(), "/status", &Self::status_fields(), &[])?;
    Self::transform_status(doc, attrs)
  }
}

#[derive(Debug)]
pub enum DocObj {
  Song(DocSong),
  Track(DocTrack),
  TrackClip(DocTrackClip),
  Pattern(DocPattern),
}

#[derive(Debug)]
pub enum Status {
  Song(SongStatus),
  Track(TrackStatus),
  TrackClip(ClipItem),
  Pattern(Attributes),
}

type DocFactoryFn = fn(String) -> DocObj;

static CLASS_MAP: Lazy<HashMap<&'static str, DocFactoryFn>> = Lazy::new(|| {
  let mut m: HashMap<&'static str, DocFactoryFn> = HashMap::new();
  m.insert(DocSong::CLASS_NAME, |uuid| DocObj::Song(DocSong::new(uuid)));
  m.insert(DocTrack::CLASS_NAME, |uuid| DocObj::Track(DocTrack::new(uuid)));
  m.insert(DocTrackClip::CLASS_NAME, |uuid| DocObj::TrackClip(DocTrackClip::new(uuid)));
  m.insert(DocPattern::CLASS_NAME, |uuid| DocObj::Pattern(DocPattern::new(uuid)));
  m
});

pub fn registered_classes() -> Vec<&'static str> {
  let mut names: Vec<_> = CLASS_MAP.keys().copied().collect();
  names.sort();
  names
}

impl DocObj {
  pub fn uuid(&self) -> &str {
    match self {
      DocObj::Song(o) => o.uuid(),
      DocObj::Track(o) => o.uuid(),
      DocObj::TrackClip(o) => o.uuid(),
      DocObj::Pattern(o) => o.uuid(),
    }
  }

  pub fn class_name(&self) -> &'static str {
    match self {
      DocObj::Song(_) => DocSong::CLASS_NAME,
      DocObj::Track(_) => DocTrack::CLASS_NAME,
      DocObj::TrackClip(_) => DocTrackClip::CLASS_NAME,
      DocObj::Pattern(_) => DocPattern::CLASS_NAME,
    }
  }

  pub fn status_fields(&self) -> Schema {
    match self {
      DocObj::Song(_) => DocSong::status_fields(),
      DocObj::Track(_) => DocTrack::status_fields(),
      DocObj::TrackClip(_) => DocTrackClip::status_fields(),
      DocObj::Pattern(_) => DocPattern::status_fields(),
    }
  }

  pub fn cmd(&self, doc: &Document, cmd: &str, args: &[Value], on_reply: Option<ReplyFn<'_>>) -> CboxResult<()> {
    doc.cmd_by_uuid(self.uuid(), cmd, args, on_reply)
  }

  pub fn cmd_makeobj(&self, doc: &Document, cmd: &str, args: &[Value]) -> CboxResult<Arc<DocObj>> {
    doc.makeobj_by_uuid(self.uuid(), cmd, args)
  }

  pub fn get_things(&self, doc: &Document, cmd: &str, schema: &Schema, args: &[Value]) -> CboxResult<Attributes> {
    doc.get_things_by_uuid(self.uuid(), cmd, schema, args)
  }

  pub fn status(&self, doc: &Document) -> CboxResult<Status> {
    Ok(match self {
      DocObj::Song(o) => Status::Song(o.status(doc)?),
      DocObj::Track(o) => Status::Track(o.status(doc)?),
      DocObj::TrackClip(o) => Status::TrackClip(o.status(doc)?),
      DocObj::Pattern(o) => Status::Pattern(o.status(doc)?),
    })
  }

  pub fn as_song(&self) -> Option<&DocSong> {
    match self { DocObj::Song(o) => Some(o), _ => None }
  }
  pub fn as_track(&self) -> Option<&DocTrack> {
    match self { DocObj::Track(o) => Some(o), _ => None }
  }
  pub fn as_track_clip(&self) -> Option<&DocTrackClip> {
    match self { DocObj::TrackClip(o) => Some(o), _ => None }
  }
  pub fn as_pattern(&self) -> Option<&DocPattern> {
    match self { DocObj::Pattern(o) => Some(o), _ => None }
  }
}

pub struct Document {
  channel: Arc<dyn CommandChannel>,
  prefix: String,
  unmatched: UnmatchedReplies,
  objects: Mutex<HashMap<String, Arc<DocObj>>>,
}

impl Document {
  pub fn new(channel: Arc<dyn CommandChannel>) -> Self {
    Self {
      channel,
      prefix: DEFAULT_UUID_PREFIX.to_string(),
      unmatched: UnmatchedReplies::Quiet,
      objects: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_settings(channel: Arc<dyn CommandChannel>, settings: &ClientSettings) -> Self {
    let unmatched = if settings.warn_unmatched_replies { UnmatchedReplies::Warn } else { UnmatchedReplies::Quiet };
    Self { prefix: settings.uuid_prefix.clone(), unmatched, ..Self::new(channel) }
  }

  pub fn channel(&self) -> &dyn CommandChannel { self.channel.as_ref() }

  pub fn uuid_cmd(&self, uuid: &str, cmd: &str) -> String {
    format!("{}/{}{}", self.prefix, uuid, cmd)
  }

  pub fn get_things(&self, path: &str, schema: &Schema, args: &[Value]) -> CboxResult<Attributes> {
    get_things_with(self.channel(), path, schema, args, self.unmatched)
  }

  pub fn get_things_by_uuid(&self, uuid: &str, cmd: &str, schema: &Schema, args: &[Value]) -> CboxResult<Attributes> {
    self.get_things(&self.uuid_cmd(uuid, cmd), schema, args)
  }

  pub fn cmd_by_uuid(&self, uuid: &str, cmd: &str, args: &[Value], on_reply: Option<ReplyFn<'_>>) -> CboxResult<()> {
    self.channel.send(&self.uuid_cmd(uuid, cmd), args, on_reply)
  }

  /// Runs an object-creating command. The engine must answer with exactly
  /// one `/uuid` reply carrying the new object's UUID.
  pub fn makeobj_by_uuid(&self, uuid: &str, cmd: &str, args: &[Value]) -> CboxResult<Arc<DocObj>> {
    let path = self.uuid_cmd(uuid, cmd);
    let mut created: Option<String> = None;
    let mut unexpected: Option<String> = None;
    self.channel.send(&path, args, Some(&mut |rpath: &str, rargs: &[Value]| {
      match (rpath, rargs, created.is_some()) {
        ("/uuid", [Value::Str(u)], false) => created = Some(u.clone()),
        _ => { unexpected.get_or_insert_with(|| rpath.to_string()); }
      }
    }))?;
    if let Some(rpath) = unexpected {
      return Err(CboxError::UnexpectedReply { command: path, path: rpath });
    }
    let created = created.ok_or_else(|| CboxError::MissingReply { command: path, field: "uuid".into() })?;
    self.map_uuid(&created)
  }

  pub fn dump(&self) -> CboxResult<()> {
    self.channel.fire("/doc/dump", &[])
  }

  pub fn get_uuid(&self, path: &str) -> CboxResult<String> {
    commands::get_uuid(self.channel(), path)
  }

  pub fn get_obj_class(&self, uuid: &str) -> CboxResult<String> {
    let path = self.uuid_cmd(uuid, "/get_class_name");
    let attrs = self.get_things(&path, &Schema::new().scalar("class_name"), &[])?;
    attrs
      .get_str("class_name")
      .map(str::to_string)
      .ok_or(CboxError::MissingReply { command: path, field: "class_name".into() })
  }

  pub fn get_song(&self) -> CboxResult<Arc<DocObj>> {
    let uuid = self.get_uuid("/song")?;
    self.map_uuid(&uuid)
  }

  /// Returns the proxy for `uuid`, creating it on first use.
  pub fn map_uuid(&self, uuid: &str) -> CboxResult<Arc<DocObj>> {
    // held across the class query so two callers can't both construct
    let mut objects = self.objects()?;
    if let Some(o) = objects.get(uuid) {
      return Ok(o.clone());
    }
    let class_name = self.get_obj_class(uuid)?;
    let ctor = CLASS_MAP.get(class_name.as_str()).ok_or_else(|| CboxError::UnknownClassKind {
      uuid: uuid.to_string(),
      class_name: class_name.clone(),
    })?;
    let o = Arc::new(ctor(uuid.to_string()));
    log::debug!("mapped {uuid} as {class_name}");
    objects.insert(uuid.to_string(), o.clone());
    Ok(o)
  }

  fn objects(&self) -> CboxResult<MutexGuard<'_, HashMap<String, Arc<DocObj>>>> {
    self.objects.lock().map_err(|_| CboxError::Poisoned("document"))
  }

  pub fn cached(&self, uuid: &str) -> CboxResult<Option<Arc<DocObj>>> {
    Ok(self.objects()?.get(uuid).cloned())
  }

  pub fn len(&self) -> CboxResult<usize> {
    Ok(self.objects()?.len())
  }

  pub fn is_empty(&self) -> CboxResult<bool> {
    Ok(self.objects()?.is_empty())
  }
}
