use std::collections::HashMap;
use std::sync::Arc;

use cbox_client::engine::scripted::ScriptedEngine;
use cbox_client::pattern::{get_pattern, DrumPatternModel, Note, TimedEvent};
use cbox_client::{
  CboxError, CommandChannel, CommandTarget, Config, Document, EngineChannel, LocalChannel, Reply, Status, Value,
};

/// A tiny stand-in for the engine's song: one song, one track, patterns
/// created up front and clips created on demand.
struct FakeSong {
  classes: HashMap<String, &'static str>,
  patterns: Vec<(String, String, i32)>,
  clips: Vec<(i32, i32, i32, String, String)>,
  next_clip: usize,
}

impl FakeSong {
  fn new() -> Self {
    let mut classes = HashMap::new();
    classes.insert("song".to_string(), "cbox_song");
    classes.insert("trk".to_string(), "cbox_track");
    classes.insert("fx".to_string(), "cbox_reverb");
    let patterns = vec![("pat-a".to_string(), "intro".to_string(), 192), ("pat-b".to_string(), "fill".to_string(), 96)];
    for (uuid, _, _) in &patterns {
      classes.insert(uuid.clone(), "cbox_midi_pattern");
    }
    Self { classes, patterns, clips: Vec::new(), next_clip: 0 }
  }
}

impl CommandTarget for FakeSong {
  fn process_cmd(&mut self, path: &str, args: &[Value], fb: &mut dyn FnMut(Reply)) -> Result<(), String> {
    if path == "/song/get_uuid" {
      fb(Reply::new("/uuid", vec!["song".into()]));
      return Ok(());
    }
    let Some(rest) = path.strip_prefix("/doc/uuid/") else {
      return Err(format!("unknown command {path}"));
    };
    let (uuid, cmd) = rest.split_once('/').ok_or_else(|| format!("bad path {path}"))?;
    match cmd {
      "get_class_name" => {
        if let Some(class) = self.classes.get(uuid) {
          fb(Reply::new("/class_name", vec![(*class).into()]));
        }
      }
      "status" => match uuid {
        "song" => {
          fb(Reply::new("/track", vec!["drums".into(), (self.clips.len() as i32).into(), "trk".into()]));
          for (uuid, name, len) in &self.patterns {
            fb(Reply::new("/pattern", vec![name.as_str().into(), (*len).into(), uuid.as_str().into()]));
          }
        }
        "trk" => {
          fb(Reply::new("/name", vec!["drums".into()]));
          for (pos, offset, length, pattern, clip) in &self.clips {
            fb(Reply::new(
              "/clip",
              vec![(*pos).into(), (*offset).into(), (*length).into(), pattern.as_str().into(), clip.as_str().into()],
            ));
          }
        }
        _ => {
          let (_, name, len) = self.patterns.iter().find(|(u, _, _)| u == uuid).ok_or("no such object")?;
          fb(Reply::new("/event_count", vec![2.into()]));
          fb(Reply::new("/loop_end", vec![(*len).into()]));
          fb(Reply::new("/name", vec![name.as_str().into()]));
        }
      },
      "add_clip" => match args {
        [Value::Int(pos), Value::Int(offset), Value::Int(length), Value::Str(pattern)] => {
          self.next_clip += 1;
          let clip = format!("clip-{}", self.next_clip);
          self.classes.insert(clip.clone(), "cbox_track_item");
          self.clips.push((*pos, *offset, *length, pattern.clone(), clip.clone()));
          fb(Reply::new("/uuid", vec![clip.into()]));
        }
        _ => return Err("add_clip expects pos, offset, length, pattern".into()),
      },
      _ => {}
    }
    Ok(())
  }
}

fn exercise_document(doc: &Document) {
  let song = doc.get_song().unwrap();
  assert_eq!(song.class_name(), "cbox_song");
  assert!(Arc::ptr_eq(&song, &doc.get_song().unwrap()));

  let Status::Song(status) = song.status(doc).unwrap() else { panic!("song status expected") };
  assert_eq!(status.tracks.len(), 1);
  assert_eq!(status.tracks[0].name, "drums");
  assert_eq!(status.tracks[0].count, 0);
  let names: Vec<_> = status.patterns.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, vec!["intro", "fill"]);

  let track = status.tracks[0].track.clone();
  let pattern = status.patterns[1].pattern.clone();
  assert!(Arc::ptr_eq(&track, &doc.map_uuid("trk").unwrap()));

  let clip = track.as_track().unwrap().add_clip(doc, 96, 0, 96, &pattern).unwrap();
  assert_eq!(clip.class_name(), "cbox_track_item");

  let Status::Track(ts) = track.status(doc).unwrap() else { panic!("track status expected") };
  assert_eq!(ts.name.as_deref(), Some("drums"));
  assert_eq!(ts.clips.len(), 1);
  assert!(Arc::ptr_eq(&ts.clips[0].pattern, &pattern));
  assert!(Arc::ptr_eq(&ts.clips[0].clip, &clip));
  assert_eq!(ts.clips[0].to_string(), "pos=96 offset=0 length=96 pattern=pat-b clip=clip-1");

  let Status::TrackClip(item) = clip.status(doc).unwrap() else { panic!("clip status expected") };
  assert_eq!(item, ts.clips[0]);

  let Status::Pattern(attrs) = pattern.status(doc).unwrap() else { panic!("pattern status expected") };
  assert_eq!(attrs.get_str("name"), Some("fill"));
  assert_eq!(attrs.get_i32("loop_end"), Some(96));

  assert!(matches!(doc.map_uuid("fx"), Err(CboxError::UnknownClassKind { .. })));
  assert!(doc.cached("fx").unwrap().is_none());
}

#[test]
fn test_document_over_local_channel() {
  let doc = Document::new(Arc::new(LocalChannel::new(FakeSong::new())));
  exercise_document(&doc);
}

#[test]
fn test_document_over_engine_thread() {
  let channel = EngineChannel::spawn(FakeSong::new()).unwrap();
  let doc = Document::new(Arc::new(channel));
  exercise_document(&doc);
}

#[test]
fn test_concurrent_resolution_shares_one_proxy() {
  let doc = Arc::new(Document::new(Arc::new(EngineChannel::spawn(FakeSong::new()).unwrap())));
  let handles: Vec<_> = (0..4)
    .map(|_| {
      let doc = doc.clone();
      std::thread::spawn(move || doc.map_uuid("pat-a").unwrap())
    })
    .collect();
  let objs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
  assert!(objs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
  assert_eq!(doc.len().unwrap(), 1);
}

#[test]
fn test_command_failure_surfaces() {
  let engine = || ScriptedEngine::new().fail("/transport/play", "no audio device");
  for ch in [
    Arc::new(LocalChannel::new(engine())) as Arc<dyn CommandChannel>,
    Arc::new(EngineChannel::spawn(engine()).unwrap()),
  ] {
    let mut seen = 0;
    let res = ch.send("/transport/play", &[], Some(&mut |_: &str, _: &[Value]| seen += 1));
    assert!(matches!(res, Err(CboxError::CommandFailed { message, .. }) if message == "no audio device"));
    assert_eq!(seen, 0);
  }
}

#[test]
fn test_config_over_engine_thread() {
  let engine = ScriptedEngine::new().handle("/config/keys", |args| {
    assert_eq!(args, &[Value::from("io"), Value::from("")]);
    Ok(vec![Reply::new("/key", vec!["buffer".into()]), Reply::new("/key", vec!["outputs".into()])])
  });
  let journal = engine.journal();
  let config = Config::new(Arc::new(EngineChannel::spawn(engine).unwrap()));
  let io = config.section("io");
  assert_eq!(io.keys("").unwrap(), vec!["buffer".to_string(), "outputs".to_string()]);
  io.set("buffer", &Value::Float(2.5)).unwrap();
  // a round trip after the fire-and-forget set makes the journal current
  io.keys("").unwrap();
  assert!(journal
    .commands()
    .contains(&("/config/set".to_string(), vec!["io".into(), "buffer".into(), "2.5".into()])));
}

#[test]
fn test_pattern_round_trip_through_engine() {
  let mut model = DrumPatternModel::new(4, 1);
  model.add_note(Note { pos: 0, channel: 10, row: 36, vel: 100, len: 12 });
  model.add_note(Note { pos: 48, channel: 10, row: 38, vel: 90, len: 192 - 48 });
  let args = model.to_pattern_data().to_args();

  let engine = ScriptedEngine::new().respond("/get_pattern", vec![Reply::new("/pattern", args)]);
  let channel = EngineChannel::spawn(engine).unwrap();
  let data = get_pattern(&channel).unwrap().unwrap();
  assert_eq!(data.length, 192);
  assert_eq!(data.events[0], TimedEvent::new(0, 0x99, 36, 100));

  let back = DrumPatternModel::from_pattern_data(&data);
  assert_eq!(back.notes, model.notes);
  assert_eq!(back.bars(), 1);
}
