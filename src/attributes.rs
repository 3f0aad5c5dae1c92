use std::collections::{BTreeMap, HashMap};
use std::slice;

use crate::engine::channel::CommandChannel;
use crate::engine::messages::{Reply, Value};
use crate::error::CboxResult;
use crate::schema::{FieldKind, Schema};

/// The value carried by one reply.
///
/// A reply with exactly one argument yields `One`, anything else (zero or
/// several arguments) yields `Tuple`. A field whose replies sometimes carry
/// one value and sometimes more therefore changes shape between calls; the
/// engine protocol relies on this, so it is kept as-is.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
  One(Value),
  Tuple(Vec<Value>),
}

impl Payload {
  pub fn from_args(args: &[Value]) -> Self {
    match args {
      [v] => Payload::One(v.clone()),
      _ => Payload::Tuple(args.to_vec()),
    }
  }

  pub fn value(&self) -> Option<&Value> {
    match self { Payload::One(v) => Some(v), Payload::Tuple(_) => None }
  }

  pub fn values(&self) -> &[Value] {
    match self { Payload::One(v) => slice::from_ref(v), Payload::Tuple(vs) => vs }
  }

  pub fn as_i32(&self) -> Option<i32> { self.value()?.as_i32() }
  pub fn as_str(&self) -> Option<&str> { self.value()?.as_str() }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Attr {
  Scalar(Option<Payload>),
  Sequence(Vec<Payload>),
  Mapping(BTreeMap<Value, Payload>),
}

impl Attr {
  fn empty(kind: FieldKind) -> Self {
    match kind {
      FieldKind::Scalar => Attr::Scalar(None),
      FieldKind::Sequence => Attr::Sequence(Vec::new()),
      FieldKind::Mapping => Attr::Mapping(BTreeMap::new()),
    }
  }
}

/// Reply path to schema name: the leading slash is dropped, the rest is
/// compared verbatim.
pub fn bare_name(path: &str) -> &str {
  path.strip_prefix('/').unwrap_or(path)
}

/// One member per declared field, plus every reply received in arrival
/// order whether or not it matched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
  fields: HashMap<String, Attr>,
  seq: Vec<Reply>,
}

impl Attributes {
  pub fn new(schema: &Schema) -> Self {
    let fields = schema.fields().iter().map(|f| (f.name.clone(), Attr::empty(f.kind))).collect();
    Self { fields, seq: Vec::new() }
  }

  pub fn fold(mut self, path: &str, args: &[Value]) -> Self {
    self.apply(path, args);
    self
  }

  /// Folds one reply in place; returns whether it targeted a declared field,
  /// even when a keyless mapping reply leaves that field unchanged.
  pub fn apply(&mut self, path: &str, args: &[Value]) -> bool {
    self.seq.push(Reply::new(path, args.to_vec()));
    let Some(attr) = self.fields.get_mut(bare_name(path)) else {
      return false;
    };
    match attr {
      Attr::Scalar(v) => *v = Some(Payload::from_args(args)),
      Attr::Sequence(vs) => vs.push(Payload::from_args(args)),
      Attr::Mapping(map) => {
        let Some((key, rest)) = args.split_first() else {
          log::debug!("mapping reply {path} has no key");
          return true;
        };
        map.insert(key.clone(), Payload::from_args(rest));
      }
    }
    true
  }

  pub fn get(&self, name: &str) -> Option<&Attr> { self.fields.get(name) }

  pub fn scalar(&self, name: &str) -> Option<&Payload> {
    match self.fields.get(name) { Some(Attr::Scalar(v)) => v.as_ref(), _ => None }
  }

  pub fn value(&self, name: &str) -> Option<&Value> { self.scalar(name)?.value() }

  pub fn get_i32(&self, name: &str) -> Option<i32> { self.value(name)?.as_i32() }

  pub fn get_str(&self, name: &str) -> Option<&str> { self.value(name)?.as_str() }

  pub fn sequence(&self, name: &str) -> &[Payload] {
    match self.fields.get(name) { Some(Attr::Sequence(vs)) => vs, _ => &[] }
  }

  pub fn mapping(&self, name: &str) -> Option<&BTreeMap<Value, Payload>> {
    match self.fields.get(name) { Some(Attr::Mapping(m)) => Some(m), _ => None }
  }

  pub fn replies(&self) -> &[Reply] { &self.seq }
}

/// What to do with replies whose name matches no declared field. They are
/// never an error, so that a newer engine can add status fields freely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnmatchedReplies {
  #[default]
  Quiet,
  Warn,
}

/// Sends `path` and blocks until all its replies are folded.
pub fn get_things(ch: &dyn CommandChannel, path: &str, schema: &Schema, args: &[Value]) -> CboxResult<Attributes> {
  get_things_with(ch, path, schema, args, UnmatchedReplies::Quiet)
}

pub fn get_things_with(
  ch: &dyn CommandChannel,
  path: &str,
  schema: &Schema,
  args: &[Value],
  unmatched: UnmatchedReplies,
) -> CboxResult<Attributes> {
  let mut bag = Attributes::new(schema);
  ch.send(path, args, Some(&mut |rpath: &str, rargs: &[Value]| {
    if !bag.apply(rpath, rargs) {
      match unmatched {
        UnmatchedReplies::Quiet => log::debug!("{path}: ignoring reply {rpath}"),
        UnmatchedReplies::Warn => log::warn!("{path}: reply {rpath} matches no field"),
      }
    }
  }))?;
  Ok(bag)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::channel::LocalChannel;
  use crate::engine::scripted::ScriptedEngine;

  fn run(schema: &Schema, replies: &[(&str, Vec<Value>)]) -> Attributes {
    replies.iter().fold(Attributes::new(schema), |bag, (p, a)| bag.fold(p, a))
  }

  #[test]
  fn test_empty_defaults() {
    let bag = run(&Schema::parse(&["name", "*clip", "%layer"]).unwrap(), &[]);
    assert_eq!(bag.get("name"), Some(&Attr::Scalar(None)));
    assert!(bag.sequence("clip").is_empty());
    assert!(bag.mapping("layer").unwrap().is_empty());
    assert!(bag.replies().is_empty());
  }

  #[test]
  fn test_scalar_last_write_wins() {
    let bag = run(&Schema::new().scalar("name"), &[("/name", vec!["a".into()]), ("/name", vec!["b".into()])]);
    assert_eq!(bag.get_str("name"), Some("b"));
  }

  #[test]
  fn test_scalar_degrades_to_tuple() {
    let bag = run(&Schema::new().scalar("pattern"), &[("/pattern", vec![Value::Blob(vec![1]), Value::Int(48)])]);
    assert_eq!(bag.value("pattern"), None);
    assert_eq!(bag.scalar("pattern"), Some(&Payload::Tuple(vec![Value::Blob(vec![1]), Value::Int(48)])));
  }

  #[test]
  fn test_sequence_appends() {
    let bag = run(&Schema::new().sequence("n"), &[("/n", vec![1.into()]), ("/n", vec![2.into()]), ("/n", vec![3.into()])]);
    let got: Vec<_> = bag.sequence("n").iter().filter_map(Payload::as_i32).collect();
    assert_eq!(got, vec![1, 2, 3]);
  }

  #[test]
  fn test_sequence_of_tuples() {
    let bag = run(&Schema::new().sequence("clip"), &[("/clip", vec![0.into(), 0.into(), 48.into()])]);
    assert_eq!(bag.sequence("clip")[0].values().len(), 3);
  }

  #[test]
  fn test_mapping_last_write_per_key() {
    let schema = Schema::new().mapping("m");
    let bag = run(&schema, &[
      ("/m", vec!["k1".into(), "v1".into()]),
      ("/m", vec!["k1".into(), "v2".into()]),
      ("/m", vec!["k2".into(), "v3".into()]),
    ]);
    let m = bag.mapping("m").unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m[&Value::from("k1")], Payload::One("v2".into()));
    assert_eq!(m[&Value::from("k2")], Payload::One("v3".into()));
  }

  #[test]
  fn test_mapping_value_shapes() {
    let bag = run(&Schema::new().mapping("gain"), &[
      ("/gain", vec![1.into(), 0.5.into(), 2.0.into()]),
      ("/gain", vec![2.into()]),
      ("/gain", vec![]),
    ]);
    let m = bag.mapping("gain").unwrap();
    assert_eq!(m[&Value::Int(1)], Payload::Tuple(vec![0.5.into(), 2.0.into()]));
    assert_eq!(m[&Value::Int(2)], Payload::Tuple(vec![]));
    assert_eq!(bag.replies().len(), 3);
  }

  #[test]
  fn test_keyless_mapping_reply_is_matched() {
    let mut bag = Attributes::new(&Schema::new().mapping("layer"));
    assert!(bag.apply("/layer", &[]));
    assert!(!bag.apply("/other", &[]));
    assert!(bag.mapping("layer").unwrap().is_empty());
    assert_eq!(bag.replies().len(), 2);
  }

  #[test]
  fn test_unmatched_only_logged() {
    let bag = run(&Schema::new().scalar("uuid"), &[("/uuid", vec!["u1".into()]), ("/extra", vec![1.into()]), ("uuid", vec!["u2".into()])]);
    assert_eq!(bag.get_str("uuid"), Some("u2"));
    assert!(bag.get("extra").is_none());
    assert_eq!(bag.replies().len(), 3);
    assert_eq!(bag.replies()[1].path, "/extra");
  }

  #[test]
  fn test_get_things_over_channel() {
    let engine = ScriptedEngine::new().respond("/scene/status", vec![
      Reply::new("/layer", vec![1.into(), "L1".into()]),
      Reply::new("/name", vec!["scene".into()]),
      Reply::new("/future_field", vec![]),
    ]);
    let ch = LocalChannel::new(engine);
    let schema = Schema::parse(&["%layer", "name"]).unwrap();
    let bag = get_things_with(&ch, "/scene/status", &schema, &[], UnmatchedReplies::Warn).unwrap();
    assert_eq!(bag.get_str("name"), Some("scene"));
    assert_eq!(bag.mapping("layer").unwrap()[&Value::Int(1)].as_str(), Some("L1"));
    assert_eq!(bag.replies().len(), 3);
  }
}
