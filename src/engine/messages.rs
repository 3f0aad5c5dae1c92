use std::cmp::Ordering;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// One positional argument or reply value, as marshalled by the engine's
/// scripting bridge ('i', 'f', 's', 'b'; anything else arrives as `Nil`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
  Nil,
  Int(i32),
  Float(f64),
  Str(String),
  Blob(Vec<u8>),
}

impl Value {
  pub fn as_i32(&self) -> Option<i32> {
    match self { Value::Int(v) => Some(*v), _ => None }
  }
  pub fn as_f64(&self) -> Option<f64> {
    match self { Value::Float(v) => Some(*v), Value::Int(v) => Some(*v as f64), _ => None }
  }
  pub fn as_str(&self) -> Option<&str> {
    match self { Value::Str(v) => Some(v.as_str()), _ => None }
  }
  pub fn as_blob(&self) -> Option<&[u8]> {
    match self { Value::Blob(v) => Some(v.as_slice()), _ => None }
  }

  fn rank(&self) -> u8 {
    match self {
      Value::Nil => 0,
      Value::Int(_) => 1,
      Value::Float(_) => 2,
      Value::Str(_) => 3,
      Value::Blob(_) => 4,
    }
  }

  /// Text form used when the engine expects a string (config values).
  pub fn to_arg_string(&self) -> String {
    match self {
      Value::Nil => String::new(),
      Value::Int(v) => v.to_string(),
      Value::Float(v) => v.to_string(),
      Value::Str(v) => v.clone(),
      Value::Blob(v) => String::from_utf8_lossy(v).into_owned(),
    }
  }
}

// Floats compare with IEEE total ordering so values can key a BTreeMap.
impl Ord for Value {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Value::Nil, Value::Nil) => Ordering::Equal,
      (Value::Int(a), Value::Int(b)) => a.cmp(b),
      (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
      (Value::Str(a), Value::Str(b)) => a.cmp(b),
      (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
      _ => self.rank().cmp(&other.rank()),
    }
  }
}

impl PartialOrd for Value {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Value {}

impl From<i32> for Value {
  fn from(v: i32) -> Self { Value::Int(v) }
}
impl From<f64> for Value {
  fn from(v: f64) -> Self { Value::Float(v) }
}
impl From<&str> for Value {
  fn from(v: &str) -> Self { Value::Str(v.to_string()) }
}
impl From<String> for Value {
  fn from(v: String) -> Self { Value::Str(v) }
}
impl From<Vec<u8>> for Value {
  fn from(v: Vec<u8>) -> Self { Value::Blob(v) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reply {
  pub path: String,
  pub args: Vec<Value>,
}

impl Reply {
  pub fn new(path: impl Into<String>, args: Vec<Value>) -> Self {
    Self { path: path.into(), args }
  }
}

/// What the engine thread streams back for one command: any number of
/// replies, then exactly one `Done`.
#[derive(Clone, Debug)]
pub enum ReplyMsg {
  Reply(Reply),
  Done(Result<(), String>),
}

#[derive(Debug)]
pub enum EngineMsg {
  Command { path: String, args: Vec<Value>, reply: Option<Sender<ReplyMsg>> },
  Quit,
}
