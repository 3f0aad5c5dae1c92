use crate::attributes::get_things;
use crate::engine::channel::CommandChannel;
use crate::engine::messages::Value;
use crate::error::{CboxError, CboxResult};
use crate::schema::Schema;

/// UUID of the object behind a global facility path such as `/scene` or
/// `/song`.
pub fn get_uuid(ch: &dyn CommandChannel, path: &str) -> CboxResult<String> {
  let command = format!("{path}/get_uuid");
  let attrs = get_things(ch, &command, &Schema::new().scalar("uuid"), &[])?;
  match attrs.get_str("uuid") {
    Some(uuid) => Ok(uuid.to_string()),
    None => Err(CboxError::MissingReply { command, field: "uuid".into() }),
  }
}

/// A command path plus leading arguments, extended piece by piece and then
/// sent with the final values appended. Useful for addressing per-item
/// parameters, e.g. `/instr/kit/engine` + `set_param` + layer index.
#[derive(Clone, Debug, PartialEq)]
pub struct VarPath {
  pub path: String,
  pub args: Vec<Value>,
}

impl VarPath {
  pub fn new(path: &str) -> Self {
    Self { path: path.to_string(), args: Vec::new() }
  }

  pub fn with_args(path: &str, args: Vec<Value>) -> Self {
    Self { path: path.to_string(), args }
  }

  pub fn plus(&self, subpath: Option<&str>, args: &[Value]) -> Self {
    let path = match subpath {
      Some(sub) => format!("{}/{}", self.path, sub),
      None => self.path.clone(),
    };
    let mut all = self.args.clone();
    all.extend_from_slice(args);
    Self { path, args: all }
  }

  pub fn set(&self, ch: &dyn CommandChannel, values: &[Value]) -> CboxResult<()> {
    let mut all = self.args.clone();
    all.extend_from_slice(values);
    ch.fire(&self.path, &all)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::channel::LocalChannel;
  use crate::engine::messages::Reply;
  use crate::engine::scripted::ScriptedEngine;

  #[test]
  fn test_var_path_accumulates() {
    let base = VarPath::new("/instr/kit/engine");
    let layer = base.plus(Some("layer"), &[2.into()]).plus(None, &["gain".into()]);
    assert_eq!(layer.path, "/instr/kit/engine/layer");
    assert_eq!(layer.args, vec![Value::Int(2), Value::from("gain")]);
    assert!(base.args.is_empty());

    let engine = ScriptedEngine::new();
    let journal = engine.journal();
    layer.set(&LocalChannel::new(engine), &[0.5.into()]).unwrap();
    assert_eq!(journal.commands(), vec![(
      "/instr/kit/engine/layer".to_string(),
      vec![Value::Int(2), Value::from("gain"), Value::Float(0.5)],
    )]);
  }

  #[test]
  fn test_get_uuid() {
    let ch = LocalChannel::new(ScriptedEngine::new()
      .respond("/scene/get_uuid", vec![Reply::new("/uuid", vec!["s-1".into()])]));
    assert_eq!(get_uuid(&ch, "/scene").unwrap(), "s-1");
    assert!(matches!(get_uuid(&ch, "/rt"), Err(CboxError::MissingReply { command, .. }) if command == "/rt/get_uuid"));
  }
}
