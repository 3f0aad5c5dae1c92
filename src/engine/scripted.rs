use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::channel::CommandTarget;
use super::messages::{Reply, Value};

type Handler = Box<dyn FnMut(&[Value]) -> Result<Vec<Reply>, String> + Send>;

#[derive(Clone, Default)]
pub struct Journal {
  entries: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

impl Journal {
  fn push(&self, path: &str, args: &[Value]) {
    if let Ok(mut v) = self.entries.lock() {
      v.push((path.to_string(), args.to_vec()));
    }
  }
  pub fn commands(&self) -> Vec<(String, Vec<Value>)> {
    self.entries.lock().map(|v| v.clone()).unwrap_or_default()
  }
  pub fn paths(&self) -> Vec<String> {
    self.commands().into_iter().map(|(p, _)| p).collect()
  }
  pub fn count(&self, path: &str) -> usize {
    self.commands().iter().filter(|(p, _)| p == path).count()
  }
}

/// A stand-in engine answering from a script: fixed reply lists, failures,
/// or closures over the command arguments. Unscripted paths succeed
/// silently.
#[derive(Default)]
pub struct ScriptedEngine {
  handlers: HashMap<String, Handler>,
  journal: Journal,
}

impl ScriptedEngine {
  pub fn new() -> Self { Self::default() }

  pub fn respond(self, path: &str, replies: Vec<Reply>) -> Self {
    self.handle(path, move |_| Ok(replies.clone()))
  }

  pub fn fail(self, path: &str, message: &str) -> Self {
    let message = message.to_string();
    self.handle(path, move |_| Err(message.clone()))
  }

  pub fn handle(mut self, path: &str, f: impl FnMut(&[Value]) -> Result<Vec<Reply>, String> + Send + 'static) -> Self {
    self.handlers.insert(path.to_string(), Box::new(f));
    self
  }

  pub fn journal(&self) -> Journal { self.journal.clone() }
}

impl CommandTarget for ScriptedEngine {
  fn process_cmd(&mut self, path: &str, args: &[Value], fb: &mut dyn FnMut(Reply)) -> Result<(), String> {
    self.journal.push(path, args);
    let Some(handler) = self.handlers.get_mut(path) else {
      log::debug!("unscripted command {path}");
      return Ok(());
    };
    for r in handler(args)? {
      fb(r);
    }
    Ok(())
  }
}
