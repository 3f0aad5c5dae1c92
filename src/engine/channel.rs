use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::messages::{EngineMsg, Reply, ReplyMsg, Value};
use crate::error::{CboxError, CboxResult};
use crate::settings::ClientSettings;

pub type ReplyFn<'a> = &'a mut dyn FnMut(&str, &[Value]);

/// The one primitive the engine exposes: run a command, optionally observing
/// the replies it produces.
///
/// With a handler, every reply for this command is delivered before `send`
/// returns. There are no persistent subscriptions, no timeouts and no
/// retries; an engine that emits nothing yields nothing. Issuing another
/// command from inside a reply handler is not supported.
pub trait CommandChannel: Send + Sync {
  fn send(&self, path: &str, args: &[Value], on_reply: Option<ReplyFn<'_>>) -> CboxResult<()>;

  fn fire(&self, path: &str, args: &[Value]) -> CboxResult<()> {
    self.send(path, args, None)
  }
}

/// Engine side of an in-process transport. `fb` receives each reply as it
/// is produced; an `Err` aborts the command with the given message.
pub trait CommandTarget: Send {
  fn process_cmd(&mut self, path: &str, args: &[Value], fb: &mut dyn FnMut(Reply)) -> Result<(), String>;
}

pub struct LocalChannel {
  target: Mutex<Box<dyn CommandTarget>>,
}

impl LocalChannel {
  pub fn new(target: impl CommandTarget + 'static) -> Self {
    Self { target: Mutex::new(Box::new(target)) }
  }
}

impl CommandChannel for LocalChannel {
  fn send(&self, path: &str, args: &[Value], on_reply: Option<ReplyFn<'_>>) -> CboxResult<()> {
    let mut replies = Vec::new();
    let result = {
      let mut target = self.target.lock().map_err(|_| CboxError::Poisoned("engine"))?;
      target.process_cmd(path, args, &mut |r| replies.push(r))
    };
    // target lock is released before handlers run
    if let Some(cb) = on_reply {
      for r in &replies {
        cb(&r.path, &r.args);
      }
    }
    result.map_err(|message| CboxError::CommandFailed { path: path.to_string(), message })
  }
}

/// Runs the target on a dedicated thread. Commands travel over a channel;
/// each command that wants replies carries its own reply channel, which the
/// caller drains until the engine marks the command done.
pub struct EngineChannel {
  tx: Sender<EngineMsg>,
  handle: Option<JoinHandle<()>>,
}

impl EngineChannel {
  pub fn spawn(target: impl CommandTarget + 'static) -> CboxResult<Self> {
    Self::spawn_with_settings(target, &ClientSettings::default())
  }

  pub fn spawn_with_settings(target: impl CommandTarget + 'static, settings: &ClientSettings) -> CboxResult<Self> {
    let (tx, rx) = unbounded();
    let target: Box<dyn CommandTarget> = Box::new(target);
    let handle = thread::Builder::new()
      .name(settings.engine_thread_name.clone())
      .spawn(move || run_engine(target, rx))?;
    Ok(Self { tx, handle: Some(handle) })
  }
}

fn run_engine(mut target: Box<dyn CommandTarget>, rx: Receiver<EngineMsg>) {
  log::info!("engine thread started");
  while let Ok(msg) = rx.recv() {
    match msg {
      EngineMsg::Command { path, args, reply } => {
        let result = match reply.as_ref() {
          Some(rtx) => target.process_cmd(&path, &args, &mut |r| { let _ = rtx.send(ReplyMsg::Reply(r)); }),
          None => target.process_cmd(&path, &args, &mut |_| {}),
        };
        match reply {
          Some(rtx) => { let _ = rtx.send(ReplyMsg::Done(result)); }
          None => {
            if let Err(e) = result { log::error!("{path}: {e}"); }
          }
        }
      }
      EngineMsg::Quit => break,
    }
  }
  log::info!("engine thread stopped");
}

impl CommandChannel for EngineChannel {
  fn send(&self, path: &str, args: &[Value], on_reply: Option<ReplyFn<'_>>) -> CboxResult<()> {
    let Some(cb) = on_reply else {
      return self.tx
        .send(EngineMsg::Command { path: path.to_string(), args: args.to_vec(), reply: None })
        .map_err(|_| CboxError::EngineGone);
    };
    let (rtx, rrx) = unbounded();
    self.tx
      .send(EngineMsg::Command { path: path.to_string(), args: args.to_vec(), reply: Some(rtx) })
      .map_err(|_| CboxError::EngineGone)?;
    loop {
      match rrx.recv() {
        Ok(ReplyMsg::Reply(r)) => cb(&r.path, &r.args),
        Ok(ReplyMsg::Done(result)) => {
          return result.map_err(|message| CboxError::CommandFailed { path: path.to_string(), message });
        }
        Err(_) => return Err(CboxError::EngineGone),
      }
    }
  }
}

impl Drop for EngineChannel {
  fn drop(&mut self) {
    let _ = self.tx.send(EngineMsg::Quit);
    if let Some(handle) = self.handle.take() {
      let _ = handle.join();
    }
  }
}
