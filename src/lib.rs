pub mod engine {
  pub mod messages;
  pub mod channel;
  pub mod scripted;
}
pub mod attributes;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod pattern;
pub mod schema;
pub mod settings;

pub use attributes::{get_things, get_things_with, Attr, Attributes, Payload, UnmatchedReplies};
pub use commands::{get_uuid, VarPath};
pub use config::{CfgSection, Config};
pub use document::{DocClass, DocObj, Document, Status};
pub use engine::channel::{CommandChannel, CommandTarget, EngineChannel, LocalChannel};
pub use engine::messages::{Reply, Value};
pub use error::{CboxError, CboxResult};
pub use schema::{Field, FieldKind, Schema};
pub use settings::ClientSettings;

/// Installs the process-wide logger. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging(level: log::LevelFilter) {
  let _ = env_logger::Builder::new()
    .filter_level(level)
    .format_timestamp_millis()
    .try_init();
}

pub fn init_logging_from(settings: &ClientSettings) {
  init_logging(settings.level_filter());
}
