use thiserror::Error;

/// Errors surfaced by the command channel, the reply aggregator, the
/// document registry and the pattern codec.
#[derive(Error, Debug)]
pub enum CboxError {
  /// The engine reported a class name with no registered proxy constructor
  #[error("Unknown class '{class_name}' for object {uuid}")]
  UnknownClassKind { uuid: String, class_name: String },

  /// Pattern blob does not split into whole event records
  #[error("Malformed event blob: {len} bytes, bad record at offset {offset}")]
  MalformedBlob { len: usize, offset: usize },

  /// Event payload must carry 1 to 3 bytes
  #[error("Invalid length of an event ({0})")]
  InvalidEventArity(usize),

  /// The engine rejected a command
  #[error("Command {path} failed: {message}")]
  CommandFailed { path: String, message: String },

  /// A reply arrived that the caller has no use for
  #[error("Unexpected reply {path} to {command}")]
  UnexpectedReply { command: String, path: String },

  /// A reply the caller depends on never arrived
  #[error("No '{field}' reply to {command}")]
  MissingReply { command: String, field: String },

  /// A status field did not have the shape its class expects
  #[error("Malformed status field '{field}': {detail}")]
  MalformedStatus { field: String, detail: String },

  /// A schema declared the same field twice, or an empty name
  #[error("Bad field declaration '{0}'")]
  DuplicateField(String),

  /// The engine thread is no longer receiving commands
  #[error("Engine is not running")]
  EngineGone,

  /// The engine thread could not be started
  #[error("Failed to spawn engine thread: {0}")]
  Spawn(#[from] std::io::Error),

  /// A lock was poisoned by a panicking holder
  #[error("{0} lock poisoned")]
  Poisoned(&'static str),
}

/// Result type for client operations
pub type CboxResult<T> = Result<T, CboxError>;
