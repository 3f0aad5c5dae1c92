pub mod codec;
pub mod notes;

pub use codec::{decode_events, encode_event, encode_events, get_pattern, PatternData, TimedEvent};
pub use notes::{DrumPatternModel, Note, PPQN};
