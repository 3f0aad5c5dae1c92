use std::collections::HashMap;

use super::codec::{PatternData, TimedEvent, MAX_PAYLOAD};

/// Pulses per quarter note.
pub const PPQN: i32 = 48;
const DEFAULT_BEATS: i32 = 4;
/// Length given to a note cut off by a later note-on on the same row.
pub const SHADOWED_LEN: i32 = 1;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
  pub pos: i32,
  pub channel: u8,
  pub row: i8,
  pub vel: i8,
  pub len: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrumPatternModel {
  pub beats: i32,
  pub length: i32,
  pub notes: Vec<Note>,
}

impl DrumPatternModel {
  pub fn new(beats: i32, bars: i32) -> Self {
    Self { beats, length: beats * bars * PPQN, notes: Vec::new() }
  }

  /// Rebuilds notes from an event list. A note-off closes the most recently
  /// opened note on its row. A note-on over a still-open note on the same row
  /// leaves the earlier one at `SHADOWED_LEN`. Notes never closed run to the
  /// end of the pattern.
  pub fn import(events: &[TimedEvent], length: i32) -> Self {
    let mut notes: Vec<Note> = Vec::new();
    let mut closed: Vec<bool> = Vec::new();
    let mut active: HashMap<i8, usize> = HashMap::new();
    for ev in events.iter().filter(|ev| ev.arity() == MAX_PAYLOAD) {
      let (Some(row), Some(vel)) = (ev.data1(), ev.data2()) else { continue };
      let kind = ev.status() & 0xf0;
      let channel = (ev.status() & 0x0f) + 1;
      if kind == NOTE_ON && vel > 0 {
        notes.push(Note { pos: ev.time, channel, row, vel, len: 0 });
        closed.push(false);
        if let Some(prev) = active.insert(row, notes.len() - 1) {
          notes[prev].len = SHADOWED_LEN;
          closed[prev] = true;
        }
      } else if kind == NOTE_OFF || kind == NOTE_ON {
        if let Some(idx) = active.remove(&row) {
          notes[idx].len = ev.time.saturating_sub(notes[idx].pos);
          closed[idx] = true;
        }
      }
    }
    for (note, _) in notes.iter_mut().zip(&closed).filter(|(_, c)| !**c) {
      note.len = length.saturating_sub(note.pos);
    }
    if !notes.is_empty() {
      log::debug!("imported {} notes over {} pulses", notes.len(), length);
    }
    Self { beats: DEFAULT_BEATS, length, notes }
  }

  pub fn from_pattern_data(data: &PatternData) -> Self {
    Self::import(&data.events, data.length)
  }

  pub fn add_note(&mut self, note: Note) {
    self.notes.push(note);
  }

  /// Note-ons and note-offs in time order, offs first on ties.
  pub fn to_events(&self) -> Vec<TimedEvent> {
    let mut events = Vec::with_capacity(self.notes.len() * 2);
    for n in &self.notes {
      let ch = n.channel.saturating_sub(1) & 0x0f;
      events.push(TimedEvent::new(n.pos, NOTE_ON | ch, n.row, n.vel));
      events.push(TimedEvent::new(n.pos.saturating_add(n.len), NOTE_OFF | ch, n.row, 0));
    }
    events.sort_by_key(|ev| (ev.time, ev.status() & 0xf0 != NOTE_OFF));
    events
  }

  pub fn to_pattern_data(&self) -> PatternData {
    PatternData { events: self.to_events(), length: self.length }
  }

  pub fn beats(&self) -> i32 { self.beats }

  pub fn bars(&self) -> i32 {
    if self.beats <= 0 { 0 } else { self.length / (self.beats * PPQN) }
  }
}
