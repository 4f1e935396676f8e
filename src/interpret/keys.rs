// Pro keys track interpreter
// Pairs note on/off events by pitch into duration-bearing keyboard notes

use std::collections::HashMap;

use super::{PartialChart, TrackClock, TrackError, TrackInterpreter};
use crate::midi::MidiEventKind;
use crate::model::{micros_to_seconds, SongKeyboardNote, SongKeyboardNotes};

pub struct KeysInterpreter {
    /// Pitch -> start time of the pending note on
    held: HashMap<u8, u64>,
    notes: Vec<SongKeyboardNote>,
}

impl KeysInterpreter {
    pub fn new() -> Self {
        KeysInterpreter {
            held: HashMap::new(),
            notes: Vec::new(),
        }
    }
}

impl Default for KeysInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackInterpreter for KeysInterpreter {
    fn on_event(&mut self, event: &MidiEventKind, clock: &TrackClock) -> Result<(), TrackError> {
        match *event {
            MidiEventKind::NoteOn { key, .. } => {
                if self.held.contains_key(&key) {
                    return Err(TrackError::DuplicateNoteOn {
                        track: clock.track,
                        key,
                    });
                }

                self.held.insert(key, clock.micros);
            }
            MidiEventKind::NoteOff { key, velocity } => {
                let start_micros = self.held.remove(&key).ok_or(TrackError::UnmatchedNoteOff {
                    track: clock.track,
                    key,
                })?;

                // Key 0 carries no playable pitch. Velocity is the release velocity.
                if key > 0 {
                    self.notes.push(SongKeyboardNote {
                        time_offset: micros_to_seconds(start_micros),
                        time_length: micros_to_seconds(clock.micros - start_micros),
                        note: key,
                        velocity,
                    });
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn finish(self, _clock: &TrackClock) -> PartialChart {
        if !self.held.is_empty() {
            log::debug!("{} keys still held at end of track", self.held.len());
        }

        PartialChart::Keys(SongKeyboardNotes { notes: self.notes })
    }
}
