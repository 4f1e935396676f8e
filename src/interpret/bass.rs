// Pro bass track interpreter
// Fret comes from velocity, string from the Expert lane; markers carry hand position and slides

use super::{PartialChart, TrackClock, TrackError, TrackInterpreter};
use crate::midi::MidiEventKind;
use crate::model::{SongInstrumentNotes, SongNote};

/// Fret numbers are encoded as `velocity - FRET_VELOCITY_BASE`
const FRET_VELOCITY_BASE: i32 = 100;

const SLIDE_MARKER: u8 = 103;
const HAND_FRET_MARKER: u8 = 108;

/// Expert lanes for the E, A, D and G strings
fn string_for_key(key: u8) -> Option<usize> {
    match key {
        96..=99 => Some(usize::from(key - 96)),
        _ => None,
    }
}

/// A slide seen on the slide marker, waiting for the note it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSlide {
    pub target_fret: i32,
}

pub struct BassInterpreter {
    notes: Vec<SongNote>,
    /// Index into `notes` of the sounding note per string
    open: [Option<usize>; 4],
    hand_fret: i32,
    slide: Option<PendingSlide>,
}

impl BassInterpreter {
    pub fn new() -> Self {
        BassInterpreter {
            notes: Vec::new(),
            open: [None; 4],
            hand_fret: 0,
            slide: None,
        }
    }

    fn note_on(&mut self, key: u8, velocity: u8, clock: &TrackClock) {
        let fret = i32::from(velocity) - FRET_VELOCITY_BASE;

        match key {
            SLIDE_MARKER => {
                self.slide = Some(PendingSlide {
                    target_fret: fret.max(0),
                });
            }
            HAND_FRET_MARKER if fret >= 0 => self.hand_fret = fret,
            _ => {
                let Some(string) = string_for_key(key) else {
                    return;
                };

                if fret < 0 {
                    log::debug!(
                        "track {}: ignoring bass note {} with velocity {}",
                        clock.track,
                        key,
                        velocity
                    );
                    return;
                }

                self.open[string] = Some(self.notes.len());
                self.notes.push(SongNote {
                    time_offset: clock.seconds(),
                    fret,
                    string: string as i32,
                    hand_fret: self.hand_fret,
                    ..Default::default()
                });
            }
        }
    }

    fn note_off(&mut self, key: u8, clock: &TrackClock) {
        let Some(string) = string_for_key(key) else {
            return;
        };
        let Some(index) = self.open[string].take() else {
            return;
        };

        let note = &mut self.notes[index];
        note.time_length = clock.seconds() - note.time_offset;

        if let Some(slide) = self.slide.take() {
            // Slides are tracked but left off the note
            log::debug!(
                "track {}: slide to fret {} at {:.3}s not attached",
                clock.track,
                slide.target_fret,
                note.time_offset
            );
        }
    }
}

impl Default for BassInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackInterpreter for BassInterpreter {
    fn on_event(&mut self, event: &MidiEventKind, clock: &TrackClock) -> Result<(), TrackError> {
        match *event {
            MidiEventKind::NoteOn { key, velocity } => self.note_on(key, velocity, clock),
            MidiEventKind::NoteOff { key, .. } => self.note_off(key, clock),
            _ => {}
        }

        Ok(())
    }

    fn finish(self, _clock: &TrackClock) -> PartialChart {
        PartialChart::Bass(SongInstrumentNotes {
            notes: self.notes,
            ..Default::default()
        })
    }
}
