// Beat track interpreter: notes 12 and 13 mark downbeats and beats

use super::{PartialChart, TrackClock, TrackError, TrackInterpreter};
use crate::midi::MidiEventKind;
use crate::model::SongBeat;

const MEASURE_KEY: u8 = 12;
const BEAT_KEY: u8 = 13;

#[derive(Default)]
pub struct BeatsInterpreter {
    beats: Vec<SongBeat>,
}

impl BeatsInterpreter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackInterpreter for BeatsInterpreter {
    fn on_event(&mut self, event: &MidiEventKind, clock: &TrackClock) -> Result<(), TrackError> {
        if let MidiEventKind::NoteOn { key, .. } = *event {
            if key == MEASURE_KEY || key == BEAT_KEY {
                self.beats.push(SongBeat {
                    time_offset: clock.seconds(),
                    is_measure: key == MEASURE_KEY,
                });
            }
        }

        Ok(())
    }

    fn finish(self, _clock: &TrackClock) -> PartialChart {
        PartialChart::Beats(self.beats)
    }
}
