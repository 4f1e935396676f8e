// Vocal track interpreter
// Lyric text events become timed fragments; phrase and pitch markers are dropped

use super::{PartialChart, TrackClock, TrackError, TrackInterpreter};
use crate::midi::MidiEventKind;
use crate::model::SongVocal;

/// Hold, talkie and pitch-slide markers charted after a syllable
const TRAILING_MARKERS: [char; 3] = ['#', '^', '='];

/// Clean up one lyric event. `None` for continuation markers and
/// bracketed directives.
pub fn lyric_fragment(text: &str) -> Option<&str> {
    if text == "+" || text.starts_with('[') {
        return None;
    }

    Some(text.strip_suffix(TRAILING_MARKERS).unwrap_or(text))
}

#[derive(Default)]
pub struct VocalsInterpreter {
    vocals: Vec<SongVocal>,
}

impl VocalsInterpreter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackInterpreter for VocalsInterpreter {
    fn on_event(&mut self, event: &MidiEventKind, clock: &TrackClock) -> Result<(), TrackError> {
        if let Some(fragment) = event.text().and_then(lyric_fragment) {
            self.vocals.push(SongVocal::new(clock.seconds(), fragment));
        }

        Ok(())
    }

    fn finish(self, _clock: &TrackClock) -> PartialChart {
        PartialChart::Vocals(self.vocals)
    }
}
