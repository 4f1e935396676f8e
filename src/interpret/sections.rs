// Events track interpreter
// `[section NAME]` markers open sections; each one closes the section before it

use std::sync::LazyLock;

use regex::Regex;

use super::{PartialChart, TrackClock, TrackError, TrackInterpreter};
use crate::midi::MidiEventKind;
use crate::model::SongSection;

static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[section (\w+)\]").expect("valid section pattern"));

/// Section name of a `[section NAME]` marker, lowercased
pub fn section_marker(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    SECTION_MARKER
        .captures(&lower)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

#[derive(Default)]
pub struct SectionsInterpreter {
    sections: Vec<SongSection>,
}

impl SectionsInterpreter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackInterpreter for SectionsInterpreter {
    fn on_event(&mut self, event: &MidiEventKind, clock: &TrackClock) -> Result<(), TrackError> {
        let Some(name) = event.text().and_then(section_marker) else {
            return Ok(());
        };

        let time = clock.seconds();
        if let Some(previous) = self.sections.last_mut() {
            previous.end_time = time;
        }
        self.sections.push(SongSection::open(name, time));

        Ok(())
    }

    fn finish(mut self, clock: &TrackClock) -> PartialChart {
        if let Some(last) = self.sections.last_mut() {
            last.end_time = clock.seconds();
        }

        PartialChart::Sections(self.sections)
    }
}
