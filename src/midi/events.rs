// MIDI event records consumed by the track interpreters
// Owned, reader-independent view of a parsed Standard MIDI File

use crate::timing::{TempoError, TempoMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiEventKind {
    TrackName(String),
    /// Set-tempo meta event, microseconds per quarter note
    Tempo(u32),
    Text(String),
    Lyric(String),
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8, velocity: u8 },
    /// Anything else; kept so delta times still add up
    Other,
}

impl MidiEventKind {
    /// Text-like meta payload, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            MidiEventKind::Text(text) | MidiEventKind::Lyric(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, MidiEventKind::NoteOn { .. } | MidiEventKind::NoteOff { .. })
    }
}

/// An event with its delta time from the previous event in the track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    pub delta: u32,
    pub kind: MidiEventKind,
}

impl MidiEvent {
    pub fn new(delta: u32, kind: MidiEventKind) -> Self {
        MidiEvent { delta, kind }
    }

    pub fn track_name(name: impl Into<String>) -> Self {
        MidiEvent::new(0, MidiEventKind::TrackName(name.into()))
    }

    pub fn tempo(delta: u32, micros_per_quarter: u32) -> Self {
        MidiEvent::new(delta, MidiEventKind::Tempo(micros_per_quarter))
    }

    pub fn text(delta: u32, text: impl Into<String>) -> Self {
        MidiEvent::new(delta, MidiEventKind::Text(text.into()))
    }

    pub fn lyric(delta: u32, text: impl Into<String>) -> Self {
        MidiEvent::new(delta, MidiEventKind::Lyric(text.into()))
    }

    pub fn note_on(delta: u32, key: u8, velocity: u8) -> Self {
        MidiEvent::new(delta, MidiEventKind::NoteOn { key, velocity })
    }

    pub fn note_off(delta: u32, key: u8) -> Self {
        MidiEvent::new(delta, MidiEventKind::NoteOff { key, velocity: 0 })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiTrack {
    pub events: Vec<MidiEvent>,
}

impl MidiTrack {
    pub fn new(events: Vec<MidiEvent>) -> Self {
        MidiTrack { events }
    }

    /// Declared track name (first track-name meta event)
    pub fn name(&self) -> Option<&str> {
        self.events.iter().find_map(|event| match &event.kind {
            MidiEventKind::TrackName(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiSequence {
    pub ticks_per_quarter: u16,
    pub tracks: Vec<MidiTrack>,
}

impl MidiSequence {
    /// Collect every set-tempo event of the file at its absolute tick
    pub fn tempo_map(&self) -> Result<TempoMap, TempoError> {
        let mut map = TempoMap::new(u32::from(self.ticks_per_quarter))?;

        for track in &self.tracks {
            let mut tick = 0u64;
            for event in &track.events {
                tick += u64::from(event.delta);
                if let MidiEventKind::Tempo(micros_per_quarter) = event.kind {
                    map.push(tick, micros_per_quarter);
                }
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_name() {
        let track = MidiTrack::new(vec![
            MidiEvent::note_on(0, 60, 100),
            MidiEvent::track_name("PART DRUMS"),
        ]);
        assert_eq!(track.name(), Some("PART DRUMS"));
        assert_eq!(MidiTrack::default().name(), None);
    }

    #[test]
    fn test_tempo_map_uses_absolute_ticks() {
        let sequence = MidiSequence {
            ticks_per_quarter: 480,
            tracks: vec![
                MidiTrack::new(vec![
                    MidiEvent::tempo(0, 500_000),
                    MidiEvent::text(240, "marker"),
                    MidiEvent::tempo(240, 400_000),
                ]),
                MidiTrack::new(vec![MidiEvent::note_on(960, 60, 100)]),
            ],
        };

        let map = sequence.tempo_map().unwrap();
        let ticks: Vec<u64> = map.changes().iter().map(|c| c.tick).collect();
        assert_eq!(ticks, vec![0, 480]);
    }

    #[test]
    fn test_text_payload() {
        assert_eq!(MidiEventKind::Lyric("la".to_string()).text(), Some("la"));
        assert_eq!(MidiEventKind::Tempo(1).text(), None);
    }
}
