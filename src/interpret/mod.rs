// Track Interpreters - Per-instrument reducers over one MIDI track
// Each recognised track role turns timed note/text events into normalized chart entities

pub mod bass;
pub mod beats;
pub mod drums;
pub mod keys;
pub mod sections;
pub mod vocals;

use thiserror::Error;

use crate::midi::{MidiEventKind, MidiTrack};
use crate::model::{
    micros_to_seconds, SongBeat, SongDrumNotes, SongInstrumentNotes, SongKeyboardNotes,
    SongSection, SongVocal,
};
use crate::timing::{TempoMap, DEFAULT_MICROS_PER_QUARTER};

pub use bass::BassInterpreter;
pub use beats::BeatsInterpreter;
pub use drums::{DrumInterpreter, DrumLaneState};
pub use keys::KeysInterpreter;
pub use sections::SectionsInterpreter;
pub use vocals::VocalsInterpreter;

/// Fatal errors for a single track. Other tracks keep going.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    #[error("track {track}: timed event before any tempo is established")]
    MissingTempoMap { track: usize },

    #[error("track {track}: note off for key {key} without a pending note on")]
    UnmatchedNoteOff { track: usize, key: u8 },

    #[error("track {track}: second note on for key {key} before its note off")]
    DuplicateNoteOn { track: usize, key: u8 },
}

/// What a track is used for, from its declared name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackRole {
    Drums,
    Beats,
    Vocals,
    Bass,
    Keys,
    Events,
    Inert,
}

impl TrackRole {
    /// Case-insensitive suffix match on the track name
    pub fn from_track_name(name: &str) -> Self {
        let lower = name.to_lowercase();

        if lower.ends_with("drums") {
            TrackRole::Drums
        } else if lower.ends_with("beat") {
            TrackRole::Beats
        } else if lower.ends_with("vocals") {
            TrackRole::Vocals
        } else if lower.ends_with("real_bass") {
            TrackRole::Bass
        } else if lower.ends_with("real_keys_x") {
            TrackRole::Keys
        } else if lower.ends_with("events") {
            TrackRole::Events
        } else {
            TrackRole::Inert
        }
    }

    pub fn of_track(track: &MidiTrack) -> Self {
        track.name().map_or(TrackRole::Inert, TrackRole::from_track_name)
    }
}

/// Normalized result of interpreting one track
#[derive(Debug, Clone, PartialEq)]
pub enum PartialChart {
    Drums(SongDrumNotes),
    Keys(SongKeyboardNotes),
    Bass(SongInstrumentNotes),
    Vocals(Vec<SongVocal>),
    Beats(Vec<SongBeat>),
    Sections(Vec<SongSection>),
    Inert,
}

/// Absolute position of the event being interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackClock {
    pub track: usize,
    pub micros: u64,
    pub micros_per_quarter: u32,
}

impl TrackClock {
    pub fn seconds(&self) -> f32 {
        micros_to_seconds(self.micros)
    }
}

/// A stateful reducer over one track's events
pub trait TrackInterpreter {
    fn on_event(&mut self, event: &MidiEventKind, clock: &TrackClock) -> Result<(), TrackError>;

    /// Called after the last event of a group of events sharing one tick
    fn end_group(&mut self, _clock: &TrackClock) {}

    /// Consume the interpreter once the track is exhausted. `clock` is the
    /// time of the last event.
    fn finish(self, clock: &TrackClock) -> PartialChart;
}

/// Interpret one track according to its declared name
pub fn interpret_track(
    track: &MidiTrack,
    index: usize,
    tempo: &TempoMap,
) -> Result<(TrackRole, PartialChart), TrackError> {
    let role = TrackRole::of_track(track);

    let chart = match role {
        TrackRole::Drums => run(DrumInterpreter::new(), track, index, tempo)?,
        TrackRole::Beats => run(BeatsInterpreter::new(), track, index, tempo)?,
        TrackRole::Vocals => run(VocalsInterpreter::new(), track, index, tempo)?,
        TrackRole::Bass => run(BassInterpreter::new(), track, index, tempo)?,
        TrackRole::Keys => run(KeysInterpreter::new(), track, index, tempo)?,
        TrackRole::Events => run(SectionsInterpreter::new(), track, index, tempo)?,
        TrackRole::Inert => PartialChart::Inert,
    };

    Ok((role, chart))
}

/// Walk a track, keeping absolute time with the tempo map and feeding the
/// interpreter event by event
pub fn run<I: TrackInterpreter>(
    mut interpreter: I,
    track: &MidiTrack,
    index: usize,
    tempo: &TempoMap,
) -> Result<PartialChart, TrackError> {
    // Without a tempo, text-only tracks still convert with every event at time 0
    let mut cursor = tempo.cursor();

    let mut clock = TrackClock {
        track: index,
        micros: 0,
        micros_per_quarter: cursor
            .as_ref()
            .map_or(DEFAULT_MICROS_PER_QUARTER, |cursor| cursor.micros_per_quarter()),
    };

    let events = &track.events;
    for (position, event) in events.iter().enumerate() {
        match cursor.as_mut() {
            Some(cursor) => {
                clock.micros = cursor.advance(u64::from(event.delta));
                clock.micros_per_quarter = cursor.micros_per_quarter();
            }
            None if event.kind.is_note() => {
                return Err(TrackError::MissingTempoMap { track: index });
            }
            None => {}
        }

        interpreter.on_event(&event.kind, &clock)?;

        let group_ends = events
            .get(position + 1)
            .map_or(true, |next| next.delta > 0);
        if group_ends {
            interpreter.end_group(&clock);
        }
    }

    Ok(interpreter.finish(&clock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiEvent;

    fn tempo_120(tpq: u32) -> TempoMap {
        let mut map = TempoMap::new(tpq).unwrap();
        map.push(0, 500_000);
        map
    }

    #[test]
    fn test_role_from_track_name() {
        assert_eq!(TrackRole::from_track_name("PART DRUMS"), TrackRole::Drums);
        assert_eq!(TrackRole::from_track_name("BEAT"), TrackRole::Beats);
        assert_eq!(TrackRole::from_track_name("PART VOCALS"), TrackRole::Vocals);
        assert_eq!(TrackRole::from_track_name("PART REAL_BASS"), TrackRole::Bass);
        assert_eq!(TrackRole::from_track_name("PART REAL_KEYS_X"), TrackRole::Keys);
        assert_eq!(TrackRole::from_track_name("EVENTS"), TrackRole::Events);
        assert_eq!(TrackRole::from_track_name("PART REAL_KEYS_H"), TrackRole::Inert);
        assert_eq!(TrackRole::from_track_name("PART GUITAR"), TrackRole::Inert);
    }

    #[test]
    fn test_unnamed_track_is_inert() {
        let track = MidiTrack::new(vec![MidiEvent::note_on(0, 60, 100)]);
        let empty = TempoMap::new(480).unwrap();
        let (role, chart) = interpret_track(&track, 3, &empty).unwrap();
        assert_eq!(role, TrackRole::Inert);
        assert_eq!(chart, PartialChart::Inert);
    }

    #[test]
    fn test_missing_tempo_map_is_fatal_for_track() {
        let track = MidiTrack::new(vec![
            MidiEvent::track_name("PART REAL_BASS"),
            MidiEvent::note_on(0, 96, 112),
        ]);
        let empty = TempoMap::new(480).unwrap();
        assert_eq!(
            interpret_track(&track, 2, &empty),
            Err(TrackError::MissingTempoMap { track: 2 })
        );
    }

    #[test]
    fn test_text_only_track_without_tempo() {
        let track = MidiTrack::new(vec![
            MidiEvent::track_name("EVENTS"),
            MidiEvent::text(480, "[music_start]"),
            MidiEvent::text(960, "[section intro]"),
        ]);
        let empty = TempoMap::new(480).unwrap();

        let (role, chart) = interpret_track(&track, 0, &empty).unwrap();
        assert_eq!(role, TrackRole::Events);
        assert_eq!(
            chart,
            PartialChart::Sections(vec![SongSection {
                name: "intro".to_string(),
                start_time: 0.0,
                end_time: 0.0,
            }])
        );
    }

    #[test]
    fn test_bass_end_to_end() {
        // 480 ticks at 120 tpq and 500000 us/quarter = 2 seconds
        let track = MidiTrack::new(vec![
            MidiEvent::track_name("PART REAL_BASS"),
            MidiEvent::note_on(0, 96, 112),
            MidiEvent::note_off(480, 96),
        ]);

        let (role, chart) = interpret_track(&track, 1, &tempo_120(120)).unwrap();
        assert_eq!(role, TrackRole::Bass);

        let PartialChart::Bass(notes) = chart else {
            panic!("Expected bass chart");
        };
        assert_eq!(notes.notes.len(), 1);

        let note = &notes.notes[0];
        assert_eq!(note.fret, 12);
        assert_eq!(note.string, 0);
        assert_eq!(note.time_offset, 0.0);
        assert_eq!(note.time_length, 2.0);
    }

    struct GroupCounter {
        groups: Vec<u64>,
    }

    impl TrackInterpreter for GroupCounter {
        fn on_event(&mut self, _: &MidiEventKind, _: &TrackClock) -> Result<(), TrackError> {
            Ok(())
        }

        fn end_group(&mut self, clock: &TrackClock) {
            self.groups.push(clock.micros);
        }

        fn finish(self, _: &TrackClock) -> PartialChart {
            PartialChart::Beats(
                self.groups
                    .iter()
                    .map(|&micros| SongBeat {
                        time_offset: micros_to_seconds(micros),
                        is_measure: false,
                    })
                    .collect(),
            )
        }
    }

    #[test]
    fn test_groups_close_on_nonzero_delta() {
        let track = MidiTrack::new(vec![
            MidiEvent::note_on(0, 96, 100),
            MidiEvent::note_on(0, 97, 100),
            MidiEvent::note_on(480, 96, 100),
            MidiEvent::note_off(480, 96),
            MidiEvent::note_off(0, 97),
        ]);

        let chart = run(GroupCounter { groups: Vec::new() }, &track, 0, &tempo_120(480)).unwrap();
        let PartialChart::Beats(beats) = chart else {
            panic!("Expected beats");
        };
        let times: Vec<f32> = beats.iter().map(|b| b.time_offset).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
    }
}
