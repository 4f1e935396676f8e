// MIDI Import - Reads Standard MIDI Files using the midly crate
// Produces owned MidiSequence records for the track interpreters

use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use thiserror::Error;

use super::events::{MidiEvent, MidiEventKind, MidiSequence, MidiTrack};

#[derive(Debug, Error)]
pub enum MidiReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid MIDI file: {0}")]
    Parse(#[from] midly::Error),

    #[error("SMPTE timecode timing is not supported")]
    TimecodeTiming,
}

/// Read and parse a MIDI file from disk
pub fn read_midi_file(path: &Path) -> Result<MidiSequence, MidiReadError> {
    let bytes = std::fs::read(path)?;
    parse_midi(&bytes)
}

/// Parse MIDI file bytes
pub fn parse_midi(bytes: &[u8]) -> Result<MidiSequence, MidiReadError> {
    let smf = Smf::parse(bytes)?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(..) => return Err(MidiReadError::TimecodeTiming),
    };

    let tracks = smf
        .tracks
        .iter()
        .map(|track| MidiTrack::new(track.iter().map(convert_event).collect()))
        .collect();

    Ok(MidiSequence {
        ticks_per_quarter,
        tracks,
    })
}

fn convert_event(event: &TrackEvent<'_>) -> MidiEvent {
    let kind = match event.kind {
        TrackEventKind::Midi { message, .. } => match message {
            // Note-on with zero velocity is a note-off
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => MidiEventKind::NoteOff {
                key: key.as_int(),
                velocity: 0,
            },
            MidiMessage::NoteOn { key, vel } => MidiEventKind::NoteOn {
                key: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => MidiEventKind::NoteOff {
                key: key.as_int(),
                velocity: vel.as_int(),
            },
            _ => MidiEventKind::Other,
        },
        TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
            MidiEventKind::TrackName(decode_text(name))
        }
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => MidiEventKind::Tempo(tempo.as_int()),
        TrackEventKind::Meta(MetaMessage::Text(text)) => MidiEventKind::Text(decode_text(text)),
        TrackEventKind::Meta(MetaMessage::Lyric(text)) => MidiEventKind::Lyric(decode_text(text)),
        _ => MidiEventKind::Other,
    };

    MidiEvent::new(event.delta.as_int(), kind)
}

fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
