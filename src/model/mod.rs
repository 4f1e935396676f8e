// Song Model - Normalized, instrument-agnostic chart data
// Everything the converters produce and the writer serializes

pub mod notes;
pub mod song;
pub mod structure;
pub mod technique;

pub use notes::{
    CentsOffset, DrumArticulation, DrumKitPiece, SongChord, SongDrumNote, SongDrumNotes,
    SongInstrumentNotes, SongKeyboardNote, SongKeyboardNotes, SongNote, SongVocal,
};
pub use song::{InstrumentType, SongData, SongInstrumentPart, StringTuning};
pub use structure::{SongBeat, SongSection, SongStructure};
pub use technique::{decode_note_mask, Technique, TechniqueSet};

/// Integer fields use -1 for "not set" and are left out of the JSON
pub(crate) fn unset() -> i32 {
    -1
}

pub(crate) fn is_unset(value: &i32) -> bool {
    *value == -1
}

/// Convert absolute microseconds to the seconds stored in the model
pub fn micros_to_seconds(micros: u64) -> f32 {
    (micros as f64 / 1_000_000.0) as f32
}
