// MIDI - Standard MIDI File input
// Parses notes.mid with midly into owned, per-track event lists

pub mod events;
pub mod reader;

pub use events::{MidiEvent, MidiEventKind, MidiSequence, MidiTrack};
pub use reader::{parse_midi, read_midi_file, MidiReadError};
