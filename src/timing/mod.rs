// Timing - MIDI tick to wall-clock conversion
// One tempo map per source file, walked incrementally by every track

pub mod tempo;

pub use tempo::{TempoChange, TempoCursor, TempoError, TempoMap, DEFAULT_MICROS_PER_QUARTER};
