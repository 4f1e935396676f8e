// Notation - Container arrangement conversion
// Decoded container records in, normalized parts, notes and vocals out

pub mod expand;
pub mod part;
pub mod records;

pub use expand::{bend_curve, expand_notes, slide_target, ExpandError};
pub use part::{convert_arrangement, difficulty_rating, instrument_type, ConvertedPart, PartContent};
pub use records::{
    ArrangementAttributes, ArrangementEntry, ArrangementPaths, BeatRecord, BendKeyframe,
    ChordNotesRecord, ChordRecord, ContainerDecoder, ContainerOpener, DecoderError,
    FingerprintRecord, LevelRecord, NotationAsset, NoteRecord, PhraseIterationRecord,
    PhraseRecord, SongEntry, VocalRecord,
};
