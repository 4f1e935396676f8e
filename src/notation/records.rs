// Container records - already-decoded song, arrangement and notation tables
// The container decoder produces these; everything downstream is format independent

use std::io::Write;
use std::path::Path;

/// Error type decoders report with. Conversion only logs and records it.
pub type DecoderError = Box<dyn std::error::Error + Send + Sync>;

/// One song listed in a container manifest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongEntry {
    /// Key used to look up the song's assets inside the container
    pub song_key: String,
    pub song_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub song_year: i32,
    pub song_length_seconds: f32,
    /// Arrangements in manifest order
    pub arrangements: Vec<ArrangementEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrangementEntry {
    pub name: String,
    pub attributes: ArrangementAttributes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrangementAttributes {
    pub cent_offset: f32,
    /// Raw difficulty, nominally in [0, 1]
    pub song_difficulty: f32,
    pub capo_fret: i32,
    pub tuning: Option<[i32; 6]>,
    /// Absent for vocal arrangements
    pub properties: Option<ArrangementPaths>,
}

/// Which path an instrument arrangement is charted for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrangementPaths {
    pub lead: bool,
    pub rhythm: bool,
    pub bass: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatRecord {
    pub time: f32,
    /// Non-zero on the first beat of a measure
    pub mask: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhraseRecord {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhraseIterationRecord {
    pub phrase_id: usize,
    pub start_time: f32,
    pub next_phrase_time: f32,
}

/// A chord template. -1 marks an unplayed string.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordRecord {
    pub name: String,
    pub fingers: [i8; 6],
    pub frets: [i8; 6],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendKeyframe {
    pub time: f32,
    /// Bend amount in semitones
    pub step: f32,
}

/// Per-string overrides for one chord occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct ChordNotesRecord {
    pub note_masks: [u32; 6],
    pub bends: [Vec<BendKeyframe>; 6],
    pub slide_to: [i8; 6],
    pub slide_unpitch_to: [i8; 6],
}

impl Default for ChordNotesRecord {
    fn default() -> Self {
        ChordNotesRecord {
            note_masks: [0; 6],
            bends: Default::default(),
            slide_to: [-1; 6],
            slide_unpitch_to: [-1; 6],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerprintRecord {
    pub chord_id: i32,
    pub start_time: f32,
    pub end_time: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    pub time: f32,
    pub sustain: f32,
    pub fret: i8,
    pub string: i8,
    pub note_mask: u32,
    pub anchor_fret: i8,
    pub slide_to: i8,
    pub slide_unpitch_to: i8,
    pub chord_id: i32,
    pub chord_notes_id: i32,
    /// Indexes into the two fingerprint layers of the level, -1 for none
    pub fingerprint_ids: [i32; 2],
    pub phrase_iteration_id: usize,
    pub bends: Vec<BendKeyframe>,
}

impl Default for NoteRecord {
    fn default() -> Self {
        NoteRecord {
            time: 0.0,
            sustain: 0.0,
            fret: 0,
            string: 0,
            note_mask: 0,
            anchor_fret: -1,
            slide_to: -1,
            slide_unpitch_to: -1,
            chord_id: -1,
            chord_notes_id: -1,
            fingerprint_ids: [-1, -1],
            phrase_iteration_id: 0,
            bends: Vec::new(),
        }
    }
}

/// The notes of one difficulty level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelRecord {
    pub difficulty: i32,
    pub notes: Vec<NoteRecord>,
    pub fingerprints: [Vec<FingerprintRecord>; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocalRecord {
    pub time: f32,
    pub lyric: String,
}

/// Decoded notation asset of one arrangement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotationAsset {
    pub beats: Vec<BeatRecord>,
    pub phrases: Vec<PhraseRecord>,
    pub phrase_iterations: Vec<PhraseIterationRecord>,
    pub chords: Vec<ChordRecord>,
    pub chord_notes: Vec<ChordNotesRecord>,
    pub levels: Vec<LevelRecord>,
    pub vocals: Vec<VocalRecord>,
}

/// Read access to one opened container file
pub trait ContainerDecoder {
    fn songs(&self) -> Result<Vec<SongEntry>, DecoderError>;

    /// `None` when the container has no asset for the arrangement
    fn notation(
        &self,
        song_key: &str,
        arrangement: &str,
    ) -> Result<Option<NotationAsset>, DecoderError>;

    /// Album art as PNG bytes, if the song has any
    fn album_art(&self, song_key: &str) -> Result<Option<Vec<u8>>, DecoderError>;

    /// Stream the song's audio as Ogg Vorbis. Returns false when the
    /// container has no audio bank for the song.
    fn write_audio(&self, song: &SongEntry, out: &mut dyn Write) -> Result<bool, DecoderError>;
}

/// Opens container files for conversion
pub trait ContainerOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn ContainerDecoder>, DecoderError>;
}
