// Notation entities - notes, chords, vocals, drum and keyboard hits
// Serialized into one condensed JSON file per instrument part

use serde::{Deserialize, Serialize};

use super::structure::SongSection;
use super::technique::TechniqueSet;
use super::{is_unset, unset};

/// One pitch-bend keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CentsOffset {
    pub time_offset: f32,
    pub cents: i32,
}

/// A chord shape. Six strings, -1 means the string is not played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongChord {
    pub name: String,
    pub fingers: [i32; 6],
    pub frets: [i32; 6],
}

/// A fretted note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongNote {
    pub time_offset: f32,

    #[serde(default)]
    pub time_length: f32,

    #[serde(default)]
    pub fret: i32,

    #[serde(default)]
    pub string: i32,

    #[serde(default, skip_serializing_if = "TechniqueSet::is_empty")]
    pub techniques: TechniqueSet,

    /// Fret the hand is anchored at
    #[serde(default = "unset", skip_serializing_if = "is_unset")]
    pub hand_fret: i32,

    /// Slide target fret, -1 when the note does not slide
    #[serde(default = "unset", skip_serializing_if = "is_unset")]
    pub slide_fret: i32,

    /// Index into the part's chord list
    #[serde(rename = "ChordID", default, skip_serializing_if = "Option::is_none")]
    pub chord_id: Option<usize>,

    /// Chord shape the note belongs to when it differs from `chord_id`
    #[serde(rename = "FingerID", default, skip_serializing_if = "Option::is_none")]
    pub finger_id: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cents_offsets: Option<Vec<CentsOffset>>,
}

impl Default for SongNote {
    fn default() -> Self {
        SongNote {
            time_offset: 0.0,
            time_length: 0.0,
            fret: 0,
            string: 0,
            techniques: TechniqueSet::empty(),
            hand_fret: -1,
            slide_fret: -1,
            chord_id: None,
            finger_id: None,
            cents_offsets: None,
        }
    }
}

/// All notes, chords and phrase sections of one fretted part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongInstrumentNotes {
    #[serde(default)]
    pub sections: Vec<SongSection>,
    #[serde(default)]
    pub chords: Vec<SongChord>,
    #[serde(default)]
    pub notes: Vec<SongNote>,
}

impl SongInstrumentNotes {
    /// Check that every chord reference resolves within this part
    pub fn chord_refs_valid(&self) -> bool {
        let count = self.chords.len();
        self.notes.iter().all(|note| {
            note.chord_id.map_or(true, |id| id < count)
                && note.finger_id.map_or(true, |id| id < count)
        })
    }
}

/// A timed lyric fragment. A trailing '\n' marks a line break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongVocal {
    pub time_offset: f32,
    pub vocal: String,
}

impl SongVocal {
    pub fn new(time_offset: f32, vocal: impl Into<String>) -> Self {
        SongVocal {
            time_offset,
            vocal: vocal.into(),
        }
    }

    pub fn ends_line(&self) -> bool {
        self.vocal.ends_with('\n')
    }
}

/// Normalized drum kit pieces. Declaration order is used to break ties
/// when sorting simultaneous hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DrumKitPiece {
    Kick,
    Snare,
    HiHat,
    Tom1,
    Tom2,
    Tom3,
    Ride,
    Crash,
    Crash2,
}

impl DrumKitPiece {
    pub fn is_crash(&self) -> bool {
        matches!(self, DrumKitPiece::Crash | DrumKitPiece::Crash2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrumArticulation {
    HiHatOpen,
    CymbalChoke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongDrumNote {
    pub time_offset: f32,
    pub kit_piece: DrumKitPiece,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articulation: Option<DrumArticulation>,
}

impl SongDrumNote {
    pub fn new(time_offset: f32, kit_piece: DrumKitPiece) -> Self {
        SongDrumNote {
            time_offset,
            kit_piece,
            articulation: None,
        }
    }

    pub fn with_articulation(mut self, articulation: Option<DrumArticulation>) -> Self {
        self.articulation = articulation;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongDrumNotes {
    pub notes: Vec<SongDrumNote>,
}

impl SongDrumNotes {
    /// Stable sort by time; simultaneous hits go in descending kit-piece order
    pub fn sort(&mut self) {
        self.notes.sort_by(|a, b| {
            a.time_offset
                .total_cmp(&b.time_offset)
                .then_with(|| b.kit_piece.cmp(&a.kit_piece))
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongKeyboardNote {
    pub time_offset: f32,
    pub time_length: f32,
    pub note: u8,
    pub velocity: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongKeyboardNotes {
    pub notes: Vec<SongKeyboardNote>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Technique;

    #[test]
    fn test_drum_sort_breaks_ties_by_descending_piece() {
        let mut drums = SongDrumNotes {
            notes: vec![
                SongDrumNote::new(1.0, DrumKitPiece::Kick),
                SongDrumNote::new(0.5, DrumKitPiece::Snare),
                SongDrumNote::new(1.0, DrumKitPiece::Crash),
                SongDrumNote::new(1.0, DrumKitPiece::HiHat),
            ],
        };

        drums.sort();

        let pieces: Vec<DrumKitPiece> = drums.notes.iter().map(|n| n.kit_piece).collect();
        assert_eq!(
            pieces,
            vec![
                DrumKitPiece::Snare,
                DrumKitPiece::Crash,
                DrumKitPiece::HiHat,
                DrumKitPiece::Kick
            ]
        );
    }

    #[test]
    fn test_note_json_omits_unset_fields() {
        let note = SongNote {
            time_offset: 1.5,
            fret: 3,
            string: 2,
            ..Default::default()
        };

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["Fret"], 3);
        assert!(json.get("SlideFret").is_none());
        assert!(json.get("HandFret").is_none());
        assert!(json.get("ChordID").is_none());
        assert!(json.get("Techniques").is_none());

        let parsed: SongNote = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.slide_fret, -1);
        assert_eq!(parsed.hand_fret, -1);
    }

    #[test]
    fn test_note_json_keeps_techniques_and_chord() {
        let mut note = SongNote {
            chord_id: Some(4),
            ..Default::default()
        };
        note.techniques.insert(Technique::PalmMute);

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["ChordID"], 4);
        assert_eq!(json["Techniques"], "PalmMute");
    }

    #[test]
    fn test_chord_refs_valid() {
        let mut notes = SongInstrumentNotes {
            chords: vec![SongChord {
                name: "E5".to_string(),
                fingers: [1, 3, 4, -1, -1, -1],
                frets: [0, 2, 2, -1, -1, -1],
            }],
            ..Default::default()
        };
        notes.notes.push(SongNote {
            chord_id: Some(0),
            ..Default::default()
        });
        assert!(notes.chord_refs_valid());

        notes.notes.push(SongNote {
            finger_id: Some(1),
            ..Default::default()
        });
        assert!(!notes.chord_refs_valid());
    }

    #[test]
    fn test_vocal_line_break_marker() {
        assert!(SongVocal::new(0.0, "street\n").ends_line());
        assert!(!SongVocal::new(0.0, "street").ends_line());
    }
}
