// Note/chord expansion
// Turns per-level note records into normalized notes, splitting chords into
// per-string notes only when the strings carry something of their own

use thiserror::Error;

use super::records::{BendKeyframe, ChordNotesRecord, LevelRecord, NotationAsset, NoteRecord};
use crate::model::{decode_note_mask, CentsOffset, SongChord, SongNote, Technique};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpandError {
    #[error("fingerprint {index} missing from layer {layer}")]
    DanglingFingerprint { layer: usize, index: i32 },

    #[error("chord {chord_id} is not in the chord table")]
    DanglingChord { chord_id: i32 },

    #[error("chord notes {id} are not in the chord notes table")]
    DanglingChordNotes { id: i32 },

    #[error("phrase {phrase_id} is not in the phrase table")]
    DanglingPhrase { phrase_id: usize },
}

/// Table index from a signed record field, -1 (or any negative) meaning none
fn index(value: i32) -> Option<usize> {
    usize::try_from(value).ok()
}

/// Pitched slide target, falling back to the unpitched one
pub fn slide_target(pitched: i8, unpitched: i8) -> i32 {
    if pitched > 0 {
        i32::from(pitched)
    } else {
        i32::from(unpitched)
    }
}

/// Bend keyframes in cents. `None` for an empty curve.
pub fn bend_curve(keyframes: &[BendKeyframe]) -> Option<Vec<CentsOffset>> {
    if keyframes.is_empty() {
        return None;
    }

    Some(
        keyframes
            .iter()
            .map(|key| CentsOffset {
                time_offset: key.time,
                cents: (key.step * 100.0).trunc() as i32,
            })
            .collect(),
    )
}

/// Chord shape indicated by the note's fingerprints. The second layer wins
/// when both are set.
fn fingerprint_chord(
    level: &LevelRecord,
    note: &NoteRecord,
) -> Result<Option<usize>, ExpandError> {
    let mut chord = None;

    for (layer, &id) in note.fingerprint_ids.iter().enumerate() {
        let Some(at) = index(id) else {
            continue;
        };

        let fingerprint = level.fingerprints[layer]
            .get(at)
            .ok_or(ExpandError::DanglingFingerprint { layer, index: id })?;

        if let Some(chord_id) = index(fingerprint.chord_id) {
            chord = Some(chord_id);
        }
    }

    Ok(chord)
}

/// Expand every phrase iteration from the hardest level that has notes for it
pub fn expand_notes(
    asset: &NotationAsset,
    chords: &[SongChord],
) -> Result<Vec<SongNote>, ExpandError> {
    let mut levels: Vec<&LevelRecord> = asset.levels.iter().collect();
    levels.sort_by(|a, b| b.difficulty.cmp(&a.difficulty));

    let mut notes = Vec::new();

    for iteration in 0..asset.phrase_iterations.len() {
        for level in &levels {
            let mut phrase_notes = level
                .notes
                .iter()
                .filter(|note| note.phrase_iteration_id == iteration)
                .peekable();

            if phrase_notes.peek().is_none() {
                continue;
            }

            for note in phrase_notes {
                expand_note(note, level, asset, chords, &mut notes)?;
            }
            break;
        }
    }

    Ok(notes)
}

fn expand_note(
    record: &NoteRecord,
    level: &LevelRecord,
    asset: &NotationAsset,
    chords: &[SongChord],
    out: &mut Vec<SongNote>,
) -> Result<(), ExpandError> {
    let mut note = SongNote {
        time_offset: record.time,
        time_length: record.sustain,
        fret: i32::from(record.fret),
        string: i32::from(record.string),
        techniques: decode_note_mask(record.note_mask),
        hand_fret: i32::from(record.anchor_fret),
        slide_fret: slide_target(record.slide_to, record.slide_unpitch_to),
        chord_id: index(record.chord_id),
        finger_id: None,
        cents_offsets: bend_curve(&record.bends),
    };

    if let Some(shape) = fingerprint_chord(level, record)? {
        if note.chord_id != Some(shape) {
            note.finger_id = Some(shape);
        }
    }

    if let Some(id) = index(record.chord_notes_id) {
        let detail = asset
            .chord_notes
            .get(id)
            .ok_or(ExpandError::DanglingChordNotes {
                id: record.chord_notes_id,
            })?;
        let chord = note
            .chord_id
            .and_then(|chord_id| chords.get(chord_id))
            .ok_or(ExpandError::DanglingChord {
                chord_id: record.chord_id,
            })?;

        let strings = string_notes(&note, chord, detail);
        if !strings.is_empty() {
            if carries_string_detail(&strings) {
                out.extend(strings);
                note.techniques.insert(Technique::ChordNote);
                note.time_length = 0.0;
            } else {
                // Nothing string-specific: keep the shared techniques on the parent
                note.techniques =
                    (note.techniques | strings[0].techniques).without(Technique::ChordNote);
            }
        }
    }

    out.push(note);
    Ok(())
}

/// One note per played string of the chord, built on the parent note
fn string_notes(
    parent: &SongNote,
    chord: &SongChord,
    detail: &ChordNotesRecord,
) -> Vec<SongNote> {
    (0..6)
        .filter(|&string| chord.frets[string] != -1)
        .map(|string| SongNote {
            string: string as i32,
            fret: chord.frets[string],
            techniques: decode_note_mask(detail.note_masks[string]) | Technique::ChordNote,
            slide_fret: slide_target(detail.slide_to[string], detail.slide_unpitch_to[string]),
            cents_offsets: bend_curve(&detail.bends[string])
                .or_else(|| parent.cents_offsets.clone()),
            ..parent.clone()
        })
        .collect()
}

/// Whether any string differs from the first, slides or bends
fn carries_string_detail(strings: &[SongNote]) -> bool {
    let first = strings[0].techniques;

    strings.iter().any(|note| {
        note.techniques != first || note.slide_fret != -1 || note.cents_offsets.is_some()
    })
}
