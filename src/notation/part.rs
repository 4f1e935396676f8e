// Arrangement conversion
// One container arrangement -> instrument part, beat structure and notation content

use super::expand::{expand_notes, ExpandError};
use super::records::{ArrangementAttributes, ArrangementEntry, ChordRecord, NotationAsset};
use crate::lyrics::LineWrap;
use crate::model::{
    InstrumentType, SongBeat, SongChord, SongInstrumentNotes, SongInstrumentPart, SongSection,
    SongStructure, SongVocal, StringTuning,
};

/// Notation file content of a converted part
#[derive(Debug, Clone, PartialEq)]
pub enum PartContent {
    Notes(SongInstrumentNotes),
    Vocals(Vec<SongVocal>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedPart {
    pub part: SongInstrumentPart,
    pub structure: SongStructure,
    pub content: PartContent,
}

/// Arrangements without path properties are vocals
pub fn instrument_type(attributes: &ArrangementAttributes) -> InstrumentType {
    match attributes.properties {
        None => InstrumentType::Vocals,
        Some(paths) if paths.lead => InstrumentType::LeadGuitar,
        Some(paths) if paths.rhythm => InstrumentType::RhythmGuitar,
        Some(paths) if paths.bass => InstrumentType::BassGuitar,
        Some(_) => InstrumentType::default(),
    }
}

/// Scale a raw [0, 1] difficulty to [0, 5], truncated to one decimal
pub fn difficulty_rating(raw: f32) -> f32 {
    let scaled = (raw * 5.0).min(5.0);
    (scaled * 10.0).trunc() / 10.0
}

pub fn beat_structure(asset: &NotationAsset) -> SongStructure {
    SongStructure {
        beats: asset
            .beats
            .iter()
            .map(|beat| SongBeat {
                time_offset: beat.time,
                is_measure: beat.mask > 0,
            })
            .collect(),
        sections: Vec::new(),
    }
}

/// One section per phrase iteration, named after its phrase
pub fn phrase_sections(asset: &NotationAsset) -> Result<Vec<SongSection>, ExpandError> {
    asset
        .phrase_iterations
        .iter()
        .map(|iteration| {
            let phrase = asset
                .phrases
                .get(iteration.phrase_id)
                .ok_or(ExpandError::DanglingPhrase {
                    phrase_id: iteration.phrase_id,
                })?;

            Ok(SongSection {
                name: phrase.name.clone(),
                start_time: iteration.start_time,
                end_time: iteration.next_phrase_time,
            })
        })
        .collect()
}

fn song_chord(record: &ChordRecord) -> SongChord {
    SongChord {
        name: record.name.clone(),
        fingers: record.fingers.map(i32::from),
        frets: record.frets.map(i32::from),
    }
}

/// Container lyrics use '+' for a line break
fn container_vocals(asset: &NotationAsset, wrap: &LineWrap) -> Vec<SongVocal> {
    let mut vocals: Vec<SongVocal> = asset
        .vocals
        .iter()
        .map(|vocal| SongVocal::new(vocal.time, vocal.lyric.replace('+', "\n")))
        .collect();

    wrap.apply(&mut vocals);
    vocals
}

pub fn convert_arrangement(
    entry: &ArrangementEntry,
    asset: &NotationAsset,
    wrap: &LineWrap,
) -> Result<ConvertedPart, ExpandError> {
    let attributes = &entry.attributes;

    let mut part = SongInstrumentPart {
        instrument_name: entry.name.clone(),
        instrument_type: instrument_type(attributes),
        song_difficulty: difficulty_rating(attributes.song_difficulty),
        ..Default::default()
    };

    let structure = beat_structure(asset);
    let sections = phrase_sections(asset)?;

    if part.instrument_type == InstrumentType::Vocals {
        return Ok(ConvertedPart {
            part,
            structure,
            content: PartContent::Vocals(container_vocals(asset, wrap)),
        });
    }

    part.tuning = attributes.tuning.map(|offsets| StringTuning {
        string_semitone_offsets: offsets.to_vec(),
    });
    part.capo_fret = Some(attributes.capo_fret);

    let chords: Vec<SongChord> = asset.chords.iter().map(song_chord).collect();
    let notes = expand_notes(asset, &chords)?;

    Ok(ConvertedPart {
        part,
        structure,
        content: PartContent::Notes(SongInstrumentNotes {
            sections,
            chords,
            notes,
        }),
    })
}
