// Song identity and instrument parts (song.json)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InstrumentType {
    #[default]
    LeadGuitar,
    RhythmGuitar,
    BassGuitar,
    Drums,
    Keys,
    Vocals,
}

/// Semitone offset per string, low string first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StringTuning {
    pub string_semitone_offsets: Vec<i32>,
}

impl StringTuning {
    /// Standard tuning for an instrument with `strings` strings
    pub fn standard(strings: usize) -> Self {
        StringTuning {
            string_semitone_offsets: vec![0; strings],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongInstrumentPart {
    pub instrument_name: String,

    #[serde(default)]
    pub instrument_type: InstrumentType,

    /// Rating in [0, 5], one decimal
    #[serde(default)]
    pub song_difficulty: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<StringTuning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capo_fret: Option<i32>,

    /// Folder holding the audio, relative to the song directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_audio: Option<String>,

    /// Isolated stem for this part, if the source has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_stem: Option<String>,

    /// Structure file (beats + sections) this part is timed against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrangement_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongData {
    #[serde(default)]
    pub song_name: String,

    #[serde(default)]
    pub artist_name: String,

    #[serde(default)]
    pub album_name: String,

    #[serde(default)]
    pub song_year: i32,

    #[serde(default)]
    pub song_length_seconds: f32,

    #[serde(rename = "A440CentsOffset", default)]
    pub a440_cents_offset: f32,

    #[serde(default)]
    pub instrument_parts: Vec<SongInstrumentPart>,
}

impl SongData {
    /// Insert a part, replacing any existing part with the same name in place
    pub fn add_or_replace_part(&mut self, part: SongInstrumentPart) {
        match self
            .instrument_parts
            .iter_mut()
            .find(|existing| existing.instrument_name == part.instrument_name)
        {
            Some(existing) => *existing = part,
            None => self.instrument_parts.push(part),
        }
    }

    pub fn part(&self, name: &str) -> Option<&SongInstrumentPart> {
        self.instrument_parts
            .iter()
            .find(|part| part.instrument_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, difficulty: f32) -> SongInstrumentPart {
        SongInstrumentPart {
            instrument_name: name.to_string(),
            song_difficulty: difficulty,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_or_replace_keeps_insertion_order() {
        let mut song = SongData::default();
        song.add_or_replace_part(part("lead", 1.0));
        song.add_or_replace_part(part("bass", 2.0));
        song.add_or_replace_part(part("lead", 3.0));

        assert_eq!(song.instrument_parts.len(), 2);
        assert_eq!(song.instrument_parts[0].instrument_name, "lead");
        assert_eq!(song.instrument_parts[0].song_difficulty, 3.0);
        assert_eq!(song.part("bass").map(|p| p.song_difficulty), Some(2.0));
    }

    #[test]
    fn test_song_json_field_names() {
        let song = SongData {
            song_name: "Song".to_string(),
            a440_cents_offset: -12.0,
            ..Default::default()
        };

        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(json["SongName"], "Song");
        assert_eq!(json["A440CentsOffset"], -12.0);
    }

    #[test]
    fn test_song_json_tolerates_missing_fields() {
        let song: SongData = serde_json::from_str(r#"{"SongName":"Edited"}"#).unwrap();
        assert_eq!(song.song_name, "Edited");
        assert!(song.instrument_parts.is_empty());
    }
}
