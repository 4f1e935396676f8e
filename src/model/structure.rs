// Song Structure - Beat grid and named sections shared by all parts

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongBeat {
    pub time_offset: f32,
    /// First beat of a measure
    #[serde(default)]
    pub is_measure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongSection {
    pub name: String,
    pub start_time: f32,
    #[serde(default)]
    pub end_time: f32,
}

impl SongSection {
    /// A section whose end is not known yet
    pub fn open(name: impl Into<String>, start_time: f32) -> Self {
        SongSection {
            name: name.into(),
            start_time,
            end_time: start_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongStructure {
    #[serde(default)]
    pub beats: Vec<SongBeat>,
    #[serde(default)]
    pub sections: Vec<SongSection>,
}

impl SongStructure {
    /// Beats must never go backwards in time
    pub fn beats_ordered(&self) -> bool {
        self.beats
            .windows(2)
            .all(|pair| pair[0].time_offset <= pair[1].time_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats_ordered() {
        let mut structure = SongStructure::default();
        assert!(structure.beats_ordered());

        structure.beats.push(SongBeat { time_offset: 0.0, is_measure: true });
        structure.beats.push(SongBeat { time_offset: 0.5, is_measure: false });
        assert!(structure.beats_ordered());

        structure.beats.push(SongBeat { time_offset: 0.25, is_measure: false });
        assert!(!structure.beats_ordered());
    }

    #[test]
    fn test_open_section_starts_empty() {
        let section = SongSection::open("verse", 12.0);
        assert_eq!(section.start_time, 12.0);
        assert_eq!(section.end_time, 12.0);
    }
}
