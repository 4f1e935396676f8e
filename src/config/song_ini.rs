// Rock Band song.ini metadata
// `key = value` lines; section headers are ignored and keys are case-insensitive

use std::path::Path;

use super::options::ConfigResult;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongIni {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub song_length_seconds: f32,
    pub diff_bass: f32,
    pub diff_drums: f32,
    pub diff_keys: f32,
    pub diff_vocals: f32,
}

fn difficulty(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().map(|d| d.clamp(0.0, 5.0))
}

impl SongIni {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        Ok(Self::parse(&std::fs::read_to_string(path)?))
    }

    pub fn parse(contents: &str) -> Self {
        let mut ini = SongIni::default();

        for line in contents.lines() {
            if line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "name" => ini.name = value.to_string(),
                "artist" => ini.artist = value.to_string(),
                "album" => ini.album = value.to_string(),
                "year" => {
                    if let Ok(year) = value.parse() {
                        ini.year = year;
                    }
                }
                "song_length" => {
                    if let Ok(millis) = value.parse::<u64>() {
                        ini.song_length_seconds = millis as f32 / 1000.0;
                    }
                }
                "diff_bass" => ini.diff_bass = difficulty(value).unwrap_or(ini.diff_bass),
                "diff_drums" => ini.diff_drums = difficulty(value).unwrap_or(ini.diff_drums),
                "diff_keys" => ini.diff_keys = difficulty(value).unwrap_or(ini.diff_keys),
                "diff_vocals" => ini.diff_vocals = difficulty(value).unwrap_or(ini.diff_vocals),
                _ => {}
            }
        }

        ini
    }
}
