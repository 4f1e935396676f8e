// Rock Band song folder conversion
// song.ini + notes.mid + *.ogg -> one song package with drums, bass, keys and vocals

use std::fs;
use std::path::{Path, PathBuf};

use super::{ConvertError, ConvertResult};
use crate::config::SongIni;
use crate::interpret::{interpret_track, PartialChart, TrackRole};
use crate::lyrics::LineWrap;
use crate::midi::{read_midi_file, MidiSequence};
use crate::model::{InstrumentType, SongData, SongInstrumentPart, StringTuning};
use crate::output::{relative_path, AlbumArt, AudioCopy, NotationFile, SongPackage, SongWriter};

pub const SONG_INI_FILE: &str = "song.ini";
pub const NOTES_FILE: &str = "notes.mid";
pub const ALBUM_FILE: &str = "album.png";
/// Folder inside the song directory that receives copied stems
pub const AUDIO_DIR: &str = "rbaudio";
pub const ARRANGEMENT_NAME: &str = "rbarrangement";

/// Stems never copied: crowd noise and the preview clip
const EXCLUDED_AUDIO_PREFIXES: [&str; 2] = ["crowd", "preview"];

/// A converted song folder and where it goes
#[derive(Debug, Clone, PartialEq)]
pub struct RockBandSong {
    pub song_dir: PathBuf,
    pub package: SongPackage,
}

/// Part written for one instrument track role
struct PartTemplate {
    name: &'static str,
    instrument_type: InstrumentType,
    stem_pattern: &'static str,
}

fn part_template(role: TrackRole) -> Option<PartTemplate> {
    let (name, instrument_type, stem_pattern) = match role {
        TrackRole::Drums => ("drums", InstrumentType::Drums, "drums*.ogg"),
        TrackRole::Vocals => ("rbvocals", InstrumentType::Vocals, "vocals.ogg"),
        TrackRole::Bass => ("rbbass", InstrumentType::BassGuitar, "rhythm*.ogg"),
        TrackRole::Keys => ("keys", InstrumentType::Keys, "keys.ogg"),
        _ => return None,
    };

    Some(PartTemplate {
        name,
        instrument_type,
        stem_pattern,
    })
}

fn absolute(path: &Path) -> ConvertResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// File names in `dir` with the given extension, sorted
fn files_with_extension(dir: &Path, extension: &str) -> ConvertResult<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let matches = Path::new(&name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Case-insensitive match against a pattern with at most one '*'
fn matches_pattern(name: &str, pattern: &str) -> bool {
    let name = name.to_lowercase();

    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => name == pattern,
    }
}

/// `pattern` when a matching stem exists among `audio_files`
fn stem_for(audio_files: &[String], pattern: &str) -> Option<String> {
    audio_files
        .iter()
        .any(|name| matches_pattern(name, pattern))
        .then(|| pattern.to_string())
}

fn copied_audio(audio_files: &[String]) -> impl Iterator<Item = &String> {
    audio_files.iter().filter(|name| {
        let lower = name.to_lowercase();
        !EXCLUDED_AUDIO_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
    })
}

/// Convert one song folder in memory. Nothing is written.
pub fn convert_song(
    source: &Path,
    writer: &SongWriter,
    copy_audio: bool,
    wrap: &LineWrap,
) -> ConvertResult<RockBandSong> {
    let ini_path = source.join(SONG_INI_FILE);
    if !ini_path.is_file() {
        return Err(ConvertError::MissingSongIni(source.to_path_buf()));
    }
    let notes_path = source.join(NOTES_FILE);
    if !notes_path.is_file() {
        return Err(ConvertError::MissingNotes(source.to_path_buf()));
    }

    let ini = SongIni::load(&ini_path)?;
    let sequence = read_midi_file(&notes_path)?;

    let song_dir = writer.song_dir(&ini.artist, &ini.name);

    let audio_dir = if copy_audio {
        song_dir.join(AUDIO_DIR)
    } else {
        source.to_path_buf()
    };
    let relative_audio = relative_path(&absolute(&song_dir)?, &absolute(&audio_dir)?);

    let mut song = SongWriter::read_song_data(&song_dir).unwrap_or_else(|| SongData {
        song_name: ini.name.clone(),
        artist_name: ini.artist.clone(),
        album_name: ini.album.clone(),
        song_year: ini.year,
        ..Default::default()
    });
    if song.song_length_seconds == 0.0 {
        song.song_length_seconds = ini.song_length_seconds;
    }

    let audio_files = files_with_extension(source, "ogg")?;

    let mut package = SongPackage::new(song, ARRANGEMENT_NAME);
    let context = PartContext {
        ini: &ini,
        audio_files: &audio_files,
        song_audio: relative_audio.to_string_lossy().into_owned(),
        wrap,
    };
    assemble_tracks(&sequence, &context, &mut package)?;

    let album = source.join(ALBUM_FILE);
    if album.is_file() {
        package.album_art = Some(AlbumArt::CopyFrom(album));
    } else {
        log::debug!("No {} in {}", ALBUM_FILE, source.display());
    }

    if copy_audio {
        package.audio_copies = copied_audio(&audio_files)
            .map(|name| AudioCopy {
                source: source.join(name),
                dest: Path::new(AUDIO_DIR).join(name),
            })
            .collect();
    }

    Ok(RockBandSong { song_dir, package })
}

struct PartContext<'a> {
    ini: &'a SongIni,
    audio_files: &'a [String],
    song_audio: String,
    wrap: &'a LineWrap,
}

impl PartContext<'_> {
    fn part(&self, template: &PartTemplate) -> SongInstrumentPart {
        let song_difficulty = match template.instrument_type {
            InstrumentType::Drums => self.ini.diff_drums,
            InstrumentType::Vocals => self.ini.diff_vocals,
            InstrumentType::BassGuitar => self.ini.diff_bass,
            InstrumentType::Keys => self.ini.diff_keys,
            _ => 0.0,
        };

        let tuning = (template.instrument_type == InstrumentType::BassGuitar)
            .then(|| StringTuning::standard(4));

        SongInstrumentPart {
            instrument_name: template.name.to_string(),
            instrument_type: template.instrument_type,
            song_difficulty,
            tuning,
            song_audio: Some(self.song_audio.clone()),
            song_stem: stem_for(self.audio_files, template.stem_pattern),
            arrangement_name: Some(ARRANGEMENT_NAME.to_string()),
            ..Default::default()
        }
    }
}

/// Interpret every track and merge the results into the package. A track
/// that fails is logged and left out; the rest of the song still converts.
fn assemble_tracks(
    sequence: &MidiSequence,
    context: &PartContext<'_>,
    package: &mut SongPackage,
) -> ConvertResult<()> {
    let tempo = sequence.tempo_map()?;

    for (index, track) in sequence.tracks.iter().enumerate() {
        let (role, chart) = match interpret_track(track, index, &tempo) {
            Ok(result) => result,
            Err(e) => {
                log::warn!(
                    "Skipping track {:?}: {}",
                    track.name().unwrap_or("<unnamed>"),
                    e
                );
                continue;
            }
        };

        let file = match chart {
            PartialChart::Inert => continue,
            PartialChart::Beats(beats) => {
                package.structure.beats.extend(beats);
                continue;
            }
            PartialChart::Sections(sections) => {
                package.structure.sections.extend(sections);
                continue;
            }
            PartialChart::Vocals(vocals) if vocals.is_empty() => continue,
            PartialChart::Vocals(mut vocals) => {
                context.wrap.apply(&mut vocals);
                NotationFile::Vocals(vocals)
            }
            PartialChart::Drums(drums) => NotationFile::Drums(drums),
            PartialChart::Bass(bass) => NotationFile::Notes(bass),
            PartialChart::Keys(keys) => NotationFile::Keys(keys),
        };

        let Some(template) = part_template(role) else {
            continue;
        };

        log::debug!("Track {} -> {}", index, template.name);
        package.song.add_or_replace_part(context.part(&template));
        package.add_notation(template.name, file);
    }

    Ok(())
}
