// Container song conversion
// Decoded container records -> one song package per manifest entry, plus song.ogg

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::ConvertResult;
use crate::lyrics::LineWrap;
use crate::model::SongData;
use crate::notation::{convert_arrangement, ContainerDecoder, PartContent, SongEntry};
use crate::output::{AlbumArt, NotationFile, SongPackage};

/// Container whose songs keep their audio in a sibling archive
pub const COMPANION_ARCHIVE_FILE: &str = "rs1compatibilitydlc_p.psarc";
pub const COMPANION_AUDIO_FILE: &str = "songs.psarc";
pub const SONG_AUDIO_FILE: &str = "song.ogg";
pub const ARRANGEMENT_NAME: &str = "arrangement";

/// Archive holding the audio for songs of `container`, when it is not the
/// container itself
pub fn companion_audio_path(container: &Path) -> Option<PathBuf> {
    let name = container.file_name()?.to_str()?;
    if !name.eq_ignore_ascii_case(COMPANION_ARCHIVE_FILE) {
        return None;
    }

    let parent = container.parent().unwrap_or_else(|| Path::new(""));
    Some(parent.join("..").join(COMPANION_AUDIO_FILE))
}

/// First non-zero cent offset across the song's arrangements
pub fn reference_pitch(entry: &SongEntry) -> f32 {
    entry
        .arrangements
        .iter()
        .map(|arrangement| arrangement.attributes.cent_offset)
        .find(|offset| *offset != 0.0)
        .unwrap_or(0.0)
}

/// Song metadata freshly read from the manifest
pub fn song_data(entry: &SongEntry) -> SongData {
    SongData {
        song_name: entry.song_name.clone(),
        artist_name: entry.artist_name.clone(),
        album_name: entry.album_name.clone(),
        song_year: entry.song_year,
        song_length_seconds: entry.song_length_seconds,
        a440_cents_offset: reference_pitch(entry),
        instrument_parts: Vec::new(),
    }
}

/// Keep edited metadata from an earlier run. Fields the earlier run left at
/// zero take the fresh values.
pub fn merge_song_data(existing: Option<SongData>, fresh: SongData) -> SongData {
    let Some(mut song) = existing else {
        return fresh;
    };

    if song.a440_cents_offset == 0.0 {
        song.a440_cents_offset = fresh.a440_cents_offset;
    }
    if song.song_length_seconds == 0.0 {
        song.song_length_seconds = fresh.song_length_seconds;
    }

    song
}

/// Convert every arrangement of one song in memory. Arrangements without a
/// notation asset are skipped.
pub fn convert_song(
    decoder: &dyn ContainerDecoder,
    entry: &SongEntry,
    song: SongData,
    wrap: &LineWrap,
) -> ConvertResult<SongPackage> {
    let mut package = SongPackage::new(song, ARRANGEMENT_NAME);

    for arrangement in &entry.arrangements {
        let Some(asset) = decoder.notation(&entry.song_key, &arrangement.name)? else {
            log::debug!(
                "{}: no notation for arrangement {}",
                entry.song_key,
                arrangement.name
            );
            continue;
        };

        let converted = convert_arrangement(arrangement, &asset, wrap)?;

        if converted.structure.beats.len() > package.structure.beats.len() {
            package.structure = converted.structure;
        }

        let file = match converted.content {
            PartContent::Notes(notes) => NotationFile::Notes(notes),
            PartContent::Vocals(vocals) => NotationFile::Vocals(vocals),
        };

        package.song.add_or_replace_part(converted.part);
        package.add_notation(arrangement.name.as_str(), file);
    }

    match decoder.album_art(&entry.song_key) {
        Ok(Some(png)) => package.album_art = Some(AlbumArt::Png(png)),
        Ok(None) => {}
        Err(e) => log::warn!("{}: failed to read album art: {}", entry.song_key, e),
    }

    Ok(package)
}

/// Write `song.ogg` into `song_dir`. An existing file is kept unless
/// `overwrite` is set. Returns whether audio was written.
pub fn write_song_audio(
    decoder: &dyn ContainerDecoder,
    entry: &SongEntry,
    song_dir: &Path,
    overwrite: bool,
) -> ConvertResult<bool> {
    let path = song_dir.join(SONG_AUDIO_FILE);
    if !overwrite && path.exists() {
        return Ok(false);
    }

    fs::create_dir_all(song_dir)?;
    let mut out = BufWriter::new(fs::File::create(&path)?);

    let written = match decoder.write_audio(entry, &mut out) {
        Ok(written) => written,
        Err(e) => {
            drop(out);
            if let Err(cleanup) = fs::remove_file(&path) {
                log::warn!("Could not remove partial {}: {}", path.display(), cleanup);
            }
            return Err(e.into());
        }
    };

    if written {
        out.flush()?;
    } else {
        drop(out);
        fs::remove_file(&path)?;
        log::debug!("{}: no audio bank", entry.song_key);
    }

    Ok(written)
}


#[cfg(test)]
mod tests {
    use super::fake::FakeContainer;
    use super::*;
    use crate::convert::ConvertError;
    use crate::model::InstrumentType;
    use crate::notation::{
        ArrangementAttributes, ArrangementEntry, ArrangementPaths, BeatRecord, NotationAsset,
        VocalRecord,
    };
    use tempfile::TempDir;

    fn arrangement(
        name: &str,
        cent_offset: f32,
        paths: Option<ArrangementPaths>,
    ) -> ArrangementEntry {
        ArrangementEntry {
            name: name.to_string(),
            attributes: ArrangementAttributes {
                cent_offset,
                song_difficulty: 0.5,
                properties: paths,
                ..Default::default()
            },
        }
    }

    fn entry() -> SongEntry {
        SongEntry {
            song_key: "testsong".to_string(),
            song_name: "Test Song".to_string(),
            artist_name: "Test Band".to_string(),
            song_year: 1999,
            song_length_seconds: 200.0,
            arrangements: vec![
                arrangement("vocals", 0.0, None),
                arrangement(
                    "lead",
                    -12.5,
                    Some(ArrangementPaths {
                        lead: true,
                        ..Default::default()
                    }),
                ),
                arrangement("bonus", 0.0, Some(ArrangementPaths::default())),
            ],
            ..Default::default()
        }
    }

    fn beats(count: usize) -> NotationAsset {
        NotationAsset {
            beats: (0..count)
                .map(|i| BeatRecord {
                    time: i as f32 * 0.5,
                    mask: u32::from(i % 4 == 0),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn container() -> FakeContainer {
        let vocals = NotationAsset {
            vocals: vec![VocalRecord {
                time: 1.0,
                lyric: "La".to_string(),
            }],
            ..beats(2)
        };

        FakeContainer {
            songs: vec![entry()],
            album_art: Some(vec![0x89, b'P', b'N', b'G']),
            ..Default::default()
        }
        .with_asset("testsong", "vocals", vocals)
        .with_asset("testsong", "lead", beats(8))
    }

    #[test]
    fn test_companion_audio_path() {
        assert_eq!(
            companion_audio_path(Path::new("/games/dlc/rs1compatibilitydlc_p.psarc")),
            Some(PathBuf::from("/games/dlc/../songs.psarc"))
        );
        assert_eq!(companion_audio_path(Path::new("/games/dlc/song_p.psarc")), None);
    }

    #[test]
    fn test_song_data_takes_first_nonzero_cent_offset() {
        let song = song_data(&entry());
        assert_eq!(song.song_name, "Test Song");
        assert_eq!(song.song_year, 1999);
        assert_eq!(song.a440_cents_offset, -12.5);
    }

    #[test]
    fn test_merge_keeps_edits_and_fills_zero_offset() {
        let existing = SongData {
            song_name: "Edited".to_string(),
            a440_cents_offset: 0.0,
            song_length_seconds: 180.0,
            ..Default::default()
        };

        let merged = merge_song_data(Some(existing), song_data(&entry()));
        assert_eq!(merged.song_name, "Edited");
        assert_eq!(merged.a440_cents_offset, -12.5);
        assert_eq!(merged.song_length_seconds, 180.0);

        let fresh = merge_song_data(None, song_data(&entry()));
        assert_eq!(fresh.song_name, "Test Song");
    }

    #[test]
    fn test_convert_song_parts_and_structure() {
        let decoder = container();
        let package =
            convert_song(&decoder, &entry(), song_data(&entry()), &LineWrap::default()).unwrap();

        // "bonus" has no asset
        let names: Vec<&str> = package.notation.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["vocals", "lead"]);

        assert_eq!(package.song.instrument_parts.len(), 2);
        assert_eq!(
            package.song.part("vocals").map(|p| p.instrument_type),
            Some(InstrumentType::Vocals)
        );
        assert_eq!(
            package.song.part("lead").map(|p| p.song_difficulty),
            Some(2.5)
        );

        // Lead has the most beats
        assert_eq!(package.structure.beats.len(), 8);
        assert!(package.structure.beats[4].is_measure);
        assert_eq!(package.arrangement_name, ARRANGEMENT_NAME);
        assert_eq!(
            package.album_art,
            Some(AlbumArt::Png(vec![0x89, b'P', b'N', b'G']))
        );
    }

    #[test]
    fn test_album_art_failure_does_not_fail_song() {
        let decoder = FakeContainer {
            fail_album_art: true,
            ..container()
        };

        let package =
            convert_song(&decoder, &entry(), song_data(&entry()), &LineWrap::default()).unwrap();
        assert_eq!(package.album_art, None);
        assert_eq!(package.notation.len(), 2);
    }

    #[test]
    fn test_write_song_audio_policy() {
        let temp = TempDir::new().unwrap();
        let song_dir = temp.path().join("song");
        let mut decoder = FakeContainer {
            audio: Some(b"OggS-first".to_vec()),
            ..Default::default()
        };

        assert!(write_song_audio(&decoder, &entry(), &song_dir, false).unwrap());
        assert_eq!(fs::read(song_dir.join(SONG_AUDIO_FILE)).unwrap(), b"OggS-first");

        // Existing audio is kept without overwrite
        decoder.audio = Some(b"OggS-second".to_vec());
        assert!(!write_song_audio(&decoder, &entry(), &song_dir, false).unwrap());
        assert_eq!(fs::read(song_dir.join(SONG_AUDIO_FILE)).unwrap(), b"OggS-first");

        assert!(write_song_audio(&decoder, &entry(), &song_dir, true).unwrap());
        assert_eq!(fs::read(song_dir.join(SONG_AUDIO_FILE)).unwrap(), b"OggS-second");
    }

    #[test]
    fn test_audio_decode_error_is_kept_and_file_removed() {
        let temp = TempDir::new().unwrap();
        let decoder = FakeContainer {
            audio: Some(b"OggS-partial".to_vec()),
            fail_audio: true,
            ..Default::default()
        };

        match write_song_audio(&decoder, &entry(), temp.path(), true) {
            Err(ConvertError::Decoder(message)) => assert_eq!(message, "truncated audio bank"),
            other => panic!("Expected decoder error, got {:?}", other),
        }
        assert!(!temp.path().join(SONG_AUDIO_FILE).exists());
    }

    #[test]
    fn test_missing_audio_bank_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let decoder = FakeContainer::default();

        assert!(!write_song_audio(&decoder, &entry(), temp.path(), true).unwrap());
        assert!(!temp.path().join(SONG_AUDIO_FILE).exists());
    }
}
