// Song writer - persists converted songs as JSON/PNG/OGG files
// Layout: <root>/<artist>/<song>/{song.json, <arrangement>.json, <instrument>.json, ...}

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::naming::safe_filename;
use super::package::{AlbumArt, SongPackage};
use crate::model::SongData;

pub const SONG_FILE: &str = "song.json";
pub const ALBUM_ART_FILE: &str = "albumart.png";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OutputResult<T> = Result<T, OutputError>;

/// Write `value` as indented JSON
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> OutputResult<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Write `value` as single-line JSON
pub fn write_json_condensed<T: Serialize>(path: &Path, value: &T) -> OutputResult<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub struct SongWriter {
    root: PathBuf,
}

impl SongWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SongWriter { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a song is written to
    pub fn song_dir(&self, artist: &str, song: &str) -> PathBuf {
        self.root.join(safe_filename(artist)).join(safe_filename(song))
    }

    /// Previously written song metadata, if any. Unreadable files are
    /// treated as absent.
    pub fn read_song_data(song_dir: &Path) -> Option<SongData> {
        let path = song_dir.join(SONG_FILE);
        let contents = fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&contents) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("Ignoring unreadable {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write every file of the package into `song_dir`
    pub fn write(&self, song_dir: &Path, package: &SongPackage) -> OutputResult<()> {
        fs::create_dir_all(song_dir)?;

        for (instrument, file) in &package.notation {
            write_json_condensed(&song_dir.join(format!("{}.json", instrument)), file)?;
        }

        write_json_pretty(&song_dir.join(SONG_FILE), &package.song)?;
        write_json_condensed(
            &song_dir.join(format!("{}.json", package.arrangement_name)),
            &package.structure,
        )?;

        if let Some(art) = &package.album_art {
            if let Err(e) = write_album_art(song_dir, art) {
                log::warn!("Failed to write album art in {}: {}", song_dir.display(), e);
            }
        }

        for copy in &package.audio_copies {
            let dest = song_dir.join(&copy.dest);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&copy.source, &dest)?;
        }

        Ok(())
    }
}

fn write_album_art(song_dir: &Path, art: &AlbumArt) -> OutputResult<()> {
    let path = song_dir.join(ALBUM_ART_FILE);

    match art {
        AlbumArt::Png(bytes) => fs::write(&path, bytes)?,
        AlbumArt::CopyFrom(source) => {
            if !path.exists() {
                fs::copy(source, &path)?;
            }
        }
    }

    Ok(())
}
