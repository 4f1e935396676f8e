// Song package: everything one converted song writes to its directory

use std::path::PathBuf;

use serde::Serialize;

use crate::model::{
    SongData, SongDrumNotes, SongInstrumentNotes, SongKeyboardNotes, SongStructure, SongVocal,
};

/// Content of one `<instrumentName>.json` file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NotationFile {
    Notes(SongInstrumentNotes),
    Vocals(Vec<SongVocal>),
    Drums(SongDrumNotes),
    Keys(SongKeyboardNotes),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlbumArt {
    /// Encoded PNG, always written
    Png(Vec<u8>),
    /// Existing image copied only when the song has no album art yet
    CopyFrom(PathBuf),
}

/// A file copied into the song directory
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCopy {
    pub source: PathBuf,
    /// Destination relative to the song directory
    pub dest: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongPackage {
    pub song: SongData,
    /// File name (without extension) of the beat/section structure
    pub arrangement_name: String,
    pub structure: SongStructure,
    /// Instrument name -> notation content
    pub notation: Vec<(String, NotationFile)>,
    pub album_art: Option<AlbumArt>,
    pub audio_copies: Vec<AudioCopy>,
}

impl SongPackage {
    pub fn new(song: SongData, arrangement_name: impl Into<String>) -> Self {
        SongPackage {
            song,
            arrangement_name: arrangement_name.into(),
            structure: SongStructure::default(),
            notation: Vec::new(),
            album_art: None,
            audio_copies: Vec::new(),
        }
    }

    pub fn add_notation(&mut self, instrument: impl Into<String>, file: NotationFile) {
        self.notation.push((instrument.into(), file));
    }
}
