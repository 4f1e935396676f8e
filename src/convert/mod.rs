// Convert - Chart assembly and batch conversion
// Turns Rock Band song folders and container files into written song packages

pub mod batch;
pub mod control;
pub mod psarc;
pub mod report;
pub mod rockband;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::midi::MidiReadError;
use crate::notation::{DecoderError, ExpandError};
use crate::output::OutputError;
use crate::timing::TempoError;

pub use batch::{discover_container_files, discover_song_folders, BatchConverter};
pub use control::{BatchControl, CancelToken, ProgressSink, SongAction, SongProgress};
pub use report::{read_report_file, BatchSummary, ReportEntry, ReportWriter, SongOutcome};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI error: {0}")]
    Midi(#[from] MidiReadError),

    #[error("Tempo error: {0}")]
    Tempo(#[from] TempoError),

    #[error("Notation error: {0}")]
    Expand(#[from] ExpandError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("No song.ini in {0}")]
    MissingSongIni(PathBuf),

    #[error("No notes.mid in {0}")]
    MissingNotes(PathBuf),
}

impl From<DecoderError> for ConvertError {
    fn from(e: DecoderError) -> Self {
        ConvertError::Decoder(e.to_string())
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;
