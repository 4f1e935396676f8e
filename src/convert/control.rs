// Batch control: per-song progress callback and cooperative cancellation

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What to do with a song that has just been converted in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongAction {
    /// Write it and go on
    Continue,
    /// Discard it and go on with the next song
    Skip,
    /// Discard it and stop the batch
    Abort,
}

/// Shared flag a controlling thread sets to stop the batch at the next song boundary
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A converted song about to be written
#[derive(Debug, Clone, Copy)]
pub struct SongProgress<'a> {
    pub artist: &'a str,
    pub song: &'a str,
    pub song_dir: &'a Path,
    /// Songs decided so far in this batch
    pub index: usize,
}

pub trait ProgressSink {
    fn on_song(&mut self, progress: &SongProgress<'_>) -> SongAction;
}

impl<F> ProgressSink for F
where
    F: FnMut(&SongProgress<'_>) -> SongAction,
{
    fn on_song(&mut self, progress: &SongProgress<'_>) -> SongAction {
        self(progress)
    }
}

/// Consulted once per song boundary
pub struct BatchControl<'a> {
    token: CancelToken,
    sink: Option<&'a mut dyn ProgressSink>,
    decided: usize,
}

impl<'a> BatchControl<'a> {
    pub fn new(token: CancelToken) -> Self {
        BatchControl {
            token,
            sink: None,
            decided: 0,
        }
    }

    pub fn with_sink(mut self, sink: &'a mut dyn ProgressSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Decide the fate of one song. A cancelled token always aborts.
    pub fn decide(&mut self, artist: &str, song: &str, song_dir: &Path) -> SongAction {
        if self.token.is_cancelled() {
            return SongAction::Abort;
        }

        let progress = SongProgress {
            artist,
            song,
            song_dir,
            index: self.decided,
        };
        self.decided += 1;

        let action = match self.sink.as_mut() {
            Some(sink) => sink.on_song(&progress),
            None => SongAction::Continue,
        };

        // The sink may have cancelled while it ran
        if self.token.is_cancelled() {
            SongAction::Abort
        } else {
            action
        }
    }
}
