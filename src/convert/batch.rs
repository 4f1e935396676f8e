// Batch conversion - Walks every configured source and converts songs one at a time
// Songs are converted and written one at a time on the calling thread

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::control::{BatchControl, SongAction};
use super::psarc::{self, companion_audio_path, merge_song_data, song_data, write_song_audio};
use super::report::{BatchSummary, ReportEntry, ReportWriter, SongOutcome};
use super::rockband::{self, SONG_INI_FILE};
use super::ConvertResult;
use crate::config::ConvertOptions;
use crate::lyrics::LineWrap;
use crate::model::SongData;
use crate::notation::{ContainerDecoder, ContainerOpener};
use crate::output::{SongPackage, SongWriter};

const CONTAINER_EXTENSION: &str = "psarc";

fn walk(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> + '_ {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
}

/// Every container file below `root`, in file name order
pub fn discover_container_files(root: &Path) -> Vec<PathBuf> {
    walk(root)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CONTAINER_EXTENSION))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Every directory below `root` (including `root`) holding a song.ini
pub fn discover_song_folders(root: &Path) -> Vec<PathBuf> {
    walk(root)
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| entry.path().join(SONG_INI_FILE).is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn song_label(song: &SongData) -> String {
    format!("{} - {}", song.artist_name, song.song_name)
}

pub struct BatchConverter {
    options: ConvertOptions,
    writer: SongWriter,
    report: ReportWriter,
    opener: Option<Box<dyn ContainerOpener + Send>>,
    wrap: LineWrap,
}

impl BatchConverter {
    pub fn new(options: ConvertOptions) -> Self {
        let writer = SongWriter::new(options.song_output_path.clone());
        let report = ReportWriter::in_dir(writer.root());

        BatchConverter {
            options,
            writer,
            report,
            opener: None,
            wrap: LineWrap::default(),
        }
    }

    /// Container files are only converted when a decoder is available
    pub fn with_container_opener(mut self, opener: Box<dyn ContainerOpener + Send>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn with_line_wrap(mut self, wrap: LineWrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn writer(&self) -> &SongWriter {
        &self.writer
    }

    pub fn report_path(&self) -> &Path {
        self.report.path()
    }

    /// Convert every source. Failures are recorded and the batch goes on;
    /// only an abort from `control` stops it early.
    pub fn run(&self, control: &mut BatchControl<'_>) -> BatchSummary {
        let mut summary = BatchSummary::default();

        log::info!("Converting into {}", self.writer.root().display());

        if self.options.convert_psarc && self.run_containers(control, &mut summary).is_break() {
            return summary;
        }

        if self.options.convert_rock_band && self.run_rock_band(control, &mut summary).is_break() {
            log::info!("Batch stopped during song folders");
        }

        summary
    }

    fn container_files(&self) -> Vec<PathBuf> {
        let mut files = self.options.psarc_files.clone();
        for folder in &self.options.psarc_folders {
            files.extend(discover_container_files(folder));
        }
        files
    }

    fn run_containers(
        &self,
        control: &mut BatchControl<'_>,
        summary: &mut BatchSummary,
    ) -> ControlFlow<()> {
        let files = self.container_files();

        let Some(opener) = self.opener.as_deref() else {
            if !files.is_empty() {
                log::warn!(
                    "No container decoder available, skipping {} container files",
                    files.len()
                );
            }
            for file in &files {
                self.record(
                    summary,
                    ReportEntry::new(file, None, SongOutcome::Skipped)
                        .with_message("no container decoder"),
                );
            }
            return ControlFlow::Continue(());
        };

        for file in &files {
            if control.is_cancelled() {
                summary.aborted = true;
                return ControlFlow::Break(());
            }

            log::info!("Reading {}", file.display());
            match self.convert_container(opener, file, control, summary) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => return ControlFlow::Break(()),
                Err(e) => {
                    log::error!("Failed to read {}: {}", file.display(), e);
                    self.record(
                        summary,
                        ReportEntry::new(file, None, SongOutcome::Failed)
                            .with_message(e.to_string()),
                    );
                }
            }
        }

        ControlFlow::Continue(())
    }

    fn open_audio_source(
        &self,
        opener: &dyn ContainerOpener,
        container: &Path,
    ) -> Option<Box<dyn ContainerDecoder>> {
        let companion = companion_audio_path(container)?;

        match opener.open(&companion) {
            Ok(decoder) => Some(decoder),
            Err(e) => {
                log::warn!(
                    "Audio for {} comes from {}, which failed to open: {}",
                    container.display(),
                    companion.display(),
                    e
                );
                None
            }
        }
    }

    fn convert_container(
        &self,
        opener: &dyn ContainerOpener,
        file: &Path,
        control: &mut BatchControl<'_>,
        summary: &mut BatchSummary,
    ) -> ConvertResult<ControlFlow<()>> {
        let decoder = opener.open(file)?;
        let songs = decoder.songs()?;

        let companion = self.open_audio_source(opener, file);
        let audio: Option<&dyn ContainerDecoder> = if companion_audio_path(file).is_some() {
            companion.as_deref()
        } else {
            Some(decoder.as_ref())
        };

        for entry in &songs {
            if control.is_cancelled() {
                summary.aborted = true;
                return Ok(ControlFlow::Break(()));
            }

            let song_dir = self.writer.song_dir(&entry.artist_name, &entry.song_name);
            if !self.options.overwrite_data && song_dir.exists() {
                log::info!("Keeping existing {}", song_dir.display());
                self.record(
                    summary,
                    ReportEntry::new(
                        file,
                        Some(format!("{} - {}", entry.artist_name, entry.song_name)),
                        SongOutcome::Skipped,
                    )
                    .with_message("already converted"),
                );
                continue;
            }

            let song = merge_song_data(SongWriter::read_song_data(&song_dir), song_data(entry));
            let converted = psarc::convert_song(decoder.as_ref(), entry, song, &self.wrap)
                .map(|package| (song_dir, package));

            let flow = self.deliver(file, converted, control, summary, |song_dir| {
                let Some(audio) = audio else {
                    return;
                };
                if let Err(e) =
                    write_song_audio(audio, entry, song_dir, self.options.overwrite_audio)
                {
                    log::warn!("Failed to write audio for {}: {}", entry.song_key, e);
                }
            });
            if flow.is_break() {
                return Ok(flow);
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    fn run_rock_band(
        &self,
        control: &mut BatchControl<'_>,
        summary: &mut BatchSummary,
    ) -> ControlFlow<()> {
        for root in &self.options.rock_band_folders {
            for folder in discover_song_folders(root) {
                if control.is_cancelled() {
                    summary.aborted = true;
                    return ControlFlow::Break(());
                }

                log::info!("Reading {}", folder.display());
                let converted = rockband::convert_song(
                    &folder,
                    &self.writer,
                    self.options.copy_rock_band_audio,
                    &self.wrap,
                )
                .map(|song| (song.song_dir, song.package));

                self.deliver(&folder, converted, control, summary, |_| {})?;
            }
        }

        ControlFlow::Continue(())
    }

    /// Hand a song converted in memory to the batch control, then write it
    /// or drop it. `after_write` runs only for written songs.
    fn deliver(
        &self,
        source: &Path,
        converted: ConvertResult<(PathBuf, SongPackage)>,
        control: &mut BatchControl<'_>,
        summary: &mut BatchSummary,
        after_write: impl FnOnce(&Path),
    ) -> ControlFlow<()> {
        let (song_dir, package) = match converted {
            Ok(converted) => converted,
            Err(e) => {
                log::error!("Failed to convert {}: {}", source.display(), e);
                self.record(
                    summary,
                    ReportEntry::new(source, None, SongOutcome::Failed).with_message(e.to_string()),
                );
                return ControlFlow::Continue(());
            }
        };

        let label = song_label(&package.song);
        let action = control.decide(&package.song.artist_name, &package.song.song_name, &song_dir);

        match action {
            SongAction::Abort => {
                log::info!("Batch aborted before writing {}", label);
                summary.aborted = true;
                ControlFlow::Break(())
            }
            SongAction::Skip => {
                log::info!("Skipped {}", label);
                self.record(
                    summary,
                    ReportEntry::new(source, Some(label), SongOutcome::Skipped),
                );
                ControlFlow::Continue(())
            }
            SongAction::Continue => {
                match self.writer.write(&song_dir, &package) {
                    Ok(()) => {
                        after_write(&song_dir);
                        log::info!("Converted {} -> {}", label, song_dir.display());
                        self.record(
                            summary,
                            ReportEntry::new(source, Some(label), SongOutcome::Converted),
                        );
                    }
                    Err(e) => {
                        log::error!("Failed to write {}: {}", song_dir.display(), e);
                        self.record(
                            summary,
                            ReportEntry::new(source, Some(label), SongOutcome::Failed)
                                .with_message(e.to_string()),
                        );
                    }
                }
                ControlFlow::Continue(())
            }
        }
    }

    fn record(&self, summary: &mut BatchSummary, entry: ReportEntry) {
        summary.record(entry.outcome);

        if let Err(e) = self.report.write(&entry) {
            log::warn!("Failed to append to {}: {}", self.report.path().display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::control::{CancelToken, SongProgress};
    use crate::convert::psarc::fake::FakeContainer;
    use crate::convert::psarc::SONG_AUDIO_FILE;
    use crate::convert::report::read_report_file;
    use crate::notation::{
        ArrangementAttributes, ArrangementEntry, ArrangementPaths, BeatRecord, DecoderError,
        NotationAsset, SongEntry,
    };
    use crate::output::SONG_FILE;
    use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Opens fake containers by file name
    struct FakeOpener {
        containers: HashMap<String, FakeContainer>,
    }

    impl ContainerOpener for FakeOpener {
        fn open(&self, path: &Path) -> Result<Box<dyn ContainerDecoder>, DecoderError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.containers.get(&name) {
                Some(container) => Ok(Box::new(container.clone())),
                None => Err(format!("cannot open {}", name).into()),
            }
        }
    }

    fn drums_mid() -> Vec<u8> {
        let event = |delta: u32, kind| TrackEvent {
            delta: delta.into(),
            kind,
        };
        let hit = |delta: u32, vel: u8| {
            event(
                delta,
                TrackEventKind::Midi {
                    channel: 0.into(),
                    message: MidiMessage::NoteOn {
                        key: 96.into(),
                        vel: vel.into(),
                    },
                },
            )
        };

        let smf = Smf {
            header: Header {
                format: Format::Parallel,
                timing: Timing::Metrical(480.into()),
            },
            tracks: vec![
                vec![
                    event(0, TrackEventKind::Meta(MetaMessage::Tempo(500_000.into()))),
                    event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
                ],
                vec![
                    event(0, TrackEventKind::Meta(MetaMessage::TrackName(b"PART DRUMS"))),
                    hit(0, 100),
                    hit(240, 0),
                    event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
                ],
            ],
        };

        let mut bytes = Vec::new();
        smf.write(&mut bytes).unwrap();
        bytes
    }

    fn rock_band_song(root: &Path, folder: &str, name: &str) -> PathBuf {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(SONG_INI_FILE),
            format!("[song]\nname = {}\nartist = Band\nsong_length = 1000\n", name),
        )
        .unwrap();
        fs::write(dir.join("notes.mid"), drums_mid()).unwrap();
        fs::write(dir.join("drums.ogg"), b"OggS").unwrap();
        dir
    }

    fn container_song(name: &str) -> SongEntry {
        SongEntry {
            song_key: name.to_lowercase(),
            song_name: name.to_string(),
            artist_name: "Band".to_string(),
            arrangements: vec![ArrangementEntry {
                name: "bass".to_string(),
                attributes: ArrangementAttributes {
                    properties: Some(ArrangementPaths {
                        bass: true,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            }],
            ..Default::default()
        }
    }

    fn container(songs: &[&str], audio: Option<&[u8]>) -> FakeContainer {
        let mut container = FakeContainer {
            songs: songs.iter().map(|name| container_song(name)).collect(),
            audio: audio.map(<[u8]>::to_vec),
            ..Default::default()
        };
        for name in songs {
            container = container.with_asset(
                &name.to_lowercase(),
                "bass",
                NotationAsset {
                    beats: vec![BeatRecord { time: 0.0, mask: 1 }],
                    ..Default::default()
                },
            );
        }
        container
    }

    fn options(output: &Path) -> ConvertOptions {
        ConvertOptions {
            song_output_path: output.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_discover_song_folders() {
        let temp = TempDir::new().unwrap();
        rock_band_song(temp.path(), "b/second", "Two");
        rock_band_song(temp.path(), "a/first", "One");
        fs::create_dir_all(temp.path().join("c/no_ini")).unwrap();

        let folders = discover_song_folders(temp.path());
        assert_eq!(
            folders,
            vec![temp.path().join("a/first"), temp.path().join("b/second")]
        );
    }

    #[test]
    fn test_discover_container_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("dlc")).unwrap();
        fs::write(temp.path().join("dlc/b_p.PSARC"), b"").unwrap();
        fs::write(temp.path().join("a_p.psarc"), b"").unwrap();
        fs::write(temp.path().join("readme.txt"), b"").unwrap();

        let files = discover_container_files(temp.path());
        assert_eq!(
            files,
            vec![temp.path().join("a_p.psarc"), temp.path().join("dlc/b_p.PSARC")]
        );
    }

    #[test]
    fn test_rock_band_batch_writes_song_and_report() {
        let temp = TempDir::new().unwrap();
        let sources = temp.path().join("rb");
        rock_band_song(&sources, "song", "One");

        let mut options = options(&temp.path().join("out"));
        options.rock_band_folders = vec![sources];

        let converter = BatchConverter::new(options);
        let summary = converter.run(&mut BatchControl::new(CancelToken::new()));

        assert_eq!(summary.converted, 1);
        assert!(!summary.aborted);

        let song_dir = converter.writer().song_dir("Band", "One");
        assert!(song_dir.join(SONG_FILE).is_file());
        assert!(song_dir.join("drums.json").is_file());
        assert!(song_dir.join("rbarrangement.json").is_file());
        assert!(song_dir.join("rbaudio/drums.ogg").is_file());

        let report = read_report_file(converter.report_path()).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].outcome, SongOutcome::Converted);
        assert_eq!(report[0].song.as_deref(), Some("Band - One"));
    }

    #[test]
    fn test_failed_folder_does_not_stop_batch() {
        let temp = TempDir::new().unwrap();
        let sources = temp.path().join("rb");
        rock_band_song(&sources, "good", "Good");
        let broken = rock_band_song(&sources, "broken", "Broken");
        fs::write(broken.join("notes.mid"), b"not midi").unwrap();

        let mut options = options(&temp.path().join("out"));
        options.rock_band_folders = vec![sources];

        let converter = BatchConverter::new(options);
        let summary = converter.run(&mut BatchControl::new(CancelToken::new()));

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_skip_and_abort_leave_no_output() {
        let temp = TempDir::new().unwrap();
        let sources = temp.path().join("rb");
        rock_band_song(&sources, "a", "One");
        rock_band_song(&sources, "b", "Two");
        rock_band_song(&sources, "c", "Three");

        let mut options = options(&temp.path().join("out"));
        options.rock_band_folders = vec![sources];
        let converter = BatchConverter::new(options);

        let mut sink = |progress: &SongProgress<'_>| match progress.song {
            "One" => SongAction::Skip,
            "Two" => SongAction::Abort,
            _ => SongAction::Continue,
        };
        let mut control = BatchControl::new(CancelToken::new()).with_sink(&mut sink);
        let summary = converter.run(&mut control);

        assert!(summary.aborted);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.converted, 0);
        assert!(!converter.writer().song_dir("Band", "One").exists());
        assert!(!converter.writer().song_dir("Band", "Two").exists());
        assert!(!converter.writer().song_dir("Band", "Three").exists());
    }

    #[test]
    fn test_cancelled_token_stops_before_first_song() {
        let temp = TempDir::new().unwrap();
        let sources = temp.path().join("rb");
        rock_band_song(&sources, "a", "One");

        let mut options = options(&temp.path().join("out"));
        options.rock_band_folders = vec![sources];
        let converter = BatchConverter::new(options);

        let token = CancelToken::new();
        token.cancel();
        let summary = converter.run(&mut BatchControl::new(token));

        assert!(summary.aborted);
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_container_batch() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("songs_p.psarc");
        fs::write(&file, b"").unwrap();

        let opener = FakeOpener {
            containers: HashMap::from([(
                "songs_p.psarc".to_string(),
                container(&["One", "Two"], Some(b"OggS".as_slice())),
            )]),
        };

        let mut options = options(&temp.path().join("out"));
        options.psarc_files = vec![file];
        let converter = BatchConverter::new(options).with_container_opener(Box::new(opener));
        let summary = converter.run(&mut BatchControl::new(CancelToken::new()));

        assert_eq!(summary.converted, 2);
        let song_dir = converter.writer().song_dir("Band", "Two");
        assert!(song_dir.join("bass.json").is_file());
        assert!(song_dir.join("arrangement.json").is_file());
        assert_eq!(fs::read(song_dir.join(SONG_AUDIO_FILE)).unwrap(), b"OggS");

        let song: SongData =
            serde_json::from_str(&fs::read_to_string(song_dir.join(SONG_FILE)).unwrap()).unwrap();
        assert_eq!(song.instrument_parts.len(), 1);
        assert_eq!(song.instrument_parts[0].instrument_name, "bass");
    }

    #[test]
    fn test_existing_song_kept_without_overwrite_data() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("songs_p.psarc");
        fs::write(&file, b"").unwrap();

        let opener = FakeOpener {
            containers: HashMap::from([(
                "songs_p.psarc".to_string(),
                container(&["One"], None),
            )]),
        };

        let mut options = options(&temp.path().join("out"));
        options.psarc_files = vec![file];
        options.overwrite_data = false;
        let converter = BatchConverter::new(options).with_container_opener(Box::new(opener));

        let song_dir = converter.writer().song_dir("Band", "One");
        fs::create_dir_all(&song_dir).unwrap();

        let summary = converter.run(&mut BatchControl::new(CancelToken::new()));
        assert_eq!(summary.skipped, 1);
        assert!(!song_dir.join(SONG_FILE).exists());
    }

    #[test]
    fn test_companion_archive_supplies_audio() {
        let temp = TempDir::new().unwrap();
        let dlc = temp.path().join("dlc");
        fs::create_dir_all(&dlc).unwrap();
        let file = dlc.join(psarc::COMPANION_ARCHIVE_FILE);
        fs::write(&file, b"").unwrap();

        let opener = FakeOpener {
            containers: HashMap::from([
                (
                    psarc::COMPANION_ARCHIVE_FILE.to_string(),
                    container(&["Old"], None),
                ),
                (
                    psarc::COMPANION_AUDIO_FILE.to_string(),
                    container(&[], Some(b"OggS-companion".as_slice())),
                ),
            ]),
        };

        let mut options = options(&temp.path().join("out"));
        options.psarc_files = vec![file];
        let converter = BatchConverter::new(options).with_container_opener(Box::new(opener));
        let summary = converter.run(&mut BatchControl::new(CancelToken::new()));

        assert_eq!(summary.converted, 1);
        let song_dir = converter.writer().song_dir("Band", "Old");
        assert_eq!(
            fs::read(song_dir.join(SONG_AUDIO_FILE)).unwrap(),
            b"OggS-companion"
        );
    }

    #[test]
    fn test_container_without_decoder_is_skipped() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("songs_p.psarc");
        fs::write(&file, b"").unwrap();

        let mut options = options(&temp.path().join("out"));
        options.psarc_files = vec![file];
        let converter = BatchConverter::new(options);
        let summary = converter.run(&mut BatchControl::new(CancelToken::new()));

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.converted, 0);
    }

    #[test]
    fn test_unopenable_container_is_failed() {
        let temp = TempDir::new().unwrap();
        let opener = FakeOpener {
            containers: HashMap::new(),
        };

        let mut options = options(&temp.path().join("out"));
        options.psarc_files = vec![temp.path().join("missing_p.psarc")];
        let converter = BatchConverter::new(options).with_container_opener(Box::new(opener));
        let summary = converter.run(&mut BatchControl::new(CancelToken::new()));

        assert_eq!(summary.failed, 1);
        let report = read_report_file(converter.report_path()).unwrap();
        assert_eq!(report[0].song, None);
    }
}
