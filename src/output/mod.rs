// Output - On-disk song layout
// Safe naming, the per-song file package and the JSON/asset writer

pub mod naming;
pub mod package;
pub mod writer;

pub use naming::{relative_path, safe_filename};
pub use package::{AlbumArt, AudioCopy, NotationFile, SongPackage};
pub use writer::{
    write_json_condensed, write_json_pretty, OutputError, OutputResult, SongWriter,
    ALBUM_ART_FILE, SONG_FILE,
};
