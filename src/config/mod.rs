// Config - Converter options and source metadata files

pub mod options;
pub mod song_ini;

pub use options::{config_dir, default_options_path, ConfigError, ConfigResult, ConvertOptions};
pub use song_ini::SongIni;
