// Lyrics - Vocal line formatting
// Breaks a timed lyric sequence into display lines

pub mod line_wrap;

pub use line_wrap::LineWrap;
