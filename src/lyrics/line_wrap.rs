// Greedy lyric line wrapping
// A break is a '\n' appended to the fragment that ends the line

use crate::model::SongVocal;

/// Line length bounds, in characters, and the pause that counts as a phrase gap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineWrap {
    /// Break early once a line has this many characters and a good break point shows up
    pub min_chars: usize,
    /// Always break once a line is longer than this
    pub max_chars: usize,
    pub gap_seconds: f32,
}

impl Default for LineWrap {
    fn default() -> Self {
        LineWrap {
            min_chars: 20,
            max_chars: 35,
            gap_seconds: 0.5,
        }
    }
}

impl LineWrap {
    /// Mark line breaks in place. Fragments are never removed or reordered,
    /// and fragments that already end a line start a new one.
    pub fn apply(&self, vocals: &mut [SongVocal]) {
        let mut line_chars = 0;

        for index in 0..vocals.len() {
            if vocals[index].ends_line() {
                line_chars = 0;
                continue;
            }

            line_chars += vocals[index].vocal.chars().count();

            let good_break = vocals
                .get(index + 1)
                .is_some_and(|next| self.is_good_break(&vocals[index], next));

            if (good_break && line_chars >= self.min_chars) || line_chars > self.max_chars {
                vocals[index].vocal.push('\n');
                line_chars = 0;
            }
        }
    }

    /// A new sentence or a pause before `next`
    fn is_good_break(&self, current: &SongVocal, next: &SongVocal) -> bool {
        let capitalized = next
            .vocal
            .trim_start()
            .chars()
            .next()
            .is_some_and(char::is_uppercase);

        capitalized || next.time_offset - current.time_offset > self.gap_seconds
    }
}
