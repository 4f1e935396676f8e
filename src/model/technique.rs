// Note Techniques - Semantic playing techniques and the packed note-mask decoder
// Turns the container format's per-note bitmask into a closed flag set

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Raw note-mask bits as stored by the container format
pub mod note_mask {
    pub const CHORD: u32 = 0x0000_0002;
    pub const FRETHANDMUTE: u32 = 0x0000_0008;
    pub const TREMOLO: u32 = 0x0000_0010;
    pub const HARMONIC: u32 = 0x0000_0020;
    pub const PALMMUTE: u32 = 0x0000_0040;
    pub const SLAP: u32 = 0x0000_0080;
    pub const POP: u32 = 0x0000_0100;
    pub const HAMMERON: u32 = 0x0000_0200;
    pub const PULLOFF: u32 = 0x0000_0400;
    pub const SLIDE: u32 = 0x0000_0800;
    pub const BEND: u32 = 0x0000_1000;
    pub const TAP: u32 = 0x0000_4000;
    pub const PINCHHARMONIC: u32 = 0x0000_8000;
    pub const VIBRATO: u32 = 0x0001_0000;
    pub const MUTE: u32 = 0x0002_0000;
    pub const SLIDEUNPITCHEDTO: u32 = 0x0040_0000;
    pub const ACCENT: u32 = 0x0400_0000;
    pub const CHILD: u32 = 0x1000_0000;
    pub const ARPEGGIO: u32 = 0x2000_0000;
}

/// A single playing technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technique {
    HammerOn,
    PullOff,
    Accent,
    PalmMute,
    FretHandMute,
    Slide,
    Tremolo,
    Vibrato,
    Harmonic,
    PinchHarmonic,
    Tap,
    Slap,
    Pop,
    Chord,
    /// Note expanded from (or expanded into) a chord shape
    ChordNote,
    Arpeggio,
    Bend,
    /// Sustain carried over from a previous note
    Continued,
}

impl Technique {
    pub const ALL: [Technique; 18] = [
        Technique::HammerOn,
        Technique::PullOff,
        Technique::Accent,
        Technique::PalmMute,
        Technique::FretHandMute,
        Technique::Slide,
        Technique::Tremolo,
        Technique::Vibrato,
        Technique::Harmonic,
        Technique::PinchHarmonic,
        Technique::Tap,
        Technique::Slap,
        Technique::Pop,
        Technique::Chord,
        Technique::ChordNote,
        Technique::Arpeggio,
        Technique::Bend,
        Technique::Continued,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Technique::HammerOn => "HammerOn",
            Technique::PullOff => "PullOff",
            Technique::Accent => "Accent",
            Technique::PalmMute => "PalmMute",
            Technique::FretHandMute => "FretHandMute",
            Technique::Slide => "Slide",
            Technique::Tremolo => "Tremolo",
            Technique::Vibrato => "Vibrato",
            Technique::Harmonic => "Harmonic",
            Technique::PinchHarmonic => "PinchHarmonic",
            Technique::Tap => "Tap",
            Technique::Slap => "Slap",
            Technique::Pop => "Pop",
            Technique::Chord => "Chord",
            Technique::ChordNote => "ChordNote",
            Technique::Arpeggio => "Arpeggio",
            Technique::Bend => "Bend",
            Technique::Continued => "Continued",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Technique::ALL.iter().copied().find(|t| t.name() == name)
    }
}

/// Fixed-size set of techniques
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TechniqueSet(u32);

impl TechniqueSet {
    pub const fn empty() -> Self {
        TechniqueSet(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, technique: Technique) -> bool {
        self.0 & technique.bit() != 0
    }

    pub fn insert(&mut self, technique: Technique) {
        self.0 |= technique.bit();
    }

    pub fn remove(&mut self, technique: Technique) {
        self.0 &= !technique.bit();
    }

    /// Copy of this set with one technique cleared
    pub fn without(mut self, technique: Technique) -> Self {
        self.remove(technique);
        self
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Techniques in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Technique> + '_ {
        Technique::ALL.iter().copied().filter(move |t| self.contains(*t))
    }
}

impl From<Technique> for TechniqueSet {
    fn from(technique: Technique) -> Self {
        TechniqueSet(technique.bit())
    }
}

impl FromIterator<Technique> for TechniqueSet {
    fn from_iter<I: IntoIterator<Item = Technique>>(iter: I) -> Self {
        let mut set = TechniqueSet::empty();
        for technique in iter {
            set.insert(technique);
        }
        set
    }
}

impl BitOr for TechniqueSet {
    type Output = TechniqueSet;

    fn bitor(self, rhs: TechniqueSet) -> TechniqueSet {
        TechniqueSet(self.0 | rhs.0)
    }
}

impl BitOr<Technique> for TechniqueSet {
    type Output = TechniqueSet;

    fn bitor(self, rhs: Technique) -> TechniqueSet {
        TechniqueSet(self.0 | rhs.bit())
    }
}

impl BitOrAssign for TechniqueSet {
    fn bitor_assign(&mut self, rhs: TechniqueSet) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for TechniqueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|t| t.name()).collect();
        f.write_str(&names.join(", "))
    }
}

// Flag sets are stored as "HammerOn, Vibrato" strings
impl Serialize for TechniqueSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TechniqueSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut set = TechniqueSet::empty();

        for name in text.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let technique = Technique::from_name(name)
                .ok_or_else(|| de::Error::custom(format!("unknown technique '{}'", name)))?;
            set.insert(technique);
        }

        Ok(set)
    }
}

/// Direct bit -> technique rules. Mute and slide bits need extra logic and are
/// handled in `decode_note_mask`.
const MASK_RULES: [(u32, Technique); 14] = [
    (note_mask::HAMMERON, Technique::HammerOn),
    (note_mask::PULLOFF, Technique::PullOff),
    (note_mask::ACCENT, Technique::Accent),
    (note_mask::PALMMUTE, Technique::PalmMute),
    (note_mask::TREMOLO, Technique::Tremolo),
    (note_mask::VIBRATO, Technique::Vibrato),
    (note_mask::HARMONIC, Technique::Harmonic),
    (note_mask::PINCHHARMONIC, Technique::PinchHarmonic),
    (note_mask::TAP, Technique::Tap),
    (note_mask::SLAP, Technique::Slap),
    (note_mask::POP, Technique::Pop),
    (note_mask::CHORD, Technique::Chord),
    (note_mask::ARPEGGIO, Technique::Arpeggio),
    (note_mask::BEND, Technique::Bend),
];

/// Decode a packed note mask. Unknown bits are ignored.
pub fn decode_note_mask(mask: u32) -> TechniqueSet {
    let mut set: TechniqueSet = MASK_RULES
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|(_, technique)| *technique)
        .collect();

    // A generic mute is a palm mute unless the fret hand is muting
    if mask & note_mask::FRETHANDMUTE != 0 {
        set.insert(Technique::FretHandMute);
    } else if mask & note_mask::MUTE != 0 {
        set.insert(Technique::PalmMute);
    }

    if mask & (note_mask::SLIDE | note_mask::SLIDEUNPITCHEDTO) != 0 {
        set.insert(Technique::Slide);
    }

    if mask & note_mask::CHILD != 0 {
        set.insert(Technique::Continued);
    }

    set
}
