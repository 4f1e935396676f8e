// Drum track interpreter
// Resolves Expert-lane hits into kit pieces using latched animation and tom marker state

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{PartialChart, TrackClock, TrackError, TrackInterpreter};
use crate::midi::MidiEventKind;
use crate::model::{micros_to_seconds, DrumArticulation, DrumKitPiece, SongDrumNote, SongDrumNotes};

/// Expert difficulty lanes
const KICK: u8 = 96;
const SNARE: u8 = 97;
const HIHAT_OR_TOM1: u8 = 98;
const RIDE_OR_TOM2: u8 = 99;
const CRASH_OR_TOM3: u8 = 100;

/// Tom markers turning the cymbal lanes into toms
const TOM1_MARKER: u8 = 110;
const TOM2_MARKER: u8 = 111;
const TOM3_MARKER: u8 = 112;

/// Flam grace note lead, as a fraction of a quarter note
const FLAM_QUARTER_FRACTION: f64 = 0.05;

/// Key -> strongest velocity of one coincident-tick group. Note offs count as 0.
pub type NoteGroup = BTreeMap<u8, u8>;

/// Latched lane state, carried from one note group to the next for the
/// lifetime of a drum track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrumLaneState {
    pub tom1: bool,
    pub tom2: bool,
    pub tom3: bool,
    pub hi_hat_anim: bool,
    pub open_hi_hat_anim: bool,
    pub ride_anim: bool,
    pub snare_anim: bool,
    pub tom1_anim: bool,
    pub percussion_anim: bool,
    pub crash1_anim: bool,
    pub crash2_anim: bool,
    pub choke1_anim: bool,
    pub choke2_anim: bool,
}

impl DrumLaneState {
    /// Modifier pass: every animation or marker key in the group sets its
    /// flag to whether the key is sounding
    pub fn latch(&mut self, group: &NoteGroup) {
        for (&key, &velocity) in group {
            let on = velocity > 0;

            match key {
                25 => self.open_hi_hat_anim = on,
                26..=29 => self.snare_anim = on,
                30 | 31 => self.hi_hat_anim = on,
                32 => self.percussion_anim = on,
                34..=37 => self.crash1_anim = on,
                38 | 39 | 44 | 45 => self.crash2_anim = on,
                40 => self.choke1_anim = on,
                41 => self.choke2_anim = on,
                42 | 43 => self.ride_anim = on,
                46 | 47 => self.tom1_anim = on,
                TOM1_MARKER => self.tom1 = on,
                TOM2_MARKER => self.tom2 = on,
                TOM3_MARKER => self.tom3 = on,
                _ => {}
            }
        }
    }

    fn any_crash_anim(&self) -> bool {
        self.crash1_anim || self.crash2_anim
    }

    fn any_choke_anim(&self) -> bool {
        self.choke1_anim || self.choke2_anim
    }
}

/// A kit piece hit produced by one Expert lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumHit {
    pub piece: DrumKitPiece,
    pub articulation: Option<DrumArticulation>,
}

impl DrumHit {
    fn plain(piece: DrumKitPiece) -> Self {
        DrumHit {
            piece,
            articulation: None,
        }
    }

    fn open_hi_hat() -> Self {
        DrumHit {
            piece: DrumKitPiece::HiHat,
            articulation: Some(DrumArticulation::HiHatOpen),
        }
    }
}

/// Note pass for one sounding Expert lane
pub fn resolve_lane(key: u8, group: &NoteGroup, state: &DrumLaneState) -> Option<DrumHit> {
    match key {
        KICK => Some(DrumHit::plain(DrumKitPiece::Kick)),
        SNARE => Some(DrumHit::plain(DrumKitPiece::Snare)),
        HIHAT_OR_TOM1 if state.tom1 => Some(DrumHit::plain(DrumKitPiece::Tom1)),
        HIHAT_OR_TOM1 => Some(resolve_hi_hat(group, state)),
        RIDE_OR_TOM2 if state.tom2 => Some(DrumHit::plain(DrumKitPiece::Tom2)),
        RIDE_OR_TOM2 => Some(resolve_ride(state)),
        CRASH_OR_TOM3 if state.tom3 => Some(DrumHit::plain(DrumKitPiece::Tom3)),
        CRASH_OR_TOM3 if !state.crash1_anim && state.crash2_anim => {
            Some(DrumHit::plain(DrumKitPiece::Crash2))
        }
        CRASH_OR_TOM3 => Some(DrumHit::plain(DrumKitPiece::Crash)),
        _ => None,
    }
}

fn resolve_hi_hat(group: &NoteGroup, state: &DrumLaneState) -> DrumHit {
    if state.hi_hat_anim || !state.any_crash_anim() {
        if state.open_hi_hat_anim && !state.ride_anim {
            return DrumHit::open_hi_hat();
        }
        return DrumHit::plain(DrumKitPiece::HiHat);
    }

    // No hi-hat animation but a crash is animated: play it on a crash
    let crash_lane_sounding = sounding(group, CRASH_OR_TOM3);
    let piece = if state.crash2_anim || crash_lane_sounding {
        DrumKitPiece::Crash2
    } else {
        DrumKitPiece::Crash
    };

    DrumHit::plain(piece)
}

fn resolve_ride(state: &DrumLaneState) -> DrumHit {
    if state.ride_anim {
        return DrumHit::plain(DrumKitPiece::Ride);
    }

    if state.hi_hat_anim && state.open_hi_hat_anim {
        DrumHit::open_hi_hat()
    } else if state.any_crash_anim() {
        DrumHit::plain(DrumKitPiece::Crash2)
    } else {
        DrumHit::plain(DrumKitPiece::Ride)
    }
}

fn sounding(group: &NoteGroup, key: u8) -> bool {
    group.get(&key).is_some_and(|&velocity| velocity > 0)
}

static DISCO_FLIP_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[mix 3 drums.d\]").expect("valid disco flip pattern"));
static DISCO_FLIP_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[mix 3 drums.\]").expect("valid disco flip pattern"));

/// `Some(true)` for a disco flip start marker, `Some(false)` for the end marker
fn disco_flip_marker(text: &str) -> Option<bool> {
    let lower = text.to_lowercase();

    if DISCO_FLIP_START.is_match(&lower) {
        Some(true)
    } else if DISCO_FLIP_END.is_match(&lower) {
        Some(false)
    } else {
        None
    }
}

pub struct DrumInterpreter {
    state: DrumLaneState,
    disco_flip: bool,
    group: NoteGroup,
    notes: Vec<SongDrumNote>,
}

impl DrumInterpreter {
    pub fn new() -> Self {
        DrumInterpreter {
            state: DrumLaneState::default(),
            disco_flip: false,
            group: NoteGroup::new(),
            notes: Vec::new(),
        }
    }

    fn record(&mut self, key: u8, velocity: u8) {
        // Disco flip swaps snare and hi-hat lanes while the hi-hat lane is not a tom
        let key = match key {
            SNARE if self.disco_flip && !self.state.tom1 => HIHAT_OR_TOM1,
            HIHAT_OR_TOM1 if self.disco_flip && !self.state.tom1 => SNARE,
            other => other,
        };

        let strongest = self.group.entry(key).or_insert(velocity);
        *strongest = (*strongest).max(velocity);
    }
}

impl Default for DrumInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve one coincident-tick group against the latched state. Returns the
/// hits of the group, including synthesized flam and choke notes.
pub fn resolve_group(
    group: &NoteGroup,
    state: &mut DrumLaneState,
    clock: &TrackClock,
) -> Vec<SongDrumNote> {
    state.latch(group);

    let time = clock.seconds();
    let mut hits = Vec::new();
    let mut flam = false;
    let mut choke = false;

    for (&key, &velocity) in group {
        if velocity == 0 {
            continue;
        }

        let Some(hit) = resolve_lane(key, group, state) else {
            continue;
        };

        if hit.piece == DrumKitPiece::Tom1 && sounding(group, key - 1) {
            flam = true;
        }
        if hit.piece.is_crash() && state.any_choke_anim() {
            choke = true;
        }

        hits.push(SongDrumNote::new(time, hit.piece).with_articulation(hit.articulation));
    }

    if flam {
        let lead = f64::from(clock.micros_per_quarter) * FLAM_QUARTER_FRACTION;
        let micros = (clock.micros as f64 - lead).max(0.0);
        hits.push(SongDrumNote::new(
            micros_to_seconds(micros as u64),
            DrumKitPiece::Snare,
        ));
    }

    if choke {
        hits.push(
            SongDrumNote::new(time, DrumKitPiece::Crash)
                .with_articulation(Some(DrumArticulation::CymbalChoke)),
        );
    }

    hits
}

impl TrackInterpreter for DrumInterpreter {
    fn on_event(&mut self, event: &MidiEventKind, _clock: &TrackClock) -> Result<(), TrackError> {
        match event {
            MidiEventKind::NoteOn { key, velocity } => self.record(*key, *velocity),
            MidiEventKind::NoteOff { key, .. } => self.record(*key, 0),
            MidiEventKind::Text(text) => {
                if let Some(flip) = disco_flip_marker(text) {
                    log::debug!("Disco flip {}", if flip { "on" } else { "off" });
                    self.disco_flip = flip;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn end_group(&mut self, clock: &TrackClock) {
        if self.group.is_empty() {
            return;
        }

        let group = std::mem::take(&mut self.group);
        let hits = resolve_group(&group, &mut self.state, clock);
        self.notes.extend(hits);
    }

    fn finish(self, _clock: &TrackClock) -> PartialChart {
        let mut drums = SongDrumNotes { notes: self.notes };
        drums.sort();
        PartialChart::Drums(drums)
    }
}
