// Tempo Map - Tick to absolute time conversion
// Walks a tick-ascending list of tempo changes incrementally

use thiserror::Error;

use crate::model::micros_to_seconds;

/// MIDI default tempo (120 BPM)
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

#[derive(Debug, Error)]
pub enum TempoError {
    #[error("ticks per quarter note must be non-zero")]
    ZeroResolution,
}

/// A tempo change at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoChange {
    pub tick: u64,
    pub micros_per_quarter: u32,
}

/// Tempo changes of one source file, shared by all of its tracks
#[derive(Debug, Clone)]
pub struct TempoMap {
    ticks_per_quarter: u32,
    changes: Vec<TempoChange>,
}

impl TempoMap {
    pub fn new(ticks_per_quarter: u32) -> Result<Self, TempoError> {
        if ticks_per_quarter == 0 {
            return Err(TempoError::ZeroResolution);
        }

        Ok(TempoMap {
            ticks_per_quarter,
            changes: Vec::new(),
        })
    }

    /// Add a tempo change, keeping the list tick-ascending. Changes at the
    /// same tick keep their insertion order.
    pub fn push(&mut self, tick: u64, micros_per_quarter: u32) {
        let at = self.changes.partition_point(|change| change.tick <= tick);
        self.changes.insert(
            at,
            TempoChange {
                tick,
                micros_per_quarter,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn ticks_per_quarter(&self) -> u32 {
        self.ticks_per_quarter
    }

    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// Start walking the map from tick 0. `None` when there is no tempo yet.
    pub fn cursor(&self) -> Option<TempoCursor<'_>> {
        TempoCursor::new(self)
    }

    /// Absolute microseconds at `tick`
    pub fn micros_at(&self, tick: u64) -> Option<u64> {
        let mut cursor = self.cursor()?;
        Some(cursor.advance(tick))
    }
}

/// Incremental tick -> microsecond converter.
///
/// Elapsed time is measured from the start of the current tempo segment, so
/// integer truncation happens once per segment boundary and never per call:
/// `advance(a); advance(b)` lands on exactly the same time as `advance(a + b)`.
#[derive(Debug, Clone)]
pub struct TempoCursor<'a> {
    map: &'a TempoMap,
    next_change: usize,
    micros_per_quarter: u32,
    tick: u64,
    segment_tick: u64,
    segment_micros: u64,
    micros: u64,
}

impl<'a> TempoCursor<'a> {
    fn new(map: &'a TempoMap) -> Option<Self> {
        let first = map.changes.first()?;

        Some(TempoCursor {
            map,
            next_change: 0,
            micros_per_quarter: first.micros_per_quarter,
            tick: 0,
            segment_tick: 0,
            segment_micros: 0,
            micros: 0,
        })
    }

    fn span_micros(&self, ticks: u64) -> u64 {
        ticks * u64::from(self.micros_per_quarter) / u64::from(self.map.ticks_per_quarter)
    }

    /// Consume `delta_ticks`, crossing any tempo changes on the way.
    /// Returns the new absolute time in microseconds.
    pub fn advance(&mut self, delta_ticks: u64) -> u64 {
        let target = self.tick + delta_ticks;

        while let Some(change) = self.map.changes.get(self.next_change) {
            if change.tick > target {
                break;
            }

            let boundary = change.tick.max(self.segment_tick);
            self.segment_micros += self.span_micros(boundary - self.segment_tick);
            self.segment_tick = boundary;
            self.micros_per_quarter = change.micros_per_quarter;
            self.next_change += 1;
        }

        self.tick = target;
        self.micros = self.segment_micros + self.span_micros(target - self.segment_tick);
        self.micros
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn micros(&self) -> u64 {
        self.micros
    }

    pub fn seconds(&self) -> f32 {
        micros_to_seconds(self.micros)
    }

    /// Tempo in effect at the current position
    pub fn micros_per_quarter(&self) -> u32 {
        self.micros_per_quarter
    }
}
