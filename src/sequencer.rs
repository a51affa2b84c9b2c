use std::collections::HashSet;

use serde::Deserialize;

use crate::note::{NoteId, CYCLE_LENGTH};
use crate::store::NoteStore;

pub const DEFAULT_TEMPO: f64 = 80.0;

/// Anything that can sound a note.  Fire-and-forget: the scheduler never
/// waits on it and has no idea whether it is still busy.
pub trait AudioVoice {
    /// `duration` is passed through in timeline units; `volume` is already
    /// scaled by the master volume.
    fn trigger(&mut self, frequency: f32, duration: f32, volume: f32);
}

/// Voice used when no audio device is available.
pub struct SilentVoice;

impl AudioVoice for SilentVoice {
    fn trigger(&mut self, _frequency: f32, _duration: f32, _volume: f32) {}
}

/// Round to 4 decimal places.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// ── Timeline clock ────────────────────────────────────────────────────────────

/// Stretch of the timeline covered by one `advance()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sweep {
    pub from: f64,
    pub to:   f64,
}

/// Frame-driven phase accumulator over the 4-unit cycle.
///
/// Each tick moves the head by `1 / (4 · tempo)`; there is no wall clock.
#[derive(Clone, Debug)]
pub struct TimelineClock {
    head_time: f64,
    tempo:     f64,
    running:   bool,
}

impl Default for TimelineClock {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO)
    }
}

impl TimelineClock {
    /// Falls back to [`DEFAULT_TEMPO`] for a non-positive or non-finite tempo.
    pub fn new(tempo: f64) -> Self {
        let tempo = if tempo.is_finite() && tempo > 0.0 { tempo } else { DEFAULT_TEMPO };
        Self { head_time: 0.0, tempo, running: false }
    }

    pub fn head_time(&self) -> f64 { self.head_time }
    pub fn tempo(&self)     -> f64 { self.tempo }
    pub fn running(&self)   -> bool { self.running }

    /// Head movement per tick.
    pub fn step(&self) -> f64 {
        1.0 / (4.0 * self.tempo)
    }

    /// Returns false (and keeps the old tempo) unless `tempo` is finite and positive.
    pub fn set_tempo(&mut self, tempo: f64) -> bool {
        if !tempo.is_finite() || tempo <= 0.0 {
            return false;
        }
        self.tempo = tempo;
        true
    }

    /// Called once per frame.  No-op while paused.
    pub fn advance(&mut self) -> Option<Sweep> {
        if !self.running {
            return None;
        }
        let from = self.head_time;
        self.head_time = (self.head_time + self.step()) % CYCLE_LENGTH;
        Some(Sweep { from, to: self.head_time })
    }

    pub fn reset(&mut self) {
        self.running   = false;
        self.head_time = 0.0;
    }

    pub fn toggle_run(&mut self) {
        self.running = !self.running;
    }

    pub fn pause(&mut self)  { self.running = false; }
    pub fn resume(&mut self) { self.running = true; }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// How the head position is compared to a note's start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMatch {
    /// Fire when the head, rounded to 4 decimals, equals `start` exactly.
    /// Starts the step size cannot land on are never played.
    #[default]
    Exact,
    /// Fire when `start` falls inside the stretch swept by the last tick,
    /// at most once per pass.
    Window,
}

impl TriggerMatch {
    pub fn name(self) -> &'static str {
        match self {
            Self::Exact  => "exact",
            Self::Window => "window",
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pub policy: TriggerMatch,
    /// Notes already played in the current pass (window matching only).
    fired: HashSet<NoteId>,
}

impl Scheduler {
    pub fn new(policy: TriggerMatch) -> Self {
        Self { policy, fired: HashSet::new() }
    }

    /// Forget which notes have played this pass.
    pub fn reset(&mut self) {
        self.fired.clear();
    }

    /// Match the clock against every note and trigger the ones that hit.
    /// `sweep` is what the clock's `advance()` returned this tick.
    /// Returns the number of notes triggered.
    pub fn check(
        &mut self,
        store:         &NoteStore,
        clock:         &TimelineClock,
        sweep:         Option<Sweep>,
        master_volume: f64,
        voice:         &mut dyn AudioVoice,
    ) -> usize {
        if !clock.running() {
            return 0;
        }
        match self.policy {
            TriggerMatch::Exact => {
                let phase = round4(clock.head_time()) % CYCLE_LENGTH;
                let mut fired = 0;
                for (_, note) in store.iter() {
                    if phase == note.start() {
                        voice.trigger(
                            note.frequency(),
                            note.duration() as f32,
                            (note.volume() * master_volume) as f32,
                        );
                        fired += 1;
                    }
                }
                fired
            }
            TriggerMatch::Window => {
                let Some(sweep) = sweep else { return 0 };
                let from = round4(sweep.from) % CYCLE_LENGTH;
                let to   = round4(sweep.to) % CYCLE_LENGTH;
                let wrapped = to < from;
                if wrapped {
                    self.fired.clear();
                }
                let mut fired = 0;
                for (id, note) in store.iter() {
                    let s = note.start();
                    let hit = if wrapped { s > from || s <= to } else { s > from && s <= to };
                    if hit && self.fired.insert(id) {
                        voice.trigger(
                            note.frequency(),
                            note.duration() as f32,
                            (note.volume() * master_volume) as f32,
                        );
                        fired += 1;
                    }
                }
                fired
            }
        }
    }
}
