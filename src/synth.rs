use std::f32::consts::PI;

use crate::sequencer::AudioVoice;

// ── Envelope shape ────────────────────────────────────────────────────────────

const ATTACK:        f32 = 0.001;
const SUSTAIN_RATIO: f32 = 0.1;
/// How long the sustain level is held before release starts.
const SUSTAIN_HOLD:  f32 = 0.1;
/// Floor for decay/release so zero-length notes still ramp.
const MIN_STAGE:     f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnvelopeStage { Attack, Decay, Sustain, Release, Off }

// ── Voice ─────────────────────────────────────────────────────────────────────

/// One triggered note: a sine oscillator under an ADSR envelope.
///
/// Decay and release are each half the note's duration; the peak is the note's
/// (master-scaled) volume.
#[derive(Clone, Debug)]
pub struct Voice {
    pub frequency: f32,
    pub phase:     f32,
    pub stage:     EnvelopeStage,
    pub level:     f32,
    peak:          f32,
    decay:         f32,
    release:       f32,
    held:          f32,
    release_level: f32,
}

impl Voice {
    pub fn new(frequency: f32, duration: f32, volume: f32) -> Self {
        let half = (duration / 2.0).max(MIN_STAGE);
        Self {
            frequency,
            phase: 0.0,
            stage: EnvelopeStage::Attack,
            level: 0.0,
            peak: volume.clamp(0.0, 1.0),
            decay: half,
            release: half,
            held: 0.0,
            release_level: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool { self.stage == EnvelopeStage::Off }

    pub fn next_sample(&mut self, sr: f32) -> f32 {
        let dt = 1.0 / sr;
        let sustain = self.peak * SUSTAIN_RATIO;
        match self.stage {
            EnvelopeStage::Attack => {
                self.level += dt * self.peak / ATTACK;
                if self.level >= self.peak { self.level = self.peak; self.stage = EnvelopeStage::Decay; }
            }
            EnvelopeStage::Decay => {
                self.level -= dt * (self.peak - sustain) / self.decay;
                if self.level <= sustain { self.level = sustain; self.stage = EnvelopeStage::Sustain; }
            }
            EnvelopeStage::Sustain => {
                self.level = sustain;
                self.held += dt;
                if self.held >= SUSTAIN_HOLD {
                    self.release_level = self.level;
                    self.stage = EnvelopeStage::Release;
                }
            }
            EnvelopeStage::Release => {
                self.level -= dt * self.release_level / self.release;
                if self.level <= 0.0 { self.level = 0.0; self.stage = EnvelopeStage::Off; }
            }
            EnvelopeStage::Off => return 0.0,
        }

        let sample = (self.phase * 2.0 * PI).sin();
        self.phase += self.frequency / sr;
        if self.phase >= 1.0 { self.phase -= 1.0; }
        sample * self.level
    }
}

// ── Synth ─────────────────────────────────────────────────────────────────────

/// Polyphonic bank of voices.  Overlapping triggers simply stack.
pub struct Synth {
    pub sample_rate: f32,
    pub voices:      Vec<Voice>,
}

impl Synth {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate, voices: Vec::new() }
    }

    pub fn generate_sample(&mut self) -> f32 {
        let sr = self.sample_rate;
        let mix: f32 = self.voices.iter_mut().map(|v| v.next_sample(sr)).sum();
        self.voices.retain(|v| !v.is_finished());
        (mix / (self.voices.len().max(1) as f32).sqrt()).tanh()
    }
}

impl AudioVoice for Synth {
    fn trigger(&mut self, frequency: f32, duration: f32, volume: f32) {
        self.voices.push(Voice::new(frequency, duration, volume));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_runs_to_completion() {
        let sr = 1000.0;
        let mut v = Voice::new(440.0, 0.25, 1.0);
        let mut peak = 0.0f32;
        let mut samples = 0;
        while !v.is_finished() && samples < 10_000 {
            v.next_sample(sr);
            peak = peak.max(v.level);
            samples += 1;
        }
        assert!(v.is_finished());
        assert!((peak - 1.0).abs() < 1e-6);
        // attack + decay + hold + release ≈ 0.001 + 0.125 + 0.1 + 0.125 s
        assert!((340..=360).contains(&samples), "{samples}");
    }

    #[test]
    fn volume_sets_peak() {
        let mut v = Voice::new(440.0, 0.25, 0.5);
        let mut peak = 0.0f32;
        for _ in 0..100 {
            v.next_sample(44_100.0);
            peak = peak.max(v.level);
        }
        assert!((peak - 0.5).abs() < 1e-6);
    }

    #[test]
    fn finished_voices_are_dropped() {
        let mut s = Synth::new(1000.0);
        s.trigger(220.0, 0.0, 1.0);
        s.trigger(330.0, 0.0, 1.0);
        assert_eq!(s.voices.len(), 2);
        for _ in 0..1000 { s.generate_sample(); }
        assert!(s.voices.is_empty());
        assert_eq!(s.generate_sample(), 0.0);
    }
}
