use std::fmt;

use crate::error::FieldError;

/// Length of one sweep of the dial, in quarter-cycle units.
pub const CYCLE_LENGTH: f64 = 4.0;

pub const PITCH_NAMES: [&str; 12] = ["C","C#","D","D#","E","F","F#","G","G#","A","A#","B"];

pub const OCTAVE_MIN: i8 = -1;
pub const OCTAVE_MAX: i8 = 9;

pub const DEFAULT_OCTAVE:   i8  = 4;
pub const DEFAULT_DURATION: f64 = 0.25;
pub const DEFAULT_VOLUME:   f64 = 1.0;

/// Grid used when entering start/duration values.
pub const TIME_STEP: f64 = 0.125;

// ── Tuning ────────────────────────────────────────────────────────────────────

/// Equal-temperament frequency of a MIDI note, A4 (69) = 440 Hz.
pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

/// MIDI note number for a pitch class in a semantic octave (C4 = 60).
pub fn midi_number(pitch_class: u8, octave: i8) -> u8 {
    ((octave as i32 + 1) * 12 + pitch_class as i32) as u8
}

/// Parse a pitch class from either its index (`"3"`) or its name (`"D#"`, `"eb"`).
pub fn parse_pitch_class(raw: &str) -> Result<u8, FieldError> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return if (0..12).contains(&n) {
            Ok(n as u8)
        } else {
            Err(FieldError::OutOfRange { min: 0.0, max: 11.0 })
        };
    }

    let mut chars = raw.chars();
    let letter = chars.next().ok_or(FieldError::UnknownPitch)?.to_ascii_uppercase();
    let natural: i32 = match letter {
        'C' => 0, 'D' => 2, 'E' => 4, 'F' => 5, 'G' => 7, 'A' => 9, 'B' => 11,
        _ => return Err(FieldError::UnknownPitch),
    };
    let accidental: i32 = match chars.as_str() {
        ""        => 0,
        "#" | "s" => 1,
        "b"       => -1,
        _ => return Err(FieldError::UnknownPitch),
    };
    Ok((natural + accidental).rem_euclid(12) as u8)
}

// ── Fields ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteField { Start, PitchClass, Octave, Duration, Volume }

impl NoteField {
    pub const ALL: [NoteField; 5] = [
        Self::Start, Self::PitchClass, Self::Octave, Self::Duration, Self::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Start      => "start",
            Self::PitchClass => "pitch",
            Self::Octave     => "octave",
            Self::Duration   => "duration",
            Self::Volume     => "volume",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Increment applied by one nudge of this field.
    pub fn step(self) -> f64 {
        match self {
            Self::Start | Self::Duration => TIME_STEP,
            Self::PitchClass | Self::Octave => 1.0,
            Self::Volume => 0.1,
        }
    }
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Note ──────────────────────────────────────────────────────────────────────

/// Stable handle for a note in a [`NoteStore`](crate::store::NoteStore).
/// Unlike a list index it survives removal of other notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub(crate) u64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One note on the dial.
///
/// Fields are private so that `frequency` can only change together with
/// `pitch_class` or `octave`.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    start:       f64,
    pitch_class: u8,
    octave:      i8,
    duration:    f64,
    volume:      f64,
    frequency:   f32,
}

impl Default for Note {
    fn default() -> Self {
        Self::new(0.0, 0)
    }
}

impl Note {
    /// A note with default octave, duration and volume.
    ///
    /// Out-of-range arguments are clamped into their valid ranges; use the
    /// setters for validated edits.
    pub fn new(start: f64, pitch_class: u8) -> Self {
        // rem_euclid rounds tiny negatives up to exactly CYCLE_LENGTH.
        let start = if start.is_finite() { start.rem_euclid(CYCLE_LENGTH) } else { 0.0 };
        let start = if start < CYCLE_LENGTH { start } else { 0.0 };
        let pitch_class = pitch_class.min(11);
        Self {
            start,
            pitch_class,
            octave:    DEFAULT_OCTAVE,
            duration:  DEFAULT_DURATION,
            volume:    DEFAULT_VOLUME,
            frequency: note_to_freq(midi_number(pitch_class, DEFAULT_OCTAVE)),
        }
    }

    /// Build a note where every optional field is explicitly "given" or "not
    /// given".  Zero is a valid value for any of them.
    pub fn build(
        start:       f64,
        pitch_class: u8,
        octave:      Option<i8>,
        duration:    Option<f64>,
        volume:      Option<f64>,
    ) -> Result<Self, FieldError> {
        let mut note = Self::new(0.0, 0);
        note.set_start(start)?;
        note.set_pitch_class(pitch_class)?;
        if let Some(o) = octave   { note.set_octave(o)?; }
        if let Some(d) = duration { note.set_duration(d)?; }
        if let Some(v) = volume   { note.set_volume(v)?; }
        Ok(note)
    }

    pub fn start(&self)       -> f64 { self.start }
    pub fn pitch_class(&self) -> u8  { self.pitch_class }
    pub fn octave(&self)      -> i8  { self.octave }
    pub fn duration(&self)    -> f64 { self.duration }
    pub fn volume(&self)      -> f64 { self.volume }
    pub fn frequency(&self)   -> f32 { self.frequency }

    pub fn midi(&self) -> u8 {
        midi_number(self.pitch_class, self.octave)
    }

    pub fn name(&self) -> String {
        format!("{}{}", PITCH_NAMES[self.pitch_class as usize], self.octave)
    }

    fn retune(&mut self) {
        self.frequency = note_to_freq(self.midi());
    }

    pub fn set_start(&mut self, start: f64) -> Result<(), FieldError> {
        if !start.is_finite() { return Err(FieldError::NotANumber); }
        if !(0.0..CYCLE_LENGTH).contains(&start) {
            return Err(FieldError::OutOfRange { min: 0.0, max: CYCLE_LENGTH });
        }
        self.start = start;
        Ok(())
    }

    pub fn set_pitch_class(&mut self, pitch_class: u8) -> Result<(), FieldError> {
        if pitch_class > 11 {
            return Err(FieldError::OutOfRange { min: 0.0, max: 11.0 });
        }
        self.pitch_class = pitch_class;
        self.retune();
        Ok(())
    }

    pub fn set_octave(&mut self, octave: i8) -> Result<(), FieldError> {
        if !(OCTAVE_MIN..=OCTAVE_MAX).contains(&octave) {
            return Err(FieldError::OutOfRange { min: OCTAVE_MIN as f64, max: OCTAVE_MAX as f64 });
        }
        self.octave = octave;
        self.retune();
        Ok(())
    }

    pub fn set_duration(&mut self, duration: f64) -> Result<(), FieldError> {
        if !duration.is_finite() { return Err(FieldError::NotANumber); }
        if duration <= 0.0 {
            return Err(FieldError::OutOfRange { min: 0.0, max: f64::INFINITY });
        }
        self.duration = duration;
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f64) -> Result<(), FieldError> {
        if !volume.is_finite() { return Err(FieldError::NotANumber); }
        if !(0.0..=1.0).contains(&volume) {
            return Err(FieldError::OutOfRange { min: 0.0, max: 1.0 });
        }
        self.volume = volume;
        Ok(())
    }

    /// Current value of `field` as a number.
    pub fn get(&self, field: NoteField) -> f64 {
        match field {
            NoteField::Start      => self.start,
            NoteField::PitchClass => self.pitch_class as f64,
            NoteField::Octave     => self.octave as f64,
            NoteField::Duration   => self.duration,
            NoteField::Volume     => self.volume,
        }
    }

    /// Parse `raw` as a value for `field` and store it.  On error nothing changes.
    pub fn apply(&mut self, field: NoteField, raw: &str) -> Result<(), FieldError> {
        match field {
            NoteField::PitchClass => self.set_pitch_class(parse_pitch_class(raw)?),
            NoteField::Octave => {
                let n = parse_integer(raw)?;
                if n < OCTAVE_MIN as i64 || n > OCTAVE_MAX as i64 {
                    return Err(FieldError::OutOfRange { min: OCTAVE_MIN as f64, max: OCTAVE_MAX as f64 });
                }
                self.set_octave(n as i8)
            }
            NoteField::Start    => self.set_start(parse_real(raw)?),
            NoteField::Duration => self.set_duration(parse_real(raw)?),
            NoteField::Volume   => self.set_volume(parse_real(raw)?),
        }
    }

    /// Move `field` by `steps` increments of [`NoteField::step`].
    pub fn nudge(&mut self, field: NoteField, steps: i32) -> Result<(), FieldError> {
        let value = self.get(field) + field.step() * steps as f64;
        match field {
            NoteField::PitchClass => {
                let pc = value.round();
                if !(0.0..=11.0).contains(&pc) {
                    return Err(FieldError::OutOfRange { min: 0.0, max: 11.0 });
                }
                self.set_pitch_class(pc as u8)
            }
            NoteField::Octave => {
                let o = value.round();
                if o < OCTAVE_MIN as f64 || o > OCTAVE_MAX as f64 {
                    return Err(FieldError::OutOfRange { min: OCTAVE_MIN as f64, max: OCTAVE_MAX as f64 });
                }
                self.set_octave(o as i8)
            }
            // Volume steps are decimal; snap so repeated nudges land on 0.1 marks.
            NoteField::Volume   => self.set_volume((value * 10.0).round() / 10.0),
            NoteField::Start    => self.set_start(value),
            NoteField::Duration => self.set_duration(value),
        }
    }
}

fn parse_real(raw: &str) -> Result<f64, FieldError> {
    let v: f64 = raw.trim().parse().map_err(|_| FieldError::NotANumber)?;
    if v.is_finite() { Ok(v) } else { Err(FieldError::NotANumber) }
}

fn parse_integer(raw: &str) -> Result<i64, FieldError> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(n);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Err(FieldError::NotAnInteger),
        _ => Err(FieldError::NotANumber),
    }
}
