//! Polar layout of the dial.
//!
//! Angles are in radians, counter-clockwise from the playhead, which sits on
//! the positive x axis.  The grid turns with the clock: a note's first slice
//! reaches angle 0 exactly when the head reaches its start.

use std::f64::consts::PI;

use crate::note::{NoteId, PITCH_NAMES};
use crate::store::NoteStore;

/// Concentric rings: an inner and outer boundary around one ring per pitch class.
pub const RING_COUNT: usize = 14;
/// Each note is drawn as this many shrinking blobs along its duration.
pub const SLICES: usize = 4;
/// Spokes per sweep (one per 0.25 of a unit); every 4th is a unit boundary.
pub const SPOKES: usize = 16;

pub fn time_to_angle(t: f64) -> f64 {
    t * PI / 2.0
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    pub radius: f64,
    /// Pitch name for the inner rings, `None` for the two boundaries.
    pub label:  Option<&'static str>,
    pub sharp:  bool,
}

pub fn rings(radius: f64) -> Vec<Ring> {
    (1..=RING_COUNT)
        .map(|i| {
            let label = if i == 1 || i == RING_COUNT { None } else { Some(PITCH_NAMES[i - 2]) };
            Ring {
                radius: i as f64 * radius / RING_COUNT as f64,
                label,
                sharp: label.is_some_and(|l| l.len() > 1),
            }
        })
        .collect()
}

/// Radius of the ring a pitch class sits on.
pub fn pitch_radius(pitch_class: u8, radius: f64) -> f64 {
    (pitch_class as f64 + 2.0) * radius / RING_COUNT as f64
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spoke {
    pub angle: f64,
    pub inner: f64,
    pub outer: f64,
    pub major: bool,
}

pub fn spokes(head_time: f64, radius: f64) -> Vec<Spoke> {
    let head = time_to_angle(head_time);
    (0..SPOKES)
        .map(|i| Spoke {
            angle: i as f64 * PI / 8.0 - head,
            inner: radius / RING_COUNT as f64,
            outer: radius,
            major: i % 4 == 0,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slice {
    pub angle:  f64,
    /// Radial extent of the blob.
    pub length: f64,
}

impl Slice {
    pub fn point(&self, radius: f64) -> (f64, f64) {
        (radius * self.angle.cos(), radius * self.angle.sin())
    }
}

/// Where and how one note is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct NotePlacement {
    pub id:     NoteId,
    pub radius: f64,
    pub octave: i8,
    pub slices: Vec<Slice>,
}

/// Lay out every note for a dial of `radius` with the head at `head_time`.
pub fn place_notes(store: &NoteStore, head_time: f64, radius: f64) -> Vec<NotePlacement> {
    let head = time_to_angle(head_time);
    let volume_scale = radius / RING_COUNT as f64 / 2.0;
    store
        .iter()
        .map(|(id, note)| {
            let start = time_to_angle(note.start()) - head;
            let slice_angle = time_to_angle(note.duration()) / SLICES as f64;
            let base = note.volume() * volume_scale;
            let slices = (0..SLICES)
                .map(|i| Slice {
                    angle:  start + slice_angle * i as f64,
                    length: base * (1.0 - i as f64 / SLICES as f64) + 1.0,
                })
                .collect();
            NotePlacement {
                id,
                radius: pitch_radius(note.pitch_class(), radius),
                octave: note.octave(),
                slices,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    #[test]
    fn ring_layout() {
        let r = rings(140.0);
        assert_eq!(r.len(), RING_COUNT);
        assert_eq!(r[0].radius, 10.0);
        assert_eq!(r[13].radius, 140.0);
        assert_eq!(r[0].label, None);
        assert_eq!(r[1].label, Some("C"));
        assert_eq!(r[12].label, Some("B"));
        assert!(r[2].sharp);
        assert_eq!(r[1].radius, pitch_radius(0, 140.0));
    }

    #[test]
    fn note_reaches_playhead_at_its_start() {
        let mut store = NoteStore::new();
        store.add(Note::new(1.5, 3));
        let placed = place_notes(&store, 1.5, 140.0);
        assert_eq!(placed.len(), 1);
        assert!(placed[0].slices[0].angle.abs() < 1e-12);
        assert_eq!(placed[0].radius, 50.0);

        let earlier = place_notes(&store, 1.0, 140.0);
        assert!((earlier[0].slices[0].angle - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn slices_span_duration_and_shrink() {
        let mut store = NoteStore::new();
        store.add(Note::build(0.0, 0, None, Some(1.0), Some(1.0)).unwrap());
        let p = &place_notes(&store, 0.0, 140.0)[0];
        assert_eq!(p.slices.len(), SLICES);
        assert!((p.slices[3].angle - 3.0 * PI / 8.0).abs() < 1e-12);
        assert_eq!(p.slices[0].length, 6.0);
        assert!(p.slices.windows(2).all(|w| w[0].length > w[1].length));
    }

    #[test]
    fn spokes_turn_with_head() {
        let s = spokes(1.0, 140.0);
        assert_eq!(s.len(), SPOKES);
        assert!((s[0].angle + PI / 2.0).abs() < 1e-12);
        assert_eq!(s.iter().filter(|s| s.major).count(), 4);
    }
}
