use crate::error::{CommandError, PresetError};
use crate::note::{Note, NoteId, CYCLE_LENGTH, DEFAULT_DURATION, DEFAULT_VOLUME, TIME_STEP};

/// Most preset entries that fit on the dial at one per [`TIME_STEP`].
pub const PRESET_MAX_LEN: usize = (CYCLE_LENGTH / TIME_STEP) as usize;

/// Built-in preset: I-vi-IV-V arpeggios, eight steps per chord.
pub const DEFAULT_PRESET: [(u8, i8); 32] = [
    // C
    (0,4), (4,4), (7,4), (0,5), (7,4), (4,4), (0,4), (7,3),
    // Am
    (9,3), (0,4), (4,4), (9,4), (4,4), (0,4), (9,3), (4,3),
    // F
    (5,3), (9,3), (0,4), (5,4), (0,4), (9,3), (5,3), (0,3),
    // G
    (7,3), (11,3), (2,4), (7,4), (2,4), (11,3), (7,3), (2,3),
];

/// Insertion-ordered notes.  List order only matters for picking a note by
/// position; playback order comes from each note's start.
#[derive(Debug, Default)]
pub struct NoteStore {
    notes:   Vec<(NoteId, Note)>,
    next_id: u64,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize { self.notes.len() }

    pub fn is_empty(&self) -> bool { self.notes.is_empty() }

    /// Append a note.  Returns the new count, so `count - 1` indexes the note just added.
    pub fn add(&mut self, note: Note) -> usize {
        self.insert(note);
        self.notes.len()
    }

    /// Append a note and hand back its id.
    pub fn insert(&mut self, note: Note) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        self.notes.push((id, note));
        id
    }

    /// Remove the note at `index`.  Later notes shift down by one; their ids do not change.
    pub fn remove(&mut self, index: usize) -> Result<Note, CommandError> {
        if index >= self.notes.len() {
            return Err(CommandError::InvalidSelection { index, len: self.notes.len() });
        }
        Ok(self.notes.remove(index).1)
    }

    pub fn remove_id(&mut self, id: NoteId) -> Option<Note> {
        let index = self.index_of(id)?;
        Some(self.notes.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index).map(|(_, n)| n)
    }

    pub fn id_at(&self, index: usize) -> Option<NoteId> {
        self.notes.get(index).map(|(id, _)| *id)
    }

    pub fn index_of(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|(i, _)| *i == id)
    }

    pub fn by_id(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|(i, _)| *i == id).map(|(_, n)| n)
    }

    pub fn by_id_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|(i, _)| *i == id).map(|(_, n)| n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &Note)> {
        self.notes.iter().map(|(id, n)| (*id, n))
    }

    /// Replace the whole store with `data`, one note per [`TIME_STEP`] from 0.
    ///
    /// Every entry is validated before anything is touched; on error the
    /// store keeps its previous contents.
    pub fn load_preset(&mut self, data: &[(u8, i8)]) -> Result<usize, PresetError> {
        if data.len() > PRESET_MAX_LEN {
            return Err(PresetError::TooLong { len: data.len(), max: PRESET_MAX_LEN });
        }
        let notes = data
            .iter()
            .enumerate()
            .map(|(index, &(pitch_class, octave))| {
                Note::build(
                    index as f64 * TIME_STEP,
                    pitch_class,
                    Some(octave),
                    Some(DEFAULT_DURATION),
                    Some(DEFAULT_VOLUME),
                )
                .map_err(|reason| PresetError::InvalidEntry { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.clear();
        for note in notes {
            self.add(note);
        }
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{midi_number, note_to_freq};

    fn three() -> NoteStore {
        let mut s = NoteStore::new();
        s.add(Note::new(0.0, 0));
        s.add(Note::new(1.0, 4));
        s.add(Note::new(2.0, 7));
        s
    }

    #[test]
    fn add_returns_count() {
        let mut s = NoteStore::new();
        assert_eq!(s.add(Note::default()), 1);
        assert_eq!(s.add(Note::default()), 2);
    }

    #[test]
    fn insert_returns_id_of_last_note() {
        let mut s = NoteStore::new();
        s.add(Note::default());
        let id = s.insert(Note::new(2.0, 5));
        assert_eq!(s.len(), 2);
        assert_eq!(s.id_at(1), Some(id));
        assert_eq!(s.by_id(id).unwrap().pitch_class(), 5);
    }

    #[test]
    fn add_then_read_round_trip() {
        let mut s = NoteStore::new();
        let n = Note::build(1.0, 2, Some(5), Some(0.5), Some(0.8)).unwrap();
        let count = s.add(n);
        let read = s.get(count - 1).unwrap();
        assert_eq!(read.start(), 1.0);
        assert_eq!(read.pitch_class(), 2);
        assert_eq!(read.octave(), 5);
        assert_eq!(read.duration(), 0.5);
        assert_eq!(read.volume(), 0.8);
        assert_eq!(read.frequency(), note_to_freq((5 + 1) * 12 + 2));
    }

    #[test]
    fn remove_middle_shifts_neighbours() {
        let mut s = three();
        let first = s.id_at(0).unwrap();
        let last = s.id_at(2).unwrap();

        let removed = s.remove(1).unwrap();
        assert_eq!(removed.pitch_class(), 4);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(0).unwrap().pitch_class(), 0);
        assert_eq!(s.get(1).unwrap().pitch_class(), 7);
        assert_eq!(s.index_of(first), Some(0));
        assert_eq!(s.index_of(last), Some(1));
    }

    #[test]
    fn remove_out_of_bounds_is_rejected() {
        let mut s = three();
        assert_eq!(s.remove(3), Err(CommandError::InvalidSelection { index: 3, len: 3 }));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut s = three();
        let old = s.id_at(2).unwrap();
        s.remove(2).unwrap();
        s.add(Note::default());
        assert_ne!(s.id_at(2), Some(old));
        assert!(s.by_id(old).is_none());
    }

    #[test]
    fn preset_spacing_and_order() {
        let mut s = three();
        assert_eq!(s.load_preset(&DEFAULT_PRESET), Ok(32));
        assert_eq!(s.len(), 32);
        for (i, (_, note)) in s.iter().enumerate() {
            let (pc, oct) = DEFAULT_PRESET[i];
            assert_eq!(note.start(), i as f64 * 0.125);
            assert_eq!(note.pitch_class(), pc);
            assert_eq!(note.octave(), oct);
            assert_eq!(note.duration(), 0.25);
            assert_eq!(note.volume(), 1.0);
            assert_eq!(note.frequency(), note_to_freq(midi_number(pc, oct)));
        }
    }

    #[test]
    fn bad_preset_leaves_store_alone() {
        let mut s = three();
        let too_long = vec![(0u8, 4i8); 33];
        assert!(matches!(s.load_preset(&too_long), Err(PresetError::TooLong { len: 33, .. })));
        assert!(matches!(
            s.load_preset(&[(0, 4), (12, 4)]),
            Err(PresetError::InvalidEntry { index: 1, .. })
        ));
        assert_eq!(s.len(), 3);
    }
}
