use log::debug;

use crate::command::Command;
use crate::error::CommandError;
use crate::note::{Note, NoteId};
use crate::store::NoteStore;

/// Where the user is in the add / edit / delete flow.
///
/// The selection lives inside the mode, so leaving a mode always drops it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Idle,
    /// A fresh default note was just added and is open for editing.
    AddingNote(NoteId),
    /// Picking notes to delete.
    DeletingNotes(Option<NoteId>),
    /// Picking a note to edit, then editing it.
    EditingNote(Option<NoteId>),
}

impl InputMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle             => "idle",
            Self::AddingNote(_)    => "add note",
            Self::DeletingNotes(_) => "delete notes",
            Self::EditingNote(_)   => "edit note",
        }
    }

    pub fn selected(self) -> Option<NoteId> {
        match self {
            Self::Idle => None,
            Self::AddingNote(id) => Some(id),
            Self::DeletingNotes(sel) | Self::EditingNote(sel) => sel,
        }
    }

    /// True when the list of notes should be offered for picking.
    pub fn is_choosing(self) -> bool {
        matches!(self, Self::DeletingNotes(_) | Self::EditingNote(_))
    }

    pub fn is_adding(self) -> bool {
        matches!(self, Self::AddingNote(_))
    }

    /// True when field commands reach a note.
    pub fn is_editing(self) -> bool {
        matches!(self, Self::AddingNote(_) | Self::EditingNote(Some(_)))
    }
}

/// Result of a command the state machine accepted or passed over.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Applied; the text describes what happened.
    Done(String),
    /// Not meaningful in the current mode.  Nothing changed.
    Ignored,
}

#[derive(Debug, Default)]
pub struct InputModeController {
    mode: InputMode,
}

impl InputModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode { self.mode }

    pub fn selected(&self) -> Option<NoteId> { self.mode.selected() }

    /// Back to idle.  Edits are live so there is nothing to discard.
    pub fn escape(&mut self) {
        self.mode = InputMode::Idle;
    }

    /// Drop a selection whose note is no longer in `store`.
    pub fn revalidate(&mut self, store: &NoteStore) {
        let Some(id) = self.mode.selected() else { return };
        if store.by_id(id).is_some() {
            return;
        }
        self.mode = match self.mode {
            InputMode::AddingNote(_)    => InputMode::Idle,
            InputMode::DeletingNotes(_) => InputMode::DeletingNotes(None),
            InputMode::EditingNote(_)   => InputMode::EditingNote(None),
            InputMode::Idle             => InputMode::Idle,
        };
    }

    /// The selected note if it still exists; otherwise the selection is dropped.
    fn edit_target(&mut self, store: &NoteStore) -> Option<NoteId> {
        self.revalidate(store);
        self.mode.selected()
    }

    pub fn handle(&mut self, cmd: &Command, store: &mut NoteStore) -> Result<Outcome, CommandError> {
        let outcome = match (cmd, self.mode) {
            (Command::EnterAddMode, InputMode::Idle) => {
                let id = store.insert(Note::default());
                self.mode = InputMode::AddingNote(id);
                Outcome::Done(format!("Added note {}", store.len() - 1))
            }
            (Command::EnterEditMode, InputMode::Idle) => {
                self.mode = InputMode::EditingNote(None);
                Outcome::Done("Pick a note to edit".to_string())
            }
            (Command::EnterDeleteMode, InputMode::Idle) => {
                self.mode = InputMode::DeletingNotes(None);
                Outcome::Done("Pick notes to delete".to_string())
            }

            (Command::Escape, InputMode::Idle) => Outcome::Ignored,
            (Command::Escape, _) => {
                self.escape();
                Outcome::Done("Idle".to_string())
            }

            // Picking another note while adding moves on to editing it.
            (Command::SelectNote(index), mode) if mode.is_choosing() || mode.is_adding() => {
                let id = store
                    .id_at(*index)
                    .ok_or(CommandError::InvalidSelection { index: *index, len: store.len() })?;
                self.mode = match mode {
                    InputMode::DeletingNotes(_) => InputMode::DeletingNotes(Some(id)),
                    _                           => InputMode::EditingNote(Some(id)),
                };
                Outcome::Done(format!("Selected note {index}"))
            }

            (Command::SetField(field, raw), mode) if mode.is_editing() => {
                let Some(note) = self.edit_target(store).and_then(|id| store.by_id_mut(id)) else {
                    return Ok(Outcome::Ignored);
                };
                note.apply(*field, raw).map_err(|reason| CommandError::InvalidField {
                    field: *field,
                    value: raw.clone(),
                    reason,
                })?;
                Outcome::Done(format!("{} = {}", field, raw.trim()))
            }
            (Command::NudgeField(field, steps), mode) if mode.is_editing() => {
                let Some(note) = self.edit_target(store).and_then(|id| store.by_id_mut(id)) else {
                    return Ok(Outcome::Ignored);
                };
                note.nudge(*field, *steps).map_err(|reason| CommandError::InvalidField {
                    field: *field,
                    value: format!("{:+}", steps),
                    reason,
                })?;
                Outcome::Done(format!("{} = {}", field, note.get(*field)))
            }

            (Command::DeleteSelected, InputMode::DeletingNotes(Some(id)))
            | (Command::DeleteSelected, InputMode::EditingNote(Some(id)))
            | (Command::DeleteSelected, InputMode::AddingNote(id)) => {
                let index = store.index_of(id);
                store.remove_id(id);
                self.revalidate(store);
                match index {
                    Some(i) => Outcome::Done(format!("Deleted note {i}")),
                    None    => Outcome::Ignored,
                }
            }

            _ => Outcome::Ignored,
        };

        if outcome == Outcome::Ignored {
            debug!("ignored {:?} in mode {}", cmd, self.mode.name());
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{midi_number, note_to_freq, NoteField};

    fn store_of(n: usize) -> NoteStore {
        let mut s = NoteStore::new();
        for i in 0..n {
            s.add(Note::new(i as f64 * 0.5, i as u8));
        }
        s
    }

    fn set(field: NoteField, v: &str) -> Command {
        Command::SetField(field, v.to_string())
    }

    #[test]
    fn add_creates_and_selects_default_note() {
        let mut store = store_of(1);
        let mut ctl = InputModeController::new();
        let out = ctl.handle(&Command::EnterAddMode, &mut store).unwrap();
        assert!(matches!(out, Outcome::Done(_)));
        assert_eq!(store.len(), 2);
        assert_eq!(ctl.selected(), store.id_at(1));
        assert_eq!(store.get(1), Some(&Note::default()));

        ctl.handle(&set(NoteField::PitchClass, "A"), &mut store).unwrap();
        ctl.handle(&set(NoteField::Start, "1.5"), &mut store).unwrap();
        let n = store.get(1).unwrap();
        assert_eq!(n.frequency(), 440.0);
        assert_eq!(n.start(), 1.5);
        assert_eq!(store.get(0).unwrap().pitch_class(), 0);
    }

    #[test]
    fn mode_commands_only_from_idle() {
        let mut store = store_of(2);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        assert_eq!(ctl.handle(&Command::EnterAddMode, &mut store), Ok(Outcome::Ignored));
        assert_eq!(ctl.handle(&Command::EnterDeleteMode, &mut store), Ok(Outcome::Ignored));
        assert_eq!(store.len(), 2);
        assert_eq!(ctl.mode(), InputMode::EditingNote(None));
    }

    #[test]
    fn escape_clears_selection_and_keeps_edits() {
        let mut store = store_of(2);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        ctl.handle(&Command::SelectNote(1), &mut store).unwrap();
        ctl.handle(&set(NoteField::Octave, "6"), &mut store).unwrap();
        ctl.handle(&Command::Escape, &mut store).unwrap();
        assert_eq!(ctl.mode(), InputMode::Idle);
        assert_eq!(ctl.selected(), None);
        assert_eq!(store.get(1).unwrap().octave(), 6);
        assert_eq!(ctl.handle(&Command::Escape, &mut store), Ok(Outcome::Ignored));
    }

    #[test]
    fn select_out_of_bounds_is_rejected() {
        let mut store = store_of(3);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        ctl.handle(&Command::SelectNote(0), &mut store).unwrap();
        let prior = ctl.selected();
        assert_eq!(
            ctl.handle(&Command::SelectNote(3), &mut store),
            Err(CommandError::InvalidSelection { index: 3, len: 3 })
        );
        assert_eq!(ctl.selected(), prior);
    }

    #[test]
    fn reselect_leaves_previous_note_alone() {
        let mut store = store_of(3);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        ctl.handle(&Command::SelectNote(0), &mut store).unwrap();
        ctl.handle(&set(NoteField::Volume, "0.5"), &mut store).unwrap();
        let before = store.get(0).unwrap().clone();

        ctl.handle(&Command::SelectNote(2), &mut store).unwrap();
        ctl.handle(&set(NoteField::Volume, "0.2"), &mut store).unwrap();
        assert_eq!(store.get(0), Some(&before));
        assert_eq!(store.get(2).unwrap().volume(), 0.2);
    }

    #[test]
    fn field_edit_without_selection_is_noop() {
        let mut store = store_of(2);
        let mut ctl = InputModeController::new();
        assert_eq!(ctl.handle(&set(NoteField::Start, "1"), &mut store), Ok(Outcome::Ignored));
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        assert_eq!(ctl.handle(&set(NoteField::Start, "1"), &mut store), Ok(Outcome::Ignored));
        assert_eq!(ctl.handle(&Command::NudgeField(NoteField::Start, 1), &mut store), Ok(Outcome::Ignored));
        assert_eq!(store.get(0).unwrap().start(), 0.0);
        assert_eq!(store.get(1).unwrap().start(), 0.5);
    }

    #[test]
    fn invalid_field_value_keeps_note() {
        let mut store = store_of(1);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        ctl.handle(&Command::SelectNote(0), &mut store).unwrap();
        let before = store.get(0).unwrap().clone();
        let err = ctl.handle(&set(NoteField::Octave, "loud"), &mut store).unwrap_err();
        assert!(matches!(err, CommandError::InvalidField { field: NoteField::Octave, .. }));
        assert_eq!(store.get(0), Some(&before));
    }

    #[test]
    fn pitch_edits_retune_timing_edits_do_not() {
        let mut store = store_of(1);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        ctl.handle(&Command::SelectNote(0), &mut store).unwrap();

        ctl.handle(&set(NoteField::PitchClass, "7"), &mut store).unwrap();
        ctl.handle(&set(NoteField::Octave, "2"), &mut store).unwrap();
        let f = store.get(0).unwrap().frequency();
        assert_eq!(f, note_to_freq(midi_number(7, 2)));

        ctl.handle(&set(NoteField::Start, "3.875"), &mut store).unwrap();
        ctl.handle(&set(NoteField::Duration, "0.375"), &mut store).unwrap();
        ctl.handle(&set(NoteField::Volume, "0.1"), &mut store).unwrap();
        assert_eq!(store.get(0).unwrap().frequency(), f);
    }

    #[test]
    fn delete_flow() {
        let mut store = store_of(3);
        let mut ctl = InputModeController::new();
        let keep_last = store.id_at(2);

        ctl.handle(&Command::EnterDeleteMode, &mut store).unwrap();
        assert_eq!(ctl.handle(&Command::DeleteSelected, &mut store), Ok(Outcome::Ignored));
        ctl.handle(&Command::SelectNote(1), &mut store).unwrap();
        ctl.handle(&Command::DeleteSelected, &mut store).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(ctl.mode(), InputMode::DeletingNotes(None));
        assert_eq!(store.id_at(1), keep_last);
        assert_eq!(store.get(0).unwrap().pitch_class(), 0);
        assert_eq!(store.get(1).unwrap().pitch_class(), 2);
    }

    #[test]
    fn picking_another_note_while_adding() {
        let mut store = store_of(2);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterAddMode, &mut store).unwrap();
        ctl.handle(&Command::SelectNote(0), &mut store).unwrap();
        assert_eq!(ctl.mode(), InputMode::EditingNote(store.id_at(0)));

        ctl.handle(&set(NoteField::Octave, "2"), &mut store).unwrap();
        assert_eq!(store.get(0).unwrap().octave(), 2);
        assert_eq!(store.get(2), Some(&Note::default()));

        assert_eq!(
            ctl.handle(&Command::SelectNote(9), &mut store),
            Err(CommandError::InvalidSelection { index: 9, len: 3 })
        );
    }

    #[test]
    fn delete_while_adding_drops_the_new_note() {
        let mut store = store_of(2);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterAddMode, &mut store).unwrap();
        assert_eq!(store.len(), 3);
        let out = ctl.handle(&Command::DeleteSelected, &mut store).unwrap();
        assert_eq!(out, Outcome::Done("Deleted note 2".to_string()));
        assert_eq!(store.len(), 2);
        assert_eq!(ctl.mode(), InputMode::Idle);
    }

    #[test]
    fn selection_survives_removal_of_other_notes() {
        let mut store = store_of(3);
        let mut ctl = InputModeController::new();
        ctl.handle(&Command::EnterEditMode, &mut store).unwrap();
        ctl.handle(&Command::SelectNote(2), &mut store).unwrap();
        let id = ctl.selected().unwrap();

        store.remove(0).unwrap();
        ctl.revalidate(&store);
        assert_eq!(ctl.selected(), Some(id));
        ctl.handle(&set(NoteField::Volume, "0.3"), &mut store).unwrap();
        assert_eq!(store.get(1).unwrap().volume(), 0.3);

        store.remove(1).unwrap();
        ctl.revalidate(&store);
        assert_eq!(ctl.mode(), InputMode::EditingNote(None));
    }
}
