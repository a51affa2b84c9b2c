use crate::note::NoteField;

/// One discrete UI action.  The front end turns key presses into these; the
/// app consumes them at the start of the next tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    // ── Transport ─────────────────────────────────────────────────────────
    Pause,
    Resume,
    TogglePlay,
    Reset,
    Clear,
    LoadPreset,
    TempoUp,
    TempoDown,
    VolumeUp,
    VolumeDown,

    // ── Note editing ──────────────────────────────────────────────────────
    EnterAddMode,
    EnterEditMode,
    EnterDeleteMode,
    Escape,
    SelectNote(usize),
    /// Raw user text; parsed and validated against the field.
    SetField(NoteField, String),
    NudgeField(NoteField, i32),
    DeleteSelected,
}

impl Command {
    /// Commands handled by the input-mode state machine rather than the transport.
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::EnterAddMode
                | Self::EnterEditMode
                | Self::EnterDeleteMode
                | Self::Escape
                | Self::SelectNote(_)
                | Self::SetField(..)
                | Self::NudgeField(..)
                | Self::DeleteSelected
        )
    }
}
