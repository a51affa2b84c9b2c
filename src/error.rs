use thiserror::Error;

use crate::note::NoteField;

/// Why a raw field value was refused.  The note keeps its prior value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("not a number")]
    NotANumber,

    #[error("not a whole number")]
    NotAnInteger,

    #[error("unknown pitch name")]
    UnknownPitch,

    #[error("must be within {min}..{max}")]
    OutOfRange { min: f64, max: f64 },
}

/// Rejected UI commands.  None of these are fatal; the frame loop keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no note at index {index} (have {len})")]
    InvalidSelection { index: usize, len: usize },

    #[error("invalid {field} value {value:?}: {reason}")]
    InvalidField {
        field:  NoteField,
        value:  String,
        #[source]
        reason: FieldError,
    },

    #[error(transparent)]
    Preset(#[from] PresetError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PresetError {
    #[error("preset has {len} entries, at most {max} fit on the dial")]
    TooLong { len: usize, max: usize },

    #[error("preset entry {index}: {reason}")]
    InvalidEntry {
        index:  usize,
        #[source]
        reason: FieldError,
    },
}
