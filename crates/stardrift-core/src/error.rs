//! Save-file corruption errors.

use thiserror::Error;

/// A saved game could not be restored. Loading aborts; nothing is defaulted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorruptSaveError {
    #[error("saved game is corrupt: missing field `{0}`")]
    MissingField(String),
    #[error("saved game is corrupt: field `{field}` is not {expected}")]
    WrongType { field: String, expected: &'static str },
    #[error("saved game is corrupt: unknown ship type `{0}`")]
    UnknownShipType(String),
    #[error("saved game is corrupt: unknown AI command `{0}`")]
    UnknownAiCommand(String),
    #[error("saved game is corrupt: body index {0} is out of range")]
    BadBodyIndex(i64),
}
