use thiserror::Error;

/// Errors raised by the scene graph, the composite-structure builders and the
/// step driver.
///
/// Construction-time variants (`MissingOption`, `InvalidOption`) abort a whole
/// diagram build. `NotConnectable` is a capability fault: the caller asked a
/// shape for something its variant cannot provide.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),

    #[error("invalid option `{field}`: {reason}")]
    InvalidOption { field: &'static str, reason: String },

    #[error("{kind} handle #{index} belongs to a cleared scene")]
    StaleHandle { kind: &'static str, index: usize },

    #[error("{kind} handle #{index} does not exist")]
    UnknownHandle { kind: &'static str, index: usize },

    #[error("node #{0} cannot anchor connectors")]
    NotConnectable(usize),

    #[error("node #{0} is not a pointer block")]
    NotAPointer(usize),

    #[error("index {index} is out of range for a structure of {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("structure #{index} is a {actual}, expected a {expected}")]
    WrongStructure {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{kind} has no `{slot}` pointer")]
    NoSuchPointer { kind: &'static str, slot: String },

    #[error("invalid scene file: {0}")]
    SceneFile(String),
}
