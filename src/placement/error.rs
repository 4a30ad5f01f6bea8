use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("anchor {index} is malformed: {reason}")]
    InvalidAnchor { index: usize, reason: String },
    #[error("placement returned {actual} labels for {expected} anchors")]
    ResultMismatch { expected: usize, actual: usize },
    #[error("invalid placement config: {0}")]
    InvalidConfig(String),
    #[error("placement was cancelled")]
    Cancelled,
    #[error("placement worker failed: {0}")]
    Worker(String),
}
