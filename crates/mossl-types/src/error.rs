/// Encoding and buffer-management errors.
///
/// The decoder functions fail fast with one of these; the buffer and cursor
/// types instead record the first failure internally and keep refusing work
/// until the failure is observed at a structural boundary (`finish`,
/// `detach`, `check`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("memory allocation failed")]
    MemAllocFail,
    #[error("invalid argument")]
    InvalidArg,
    #[error("malformed or non-canonical length encoding")]
    MalformedLength,
    #[error("declared length exceeds available input")]
    TruncatedInput,
    #[error("unexpected tag")]
    UnexpectedTag,
    #[error("value exceeds supported width")]
    ValueTooLarge,
    #[error("output buffer too small: need {need}, got {got}")]
    OutputTooSmall { need: usize, got: usize },
}
