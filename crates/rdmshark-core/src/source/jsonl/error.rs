use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonlSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid JSON: {message}")]
    Json { line: usize, message: String },
    #[error("line {line}: invalid hex payload: {message}")]
    Hex { line: usize, message: String },
    #[error("line {line}: invalid timestamp: {message}")]
    Timestamp { line: usize, message: String },
}
