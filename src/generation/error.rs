use crate::networking::NetworkError;
use std::fmt;

#[derive(Debug)]
pub enum GenerationError {
    /// The request never produced a usable response (DNS, TCP, TLS, timeout,
    /// malformed wire data).
    Transport(NetworkError),
    /// The service answered with a non-success status.
    Rejected { code: u16, text: String },
    /// The service answered 2xx but the body was not the expected shape.
    MalformedResponse(String),
    /// The in-flight task ended without delivering an outcome.
    Interrupted,
}

impl std::error::Error for GenerationError {}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Transport(e) => write!(f, "Generation transport failed: {}", e),
            GenerationError::Rejected { code, text } => {
                write!(f, "Generation rejected by service: {} {}", code, text)
            }
            GenerationError::MalformedResponse(e) => {
                write!(f, "Malformed generation response: {}", e)
            }
            GenerationError::Interrupted => write!(f, "Generation ended without a result"),
        }
    }
}

impl From<NetworkError> for GenerationError {
    fn from(e: NetworkError) -> Self {
        GenerationError::Transport(e)
    }
}
