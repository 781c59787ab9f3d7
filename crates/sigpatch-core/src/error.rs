use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Module not found in process {pid}: {name}")]
    ModuleNotFound { pid: u32, name: String },

    #[error("Pattern not found in {module}")]
    PatternNotFound { module: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Failed to enumerate {what}: {message}")]
    EnumerationFailed { what: &'static str, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Short write at address {address:#x}: wrote {written} of {expected} bytes")]
    PartialWrite {
        address: u64,
        expected: usize,
        written: usize,
    },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid patch bytes: {0}")]
    InvalidPatch(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error means an enumeration completed but nothing matched,
    /// as opposed to the enumeration itself failing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ProcessNotFound(_)
                | Error::ModuleNotFound { .. }
                | Error::PatternNotFound { .. }
        )
    }
}
