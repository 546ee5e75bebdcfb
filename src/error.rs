//! Error types for armctl
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in armctl
#[derive(Debug, Error)]
pub enum ArmctlError {
    /// Configuration mismatch or missing setting - fatal, never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Robot communication failure - fatal, aborts the run
    #[error("Robot error: {0}")]
    Robot(String),

    /// Home controller never settled within its iteration budget
    #[error("Home convergence timed out after {0} iterations")]
    ConvergenceTimeout(u32),

    /// Generative-AI backend error (planner or judge call)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Recording/dataset sink error
    #[error("Recording error: {0}")]
    Recording(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for armctl operations
pub type Result<T> = std::result::Result<T, ArmctlError>;
