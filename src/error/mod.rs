use crate::phase::Phase;
use std::fmt::Display;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Boxed source error carried by every [`TaskError`] variant
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for a Spindle task run
///
/// End of input is never represented here: sources signal it with `Ok(None)`.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        phase: Option<Phase>,
        handler: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Read error: {message}")]
    Read {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Write error: {message}")]
    Write {
        code: u16,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("[E{code:04}] Handler error: {message}")]
    Handler {
        code: u16,
        message: String,
        phase: Phase,
        handler: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl TaskError {
    /// Create a validation error with default code
    pub fn validation(message: impl Into<String>) -> Self {
        Self::validation_with_code(ErrorCode::VALIDATION_GENERIC, message, None)
    }

    /// Create a validation error with specific code and field
    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            phase: None,
            handler: None,
            source: None,
        }
    }

    /// The handler has no capability for the requested phase
    pub fn missing_capability(phase: Phase, handler: impl Into<String>) -> Self {
        let handler = handler.into();
        Self::Config {
            code: ErrorCode::CONFIG_MISSING_CAPABILITY,
            message: format!("no {} capability on handler '{}'", phase, handler),
            phase: Some(phase),
            handler: Some(handler),
            source: None,
        }
    }

    /// Create a read error with default code
    pub fn read(message: impl Into<String>) -> Self {
        Self::read_with_code(ErrorCode::READ_GENERIC, message)
    }

    /// Create a read error with specific code
    pub fn read_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Read {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a write error with default code
    pub fn write(message: impl Into<String>) -> Self {
        Self::write_with_code(ErrorCode::WRITE_GENERIC, message)
    }

    /// Create a write error with specific code
    pub fn write_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Write {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// A handler capability returned an error
    pub fn handler(phase: Phase, handler: impl Into<String>, source: anyhow::Error) -> Self {
        let handler = handler.into();
        Self::Handler {
            code: ErrorCode::HANDLER_GENERIC,
            message: format!("{} failed in handler '{}': {}", phase, handler, source),
            phase,
            handler,
            source: Some(source.into()),
        }
    }

    /// Add a source error to this error
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Validation { source: src, .. }
            | Self::Config { source: src, .. }
            | Self::Read { source: src, .. }
            | Self::Write { source: src, .. }
            | Self::Handler { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Validation { message, .. }
            | Self::Config { message, .. }
            | Self::Read { message, .. }
            | Self::Write { message, .. }
            | Self::Handler { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Validation { code, .. }
            | Self::Config { code, .. }
            | Self::Read { code, .. }
            | Self::Write { code, .. }
            | Self::Handler { code, .. } => *code,
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Read { .. } => 3,
            Self::Write { .. } => 4,
            Self::Handler { .. } => 5,
            Self::Validation { .. } => 8,
        }
    }

    /// True for faults reported by the pair source
    pub fn is_read_fault(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// True for faults reported by the output sink
    pub fn is_write_fault(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}
