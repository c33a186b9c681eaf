// Error taxonomy for the submission pipeline.
//
// Every variant is terminal for the current invocation: the dispatcher
// prints it and exits with status 1. A BLOCKED verdict is *not* an error
// and never appears here (see `report::exit_code`).

use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of characters of a raw response body kept for diagnostics.
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum AliceError {
    /// Missing or invalid configuration (no API key, bad values).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The source directory does not exist or cannot be read.
    #[error("Invalid source path {}: {message}", .path.display())]
    Path {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Walking, reading, or compressing the source tree failed.
    #[error("Archive error: {message}")]
    Archive {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network failure, or a non-2xx status with a JSON error payload.
    #[error("Transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
        payload: Option<serde_json::Value>,
    },

    /// The server answered with something that is not the expected JSON.
    #[error("Unexpected response format (HTTP {status}): {message}")]
    Format {
        status: u16,
        message: String,
        preview: String,
    },
}

impl AliceError {
    pub fn path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Path {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn archive<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Archive {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short label used in the error banner.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Path { .. } => "PathError",
            Self::Archive { .. } => "ArchiveError",
            Self::Transport { .. } => "TransportError",
            Self::Format { .. } => "FormatError",
        }
    }

    /// All classified failures fail the gate.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Truncate `body` to at most [`PREVIEW_CHARS`] characters, marking the cut.
pub fn preview(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
