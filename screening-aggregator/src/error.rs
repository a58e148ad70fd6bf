//! Error types for the screening aggregator

use thiserror::Error;

/// Screening aggregator error
#[derive(Error, Debug)]
pub enum Error {
    /// A single screening source failed
    #[error("Source {source_label} failed: {message}")]
    Source {
        /// Label of the failing source
        source_label: String,
        /// Failure description
        message: String,
    },

    /// A single screening source exceeded its time budget
    #[error("Source timed out: {0}")]
    SourceTimeout(String),

    /// Every enabled source failed, no result can be produced
    #[error("All screening sources failed: {}", failed.join(", "))]
    AllSourcesFailed {
        /// Labels of the sources that failed
        failed: Vec<String>,
    },

    /// No source is enabled for screening
    #[error("No screening sources enabled")]
    NoSourcesEnabled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Caller cancelled the screening
    #[error("Screening cancelled")]
    Cancelled,

    /// Caller deadline elapsed before any source answered
    #[error("Screening deadline exceeded")]
    DeadlineExceeded,

    /// One or more sources reported unhealthy
    #[error("Unhealthy sources [{}]: {}", sources.join(", "), details.join("; "))]
    Unhealthy {
        /// Labels of the unhealthy sources
        sources: Vec<String>,
        /// Per-source failure descriptions
        details: Vec<String>,
    },

    /// Invalid screening input
    #[error("Invalid screening input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sanctions list parse error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file parse error
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Build a source failure
    pub fn source_failed(source_label: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Source {
            source_label: source_label.into(),
            message: message.into(),
        }
    }

    /// Whether the caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::SourceTimeout(_) | Error::DeadlineExceeded | Error::AllSourcesFailed { .. }
        )
    }

    /// Whether a hosting service should report this as a 5xx-class condition
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Error::AllSourcesFailed { .. }
                | Error::NoSourcesEnabled
                | Error::InvalidConfig(_)
                | Error::Unhealthy { .. }
                | Error::Metrics(_)
        )
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
