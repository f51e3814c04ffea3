use std::fmt;

use thiserror::Error;

/// Errors that can occur while a stage processes an event
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The audio/source resource could not be retrieved
    #[error("Failed to fetch {url}: {reason}")]
    UpstreamFetch { url: String, reason: String },

    /// The transcription collaborator raised an error
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Producing the card image failed
    #[error("Render failed: {0}")]
    Render(String),

    /// Writing an artifact to the store failed
    #[error("Failed to store artifact {key}: {reason}")]
    Storage { key: String, reason: String },

    /// Event payload did not match the schema of its event name
    #[error("Invalid payload for event '{event}': {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// A channel or direct notification could not be delivered
    #[error("Notification failed: {0}")]
    Notify(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Coarse classification of a [`PipelineError`], reported as the failure
/// kind of a stage outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UpstreamFetch,
    Transcription,
    Render,
    Storage,
    Payload,
    Notify,
    Config,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::UpstreamFetch { .. } => ErrorKind::UpstreamFetch,
            PipelineError::Transcription(_) => ErrorKind::Transcription,
            PipelineError::Render(_) => ErrorKind::Render,
            PipelineError::Storage { .. } => ErrorKind::Storage,
            PipelineError::Payload { .. } => ErrorKind::Payload,
            PipelineError::Notify(_) => ErrorKind::Notify,
            PipelineError::Config(_) => ErrorKind::Config,
        }
    }

    /// Short message suitable for sending back to the person who triggered
    /// the failing event.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::UpstreamFetch => "Could not download your recording.".to_string(),
            ErrorKind::Transcription => "Could not transcribe your recording.".to_string(),
            ErrorKind::Payload => "Your request was not in a format I understand.".to_string(),
            _ => "Something went wrong while processing your recipe.".to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UpstreamFetch => "UpstreamFetchError",
            ErrorKind::Transcription => "TranscriptionError",
            ErrorKind::Render => "RenderError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::Payload => "PayloadError",
            ErrorKind::Notify => "NotifyError",
            ErrorKind::Config => "ConfigError",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = PipelineError::UpstreamFetch {
            url: "http://example.com/a.mp3".to_string(),
            reason: "status 404".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::UpstreamFetch);
        assert_eq!(err.kind().to_string(), "UpstreamFetchError");
        assert!(err.to_string().contains("status 404"));
    }

    #[test]
    fn test_storage_error_display() {
        let err = PipelineError::Storage {
            key: "recipe_card_1.png".to_string(),
            reason: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to store artifact recipe_card_1.png: disk full"
        );
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
