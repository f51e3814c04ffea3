mod request;
mod retry;
mod whisper;

pub use request::HttpFetcher;
pub use retry::RetryPolicy;
pub use whisper::WhisperTranscriber;

use async_trait::async_trait;

use crate::error::PipelineError;

/// Confidence reported when a transcription service gives no signal
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// Text recognized from a recording
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Always within [0, 1]
    pub confidence: f64,
}

/// Speech-to-text service
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Get the provider name (e.g., "whisper")
    fn provider_name(&self) -> &str;

    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcript, PipelineError>;
}

/// Downloads the raw bytes behind a URL
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}
