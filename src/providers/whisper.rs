use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::TranscriptionConfig;
use crate::error::PipelineError;
use crate::providers::{Transcriber, Transcript, DEFAULT_CONFIDENCE};

/// OpenAI-compatible `/v1/audio/transcriptions` client
pub struct WhisperTranscriber {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    avg_logprob: Option<f64>,
}

impl WhisperTranscriber {
    /// Create a transcriber from configuration
    pub fn new(config: &TranscriptionConfig) -> Result<Self, PipelineError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                PipelineError::Config(::config::ConfigError::NotFound(
                    "transcription.api_key (or OPENAI_API_KEY)".to_string(),
                ))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        Ok(WhisperTranscriber {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        WhisperTranscriber {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn provider_name(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcript, PipelineError> {
        let file = Part::bytes(audio.to_vec()).file_name(filename.to_string());
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Transcription(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Transcription(format!("invalid response: {}", e)))?;
        debug!(
            "Transcribed {} into {} chars over {} segments",
            filename,
            body.text.len(),
            body.segments.len()
        );

        let confidence = confidence(&body.segments);
        Ok(Transcript {
            text: body.text.trim().to_string(),
            confidence,
        })
    }
}

/// Mean per-segment probability, or [`DEFAULT_CONFIDENCE`] without segments.
fn confidence(segments: &[Segment]) -> f64 {
    let probabilities: Vec<f64> = segments
        .iter()
        .filter_map(|s| s.avg_logprob)
        .map(f64::exp)
        .collect();

    if probabilities.is_empty() {
        return DEFAULT_CONFIDENCE;
    }
    let mean = probabilities.iter().sum::<f64>() / probabilities.len() as f64;
    mean.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn transcriber(base_url: String) -> WhisperTranscriber {
        WhisperTranscriber::with_base_url(
            "fake_api_key".to_string(),
            base_url,
            "whisper-1".to_string(),
        )
    }

    #[tokio::test]
    async fn test_transcribe() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/transcriptions")
            .match_header("authorization", "Bearer fake_api_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "text": " Tomato soup. Two tomatoes, one onion. ",
                    "segments": [{"avg_logprob": 0.0}, {"avg_logprob": 0.0}]
                }"#,
            )
            .create_async()
            .await;

        let result = transcriber(server.url())
            .transcribe(b"fake audio", "soup.m4a")
            .await
            .unwrap();

        assert_eq!(result.text, "Tomato soup. Two tomatoes, one onion.");
        assert!((result.confidence - 1.0).abs() < 1e-9);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_confidence_without_segments() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/transcriptions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "Pancakes"}"#)
            .create_async()
            .await;

        let result = transcriber(server.url())
            .transcribe(b"fake audio", "pancakes.mp3")
            .await
            .unwrap();

        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transcribe_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/transcriptions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Invalid API key"}"#)
            .create_async()
            .await;

        let err = transcriber(server.url())
            .transcribe(b"fake audio", "soup.m4a")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Transcription(ref msg) if msg.contains("401")));
        mock.assert_async().await;
    }

    #[test]
    fn test_confidence_mean() {
        let segments = vec![
            Segment {
                avg_logprob: Some(0.5f64.ln()),
            },
            Segment {
                avg_logprob: Some(1.0f64.ln()),
            },
            Segment { avg_logprob: None },
        ];
        assert!((confidence(&segments) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_provider_name() {
        let provider = transcriber("http://localhost".to_string());
        assert_eq!(provider.provider_name(), "whisper");
    }
}
