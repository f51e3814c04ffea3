use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::{AudioNew, PipelineEvent, TextTranscribed, AUDIO_NEW};
use crate::notify::Notice;
use crate::providers::{AudioFetcher, RetryPolicy, Transcriber};
use crate::stages::{EventHandler, Reaction, Stage, StageContext};

/// Turns uploaded recordings into `text.transcribed` events.
pub struct TranscriptionHandler {
    stage_id: String,
    fetcher: Arc<dyn AudioFetcher>,
    transcriber: Arc<dyn Transcriber>,
    retry: RetryPolicy,
    uploads_channel: String,
}

impl TranscriptionHandler {
    pub fn new(
        stage_id: impl Into<String>,
        fetcher: Arc<dyn AudioFetcher>,
        transcriber: Arc<dyn Transcriber>,
        retry: RetryPolicy,
        uploads_channel: impl Into<String>,
    ) -> Self {
        TranscriptionHandler {
            stage_id: stage_id.into(),
            fetcher,
            transcriber,
            retry,
            uploads_channel: uploads_channel.into(),
        }
    }
}

#[async_trait]
impl EventHandler for TranscriptionHandler {
    async fn handle(&self, event: &PipelineEvent) -> Result<Reaction, PipelineError> {
        let upload: AudioNew = event.decode()?;
        info!(
            "Transcribing {} for recipe {}",
            upload.filename, upload.recipe_id
        );

        let audio = self.fetcher.fetch(&upload.audio_url).await?;
        let transcript = self
            .retry
            .run(self.transcriber.provider_name(), || {
                self.transcriber.transcribe(&audio, &upload.filename)
            })
            .await?;

        let notice = Notice::channel(
            &self.uploads_channel,
            format!("New recipe transcribed: {}", transcript.text),
        );
        let next = PipelineEvent::emit(
            &self.stage_id,
            &TextTranscribed {
                content: transcript.text,
                recipe_id: upload.recipe_id,
                confidence: transcript.confidence,
            },
        )?;
        Ok(Reaction::published(next).notify(notice))
    }
}

/// The recorder stage: `audio.new` in, `text.transcribed` out.
pub fn transcription_stage(
    config: &PipelineConfig,
    context: StageContext,
    fetcher: Arc<dyn AudioFetcher>,
    transcriber: Arc<dyn Transcriber>,
) -> Stage {
    let handler = TranscriptionHandler::new(
        &config.stages.recorder,
        fetcher,
        transcriber,
        RetryPolicy::from_config(&config.transcription),
        &config.channels.uploads,
    );
    Stage::builder(&config.stages.recorder, context)
        .on(AUDIO_NEW, Arc::new(handler))
        .report_failures_to_sender(true)
        .skip_reports_to(config.stages.all())
        .build()
}
