use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::PipelineEvent;
use crate::notify::{LogNotifier, Notifier};
use crate::providers::{AudioFetcher, HttpFetcher, Transcriber, WhisperTranscriber};
use crate::render::CardRenderer;
use crate::router::{EventRouter, LocalRouter};
use crate::stages::{card_stage, chat_intake_stage, transcription_stage, StageContext};
use crate::store::{ArtifactStore, FsArtifactStore};

/// Wires the three stages onto one [`LocalRouter`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    store: Option<Arc<dyn ArtifactStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    fetcher: Option<Arc<dyn AudioFetcher>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    renderer: Option<CardRenderer>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        PipelineBuilder {
            config,
            ..Self::default()
        }
    }

    /// Defaults to a [`FsArtifactStore`] under `storage.artifacts_dir`
    pub fn store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to [`LogNotifier`]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Defaults to [`HttpFetcher`]
    pub fn fetcher(mut self, fetcher: Arc<dyn AudioFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Defaults to [`WhisperTranscriber`]. Without one, and without an API
    /// key to build the default, the recorder stage is not started.
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Defaults to a renderer resolved from `card` configuration
    pub fn renderer(mut self, renderer: CardRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Start every stage on the current tokio runtime.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let config = self.config;
        let router = Arc::new(LocalRouter::new());
        let context = StageContext {
            router: router.clone(),
            store: self.store.unwrap_or_else(|| {
                Arc::new(FsArtifactStore::new(&config.storage.artifacts_dir)) as Arc<dyn ArtifactStore>
            }),
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(LogNotifier) as Arc<dyn Notifier>),
        };

        let mut handles = Vec::new();

        let transcriber = match self.transcriber {
            Some(transcriber) => Some(transcriber),
            None => match WhisperTranscriber::new(&config.transcription) {
                Ok(whisper) => Some(Arc::new(whisper) as Arc<dyn Transcriber>),
                Err(e) => {
                    warn!("Recorder stage disabled: {}", e);
                    None
                }
            },
        };
        if let Some(transcriber) = transcriber {
            let fetcher: Arc<dyn AudioFetcher> = match self.fetcher {
                Some(fetcher) => fetcher,
                None => Arc::new(HttpFetcher::new(Some(Duration::from_secs(
                    config.transcription.timeout,
                )))?),
            };
            let stage = transcription_stage(&config, context.clone(), fetcher, transcriber);
            handles.push(router.spawn(Arc::new(stage)));
        }

        let stage = chat_intake_stage(&config, context.clone());
        handles.push(router.spawn(Arc::new(stage)));

        let renderer = self
            .renderer
            .unwrap_or_else(|| CardRenderer::from_config(&config.card));
        let stage = card_stage(&config, context, renderer);
        handles.push(router.spawn(Arc::new(stage)));

        info!("Pipeline started with {} stage(s)", handles.len());
        Ok(Pipeline { router, handles })
    }
}

/// A running set of stages.
pub struct Pipeline {
    router: Arc<LocalRouter>,
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn router(&self) -> Arc<LocalRouter> {
        Arc::clone(&self.router)
    }

    pub async fn publish(&self, event: PipelineEvent) -> Result<(), PipelineError> {
        self.router.publish(event).await
    }

    pub fn subscribe(&self, subscriber_id: &str, names: &[&str]) -> UnboundedReceiver<PipelineEvent> {
        self.router.subscribe(subscriber_id, names)
    }

    pub fn stage_count(&self) -> usize {
        self.handles.len()
    }

    /// Stop every stage task.
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardLabels;
    use crate::events::{ChatMessage, TEXT_TRANSCRIBED};
    use crate::render::FontSet;
    use crate::store::MemoryArtifactStore;

    fn builder(config: PipelineConfig) -> PipelineBuilder {
        Pipeline::builder(config)
            .store(Arc::new(MemoryArtifactStore::new()))
            .renderer(CardRenderer::new(FontSet::built_in(), CardLabels::default()))
    }

    #[tokio::test]
    async fn test_all_stages_start_with_api_key() {
        let mut config = PipelineConfig::default();
        config.transcription.api_key = Some("test-key".to_string());
        let pipeline = builder(config).build().unwrap();
        assert_eq!(pipeline.stage_count(), 3);
        pipeline.shutdown();
    }

    #[tokio::test]
    async fn test_chat_message_forwarded() {
        let pipeline = builder(PipelineConfig::default()).build().unwrap();
        let mut transcribed = pipeline.subscribe("observer", &[TEXT_TRANSCRIBED]);

        let message = PipelineEvent::emit(
            "alice",
            &ChatMessage {
                content: "recipe: # Toast".to_string(),
            },
        )
        .unwrap();
        pipeline.publish(message).await.unwrap();

        let event = transcribed.recv().await.unwrap();
        assert_eq!(event.source_id, "chat-intake");
        pipeline.shutdown();
    }
}
