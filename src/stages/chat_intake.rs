use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::{ChatMessage, PipelineEvent, TextTranscribed, CHAT_MESSAGE};
use crate::notify::Notice;
use crate::stages::{EventHandler, Reaction, Stage, StageContext};

/// Confidence given to recipes typed into chat
const TYPED_CONFIDENCE: f64 = 1.0;

/// Picks recipe submissions out of ordinary chat traffic.
pub struct ChatIntakeHandler {
    stage_id: String,
    /// Lowercased
    keywords: Vec<String>,
    acknowledgement: String,
    processing_notice: String,
    submissions_channel: String,
}

impl ChatIntakeHandler {
    pub fn new(stage_id: impl Into<String>, config: &PipelineConfig) -> Self {
        ChatIntakeHandler {
            stage_id: stage_id.into(),
            keywords: config
                .chat
                .keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            acknowledgement: config.chat.acknowledgement.clone(),
            processing_notice: config.chat.processing_notice.clone(),
            submissions_channel: config.channels.submissions.clone(),
        }
    }

    /// Whether `text` contains any keyword, ignoring case.
    pub fn is_recipe(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[async_trait]
impl EventHandler for ChatIntakeHandler {
    async fn handle(&self, event: &PipelineEvent) -> Result<Reaction, PipelineError> {
        let message: ChatMessage = event.decode()?;
        if message.content.trim().is_empty() {
            debug!("Empty chat message from {}", event.source_id);
            return Ok(Reaction::no_op());
        }

        if !self.is_recipe(&message.content) {
            return Ok(Reaction::no_op()
                .notify(Notice::direct(&event.source_id, &self.acknowledgement)));
        }

        let recipe_id = format!("recipe_{}", event.id);
        info!("Recipe submission from {} as {}", event.source_id, recipe_id);

        let next = PipelineEvent::emit(
            &self.stage_id,
            &TextTranscribed {
                content: message.content,
                recipe_id,
                confidence: TYPED_CONFIDENCE,
            },
        )?;
        Ok(Reaction::published(next)
            .notify(Notice::direct(&event.source_id, &self.processing_notice))
            .notify(Notice::channel(
                &self.submissions_channel,
                "New recipe submitted, processing...",
            )))
    }
}

/// The chat intake stage: `chat.message` in, `text.transcribed` out.
pub fn chat_intake_stage(config: &PipelineConfig, context: StageContext) -> Stage {
    let id = &config.stages.chat_intake;
    Stage::builder(id, context)
        .on(CHAT_MESSAGE, Arc::new(ChatIntakeHandler::new(id, config)))
        .report_failures_to_sender(true)
        .skip_reports_to(config.stages.all())
        .build()
}
