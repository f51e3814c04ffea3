use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::{
    CardGenerated, MdProcessed, PipelineEvent, TextTranscribed, MD_PROCESSED, TEXT,
    TEXT_TRANSCRIBED,
};
use crate::extractors::extract;
use crate::model::{card_download_url, CardArtifact};
use crate::notify::Notice;
use crate::render::CardRenderer;
use crate::stages::{EventHandler, Reaction, Stage, StageContext};

/// Renders recipe text into a stored card.
pub struct CardHandler {
    stage_id: String,
    renderer: CardRenderer,
    base_url: String,
    cards_channel: String,
}

impl CardHandler {
    pub fn new(
        stage_id: impl Into<String>,
        renderer: CardRenderer,
        base_url: impl Into<String>,
        cards_channel: impl Into<String>,
    ) -> Self {
        CardHandler {
            stage_id: stage_id.into(),
            renderer,
            base_url: base_url.into(),
            cards_channel: cards_channel.into(),
        }
    }
}

#[async_trait]
impl EventHandler for CardHandler {
    async fn handle(&self, event: &PipelineEvent) -> Result<Reaction, PipelineError> {
        let (content, recipe_id) = if event.name == MD_PROCESSED {
            let md: MdProcessed = event.decode()?;
            (md.content, md.recipe_id)
        } else {
            let text: TextTranscribed = event.decode()?;
            (text.content, text.recipe_id)
        };

        if content.trim().is_empty() {
            warn!("No content to render for recipe {}", recipe_id);
            return Ok(Reaction::no_op());
        }

        // Rasterizing is CPU bound
        let renderer = self.renderer.clone();
        let base_url = self.base_url.clone();
        let id = recipe_id.clone();
        let png = tokio::task::spawn_blocking(move || {
            let summary = extract(&content);
            info!(
                "Rendering '{}' with {} ingredients",
                summary.title,
                summary.ingredients.len()
            );
            renderer.render(&summary, &id, &base_url)
        })
        .await
        .map_err(|e| PipelineError::Render(format!("render task failed: {}", e)))??;

        let card_url = card_download_url(&self.base_url, &recipe_id);
        let notice = Notice::channel(
            &self.cards_channel,
            format!("Recipe card ready! Download your card with QR code: {}", card_url),
        );
        let artifact = CardArtifact::new(&recipe_id, png);
        let next = PipelineEvent::emit(
            &self.stage_id,
            &CardGenerated {
                recipe_id,
                card_url,
            },
        )?;
        Ok(Reaction::stored(artifact, next).notify(notice))
    }
}

/// The card maker stage: recipe text in, stored card and
/// `card.generated` out.
pub fn card_stage(config: &PipelineConfig, context: StageContext, renderer: CardRenderer) -> Stage {
    let id = &config.stages.card_maker;
    let handler: Arc<CardHandler> = Arc::new(CardHandler::new(
        id,
        renderer,
        config.server.base_url(),
        &config.channels.cards,
    ));
    Stage::builder(id, context)
        .on(TEXT_TRANSCRIBED, handler.clone())
        .on(TEXT, handler.clone())
        .on(MD_PROCESSED, handler)
        .report_failures_to_sender(true)
        .skip_reports_to(config.stages.all())
        .build()
}
