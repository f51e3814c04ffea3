//! Event-driven recipe pipeline.
//!
//! Recordings, chat messages and markdown documents flow through a small set
//! of stages connected by an event router. The final stage condenses the
//! recipe into a [`RecipeSummary`] and renders it as a 600x800 PNG card with
//! a QR code linking back to the full recipe.
//!
//! ```no_run
//! # async fn run() -> Result<(), recipe_cards::PipelineError> {
//! use recipe_cards::{MdProcessed, Pipeline, PipelineConfig, PipelineEvent};
//!
//! let pipeline = Pipeline::builder(PipelineConfig::load()?).build()?;
//! let event = PipelineEvent::emit(
//!     "cli",
//!     &MdProcessed {
//!         content: "# Pancakes\n## Ingredients\n- flour".to_string(),
//!         recipe_id: "pancakes".to_string(),
//!     },
//! )?;
//! pipeline.publish(event).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod extractors;
pub mod model;
pub mod notify;
pub mod providers;
pub mod qr;
pub mod render;
pub mod router;
pub mod stages;
pub mod store;

pub use builder::{Pipeline, PipelineBuilder};
pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError};
pub use events::{
    AudioNew, CardGenerated, ChatMessage, EventPayload, MdProcessed, PipelineEvent,
    TextTranscribed,
};
pub use model::{CardArtifact, RecipeSummary};
pub use render::CardRenderer;

/// Condense a markdown recipe into the fields shown on a card.
pub fn extract_summary(markdown: &str) -> RecipeSummary {
    extractors::extract(markdown)
}

/// Render `markdown` as a PNG card using the default card configuration.
pub fn render_card(markdown: &str, recipe_id: &str, base_url: &str) -> Result<Vec<u8>, PipelineError> {
    let renderer = CardRenderer::from_config(&config::CardConfig::default());
    renderer.render(&extract_summary(markdown), recipe_id, base_url)
}
