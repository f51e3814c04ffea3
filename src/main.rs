use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};
use recipe_cards::events::CARD_GENERATED;
use recipe_cards::notify::{LogNotifier, Notifier};
use recipe_cards::store::FsArtifactStore;
use recipe_cards::{
    CardGenerated, MdProcessed, Pipeline, PipelineConfig, PipelineError, PipelineEvent,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

const CLI_SOURCE: &str = "cli";

/// Logs notices and hands direct messages for the CLI back to `main`.
struct CliNotifier {
    replies: UnboundedSender<String>,
}

#[async_trait]
impl Notifier for CliNotifier {
    async fn send_channel_message(&self, channel: &str, text: &str) -> Result<(), PipelineError> {
        LogNotifier.send_channel_message(channel, text).await
    }

    async fn send_direct(&self, destination_id: &str, text: &str) -> Result<(), PipelineError> {
        if destination_id == CLI_SOURCE {
            return self
                .replies
                .send(text.to_string())
                .map_err(|e| PipelineError::Notify(e.to_string()));
        }
        LogNotifier.send_direct(destination_id, text).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .ok_or("Usage: recipe-cards <recipe.md> [recipe-id]")?;
    let recipe_id = match args.get(2) {
        Some(id) => id.clone(),
        None => Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("default")
            .to_string(),
    };

    let config = PipelineConfig::load()?;
    let markdown = tokio::fs::read_to_string(path).await?;
    if markdown.trim().is_empty() {
        return Err(format!("{} is empty", path).into());
    }
    let store = Arc::new(FsArtifactStore::new(&config.storage.artifacts_dir));
    info!("Writing cards to {}", store.root().display());

    let (replies, mut failures) = unbounded_channel();
    let pipeline = Pipeline::builder(config)
        .store(store)
        .notifier(Arc::new(CliNotifier { replies }))
        .build()?;
    let mut completed = pipeline.subscribe(CLI_SOURCE, &[CARD_GENERATED]);

    let event = PipelineEvent::emit(
        CLI_SOURCE,
        &MdProcessed {
            content: markdown,
            recipe_id,
        },
    )?;
    pipeline.publish(event).await?;

    let outcome = tokio::time::timeout(Duration::from_secs(60), async {
        tokio::select! {
            Some(event) = completed.recv() => Ok(event),
            Some(reason) = failures.recv() => Err(reason),
            else => Err("pipeline stopped".to_string()),
        }
    })
    .await;
    pipeline.shutdown();

    match outcome {
        Ok(Ok(event)) => {
            let card: CardGenerated = event.decode()?;
            println!("{}", card.card_url);
            Ok(())
        }
        Ok(Err(reason)) => {
            error!("Card stage failed: {}", reason);
            Err(reason.into())
        }
        Err(_) => {
            error!("No card was generated");
            Err("No card was generated, see the log for details".into())
        }
    }
}
