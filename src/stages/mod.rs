//! Pipeline stages.
//!
//! A [`Stage`] owns a dispatch table from event name to [`EventHandler`].
//! Handlers only compute a [`Reaction`]; the stage performs its effects in a
//! fixed order: store the artifact, publish the outbound event, then send
//! notices. A failing handler produces no outbound event.

mod card;
mod chat_intake;
mod transcription;

pub use card::{card_stage, CardHandler};
pub use chat_intake::{chat_intake_stage, ChatIntakeHandler};
pub use transcription::{transcription_stage, TranscriptionHandler};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::PipelineError;
use crate::events::PipelineEvent;
use crate::model::CardArtifact;
use crate::notify::{Notice, Notifier};
use crate::router::EventRouter;
use crate::store::ArtifactStore;

/// Handles one kind of event for a stage.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &PipelineEvent) -> Result<Reaction, PipelineError>;
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Published(PipelineEvent),
    /// Store the artifact, then publish the event
    Stored(CardArtifact, PipelineEvent),
    NoOp,
}

/// What a handler wants done in response to an event.
#[derive(Debug, Clone)]
pub struct Reaction {
    pub outcome: Outcome,
    pub notices: Vec<Notice>,
}

impl Reaction {
    pub fn published(event: PipelineEvent) -> Self {
        Reaction {
            outcome: Outcome::Published(event),
            notices: Vec::new(),
        }
    }

    pub fn stored(artifact: CardArtifact, event: PipelineEvent) -> Self {
        Reaction {
            outcome: Outcome::Stored(artifact, event),
            notices: Vec::new(),
        }
    }

    pub fn no_op() -> Self {
        Reaction {
            outcome: Outcome::NoOp,
            notices: Vec::new(),
        }
    }

    pub fn notify(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

/// Result of dispatching one event to a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Own event, addressed elsewhere, or no handler registered
    Ignored,
    NoOp,
    Published { event: String },
    Stored { key: String, event: String },
}

/// Collaborators shared by every stage of a pipeline.
#[derive(Clone)]
pub struct StageContext {
    pub router: Arc<dyn EventRouter>,
    pub store: Arc<dyn ArtifactStore>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct Stage {
    id: String,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
    context: StageContext,
    report_failures: bool,
    unreported: HashSet<String>,
}

impl Stage {
    pub fn builder(id: impl Into<String>, context: StageContext) -> StageBuilder {
        StageBuilder {
            id: id.into(),
            handlers: HashMap::new(),
            context,
            report_failures: false,
            unreported: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Event names with a registered handler, sorted.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Route `event` to its handler and apply the resulting reaction.
    ///
    /// Failures are logged (and optionally reported to the sender) before
    /// being returned.
    pub async fn dispatch(&self, event: &PipelineEvent) -> Result<Dispatch, PipelineError> {
        if event.source_id == self.id {
            debug!("[{}] ignoring own event '{}'", self.id, event.name);
            return Ok(Dispatch::Ignored);
        }
        if let Some(destination) = &event.destination_id {
            if destination != &self.id {
                debug!(
                    "[{}] ignoring '{}' addressed to '{}'",
                    self.id, event.name, destination
                );
                return Ok(Dispatch::Ignored);
            }
        }
        let Some(handler) = self.handlers.get(&event.name) else {
            debug!("[{}] no handler for '{}'", self.id, event.name);
            return Ok(Dispatch::Ignored);
        };

        let result = match handler.handle(event).await {
            Ok(reaction) => self.apply(reaction).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.report_failure(event, e).await;
        }
        result
    }

    async fn apply(&self, reaction: Reaction) -> Result<Dispatch, PipelineError> {
        let dispatch = match reaction.outcome {
            Outcome::Published(next) => {
                let name = next.name.clone();
                self.publish(next).await?;
                Dispatch::Published { event: name }
            }
            Outcome::Stored(artifact, next) => {
                self.context
                    .store
                    .put(&artifact.key, artifact.bytes)
                    .await?;
                info!("[{}] stored {}", self.id, artifact.key);
                let name = next.name.clone();
                self.publish(next).await?;
                Dispatch::Stored {
                    key: artifact.key,
                    event: name,
                }
            }
            Outcome::NoOp => Dispatch::NoOp,
        };

        for notice in &reaction.notices {
            if let Err(e) = self.context.notifier.send(notice).await {
                warn!("[{}] failed to send notice: {}", self.id, e);
            }
        }
        Ok(dispatch)
    }

    async fn publish(&self, next: PipelineEvent) -> Result<(), PipelineError> {
        info!(
            "[{}] publishing '{}' for recipe {}",
            self.id,
            next.name,
            next.recipe_id().unwrap_or("-")
        );
        self.context.router.publish(next).await
    }

    async fn report_failure(&self, event: &PipelineEvent, err: &PipelineError) {
        error!(
            "[{}] {} while handling '{}' (recipe {}): {}",
            self.id,
            err.kind(),
            event.name,
            event.recipe_id().unwrap_or("-"),
            err
        );
        if !self.report_failures || self.unreported.contains(&event.source_id) {
            return;
        }
        if let Err(e) = self
            .context
            .notifier
            .send_direct(&event.source_id, &err.user_message())
            .await
        {
            warn!("[{}] failed to report failure to sender: {}", self.id, e);
        }
    }

    /// Dispatch events from `events` one at a time until the channel closes.
    pub async fn run(self: Arc<Self>, mut events: UnboundedReceiver<PipelineEvent>) {
        info!("[{}] listening for {:?}", self.id, self.event_names());
        while let Some(event) = events.recv().await {
            if let Ok(dispatch) = self.dispatch(&event).await {
                debug!("[{}] '{}' -> {:?}", self.id, event.name, dispatch);
            }
        }
        info!("[{}] stopped", self.id);
    }
}

pub struct StageBuilder {
    id: String,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
    context: StageContext,
    report_failures: bool,
    unreported: HashSet<String>,
}

impl StageBuilder {
    pub fn on(mut self, name: &str, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(name.to_string(), handler);
        self
    }

    /// Send a short failure message back to the sender of a failing event
    pub fn report_failures_to_sender(mut self, enabled: bool) -> Self {
        self.report_failures = enabled;
        self
    }

    /// Senders never addressed with a failure message, typically the other
    /// stages of the pipeline
    pub fn skip_reports_to<I, S>(mut self, senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unreported.extend(senders.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Stage {
        Stage {
            id: self.id,
            handlers: self.handlers,
            context: self.context,
            report_failures: self.report_failures,
            unreported: self.unreported,
        }
    }
}
