//! In-process event router.
//!
//! Stages only rely on [`EventRouter::publish`]; [`LocalRouter`] delivers
//! events to subscribers over unbounded channels so a slow stage never holds
//! back delivery to the others.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::PipelineError;
use crate::events::PipelineEvent;
use crate::stages::Stage;

/// Publish side of the event bus
#[async_trait]
pub trait EventRouter: Send + Sync {
    async fn publish(&self, event: PipelineEvent) -> Result<(), PipelineError>;
}

struct Subscriber {
    id: String,
    names: Vec<String>,
    tx: UnboundedSender<PipelineEvent>,
}

#[derive(Default)]
pub struct LocalRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl LocalRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event published under one of `names`.
    pub fn subscribe(
        &self,
        subscriber_id: impl Into<String>,
        names: &[&str],
    ) -> UnboundedReceiver<PipelineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber = Subscriber {
            id: subscriber_id.into(),
            names: names.iter().map(|n| n.to_string()).collect(),
            tx,
        };
        debug!(
            "'{}' subscribed to {:?}",
            subscriber.id, subscriber.names
        );
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(subscriber);
        rx
    }

    /// Subscribe `stage` to its event names and run it on its own task.
    pub fn spawn(&self, stage: Arc<Stage>) -> JoinHandle<()> {
        let names = stage.event_names();
        let rx = self.subscribe(stage.id(), &names);
        tokio::spawn(stage.run(rx))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl EventRouter for LocalRouter {
    async fn publish(&self, event: PipelineEvent) -> Result<(), PipelineError> {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut delivered = 0;
        subscribers.retain(|subscriber| {
            if !subscriber.names.iter().any(|n| n == &event.name) {
                return true;
            }
            match subscriber.tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    warn!("Dropping closed subscriber '{}'", subscriber.id);
                    false
                }
            }
        });

        debug!(
            "Published '{}' from '{}' to {} subscriber(s)",
            event.name, event.source_id, delivered
        );
        Ok(())
    }
}
