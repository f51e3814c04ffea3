use std::sync::Mutex;

use async_trait::async_trait;
use log::info;

use crate::error::PipelineError;

/// A message for people following the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Channel { channel: String, text: String },
    Direct { destination_id: String, text: String },
}

impl Notice {
    pub fn channel(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Notice::Channel {
            channel: channel.into(),
            text: text.into(),
        }
    }

    pub fn direct(destination_id: impl Into<String>, text: impl Into<String>) -> Self {
        Notice::Direct {
            destination_id: destination_id.into(),
            text: text.into(),
        }
    }
}

/// Messaging channel the pipeline reports to
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_channel_message(&self, channel: &str, text: &str) -> Result<(), PipelineError>;

    async fn send_direct(&self, destination_id: &str, text: &str) -> Result<(), PipelineError>;

    async fn send(&self, notice: &Notice) -> Result<(), PipelineError> {
        match notice {
            Notice::Channel { channel, text } => self.send_channel_message(channel, text).await,
            Notice::Direct {
                destination_id,
                text,
            } => self.send_direct(destination_id, text).await,
        }
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_channel_message(&self, channel: &str, text: &str) -> Result<(), PipelineError> {
        info!("#{} {}", channel, text);
        Ok(())
    }

    async fn send_direct(&self, destination_id: &str, text: &str) -> Result<(), PipelineError> {
        info!("@{} {}", destination_id, text);
        Ok(())
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notice>>,
    unreachable: bool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails with [`PipelineError::Notify`].
    pub fn unreachable() -> Self {
        MemoryNotifier {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notice> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, notice: Notice) -> Result<(), PipelineError> {
        if self.unreachable {
            return Err(PipelineError::Notify(format!("cannot deliver {:?}", notice)));
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice);
        Ok(())
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send_channel_message(&self, channel: &str, text: &str) -> Result<(), PipelineError> {
        self.record(Notice::channel(channel, text))
    }

    async fn send_direct(&self, destination_id: &str, text: &str) -> Result<(), PipelineError> {
        self.record(Notice::direct(destination_id, text))
    }
}
