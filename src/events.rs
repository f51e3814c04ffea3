//! Named pipeline events and the typed payload carried by each name.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::PipelineError;

pub const AUDIO_NEW: &str = "audio.new";
pub const TEXT_TRANSCRIBED: &str = "text.transcribed";
/// Older name for [`TEXT_TRANSCRIBED`], still accepted
pub const TEXT: &str = "text";
pub const MD_PROCESSED: &str = "md.processed";
pub const CARD_GENERATED: &str = "card.generated";
pub const CHAT_MESSAGE: &str = "chat.message";

pub type Payload = Map<String, Value>;

/// An event travelling between stages. Never modified after it is handed
/// to the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub id: String,
    pub name: String,
    pub source_id: String,
    pub destination_id: Option<String>,
    pub payload: Payload,
}

impl PipelineEvent {
    pub fn new(name: impl Into<String>, source_id: impl Into<String>, payload: Payload) -> Self {
        PipelineEvent {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            source_id: source_id.into(),
            destination_id: None,
            payload,
        }
    }

    /// Build the event named after `P` with `payload` serialized into it.
    pub fn emit<P: EventPayload>(
        source_id: impl Into<String>,
        payload: &P,
    ) -> Result<Self, PipelineError> {
        let map: Payload = serde_json::to_value(payload)
            .and_then(serde_json::from_value)
            .map_err(|source| PipelineError::Payload {
                event: P::NAME.to_string(),
                source,
            })?;
        Ok(Self::new(P::NAME, source_id, map))
    }

    pub fn with_destination(mut self, destination_id: impl Into<String>) -> Self {
        self.destination_id = Some(destination_id.into());
        self
    }

    /// Decode the payload into `P`, rejecting payloads that do not match
    /// its schema.
    pub fn decode<P: EventPayload>(&self) -> Result<P, PipelineError> {
        let to_error = |source| PipelineError::Payload {
            event: self.name.clone(),
            source,
        };
        let payload: P = serde_json::from_value(Value::Object(self.payload.clone()))
            .map_err(to_error)?;
        payload.validate().map_err(to_error)?;
        Ok(payload)
    }

    /// `recipe_id` field of the payload, if present, for log context.
    pub fn recipe_id(&self) -> Option<&str> {
        self.payload.get("recipe_id").and_then(Value::as_str)
    }
}

/// Schema of the payload carried under one event name.
pub trait EventPayload: Serialize + DeserializeOwned {
    const NAME: &'static str;

    fn validate(&self) -> Result<(), serde_json::Error> {
        Ok(())
    }
}

/// A recording was uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioNew {
    pub audio_url: String,
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default = "default_recipe_id")]
    pub recipe_id: String,
}

impl EventPayload for AudioNew {
    const NAME: &'static str = AUDIO_NEW;
}

/// Free-form recipe text, either transcribed or typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTranscribed {
    pub content: String,
    pub recipe_id: String,
    pub confidence: f64,
}

impl EventPayload for TextTranscribed {
    const NAME: &'static str = TEXT_TRANSCRIBED;

    fn validate(&self) -> Result<(), serde_json::Error> {
        if (0.0..=1.0).contains(&self.confidence) {
            Ok(())
        } else {
            Err(serde_json::Error::custom(format!(
                "confidence {} is outside [0, 1]",
                self.confidence
            )))
        }
    }
}

/// Recipe already normalized to markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdProcessed {
    pub content: String,
    pub recipe_id: String,
}

impl EventPayload for MdProcessed {
    const NAME: &'static str = MD_PROCESSED;
}

/// Terminal event of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardGenerated {
    pub recipe_id: String,
    pub card_url: String,
}

impl EventPayload for CardGenerated {
    const NAME: &'static str = CARD_GENERATED;
}

/// A chat message addressed to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
}

impl EventPayload for ChatMessage {
    const NAME: &'static str = CHAT_MESSAGE;
}

fn default_filename() -> String {
    "audio.mp3".to_string()
}

fn default_recipe_id() -> String {
    "default".to_string()
}
