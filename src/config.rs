use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main pipeline configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PipelineConfig {
    /// Public address of the recipe server, used in generated links
    #[serde(default)]
    pub server: ServerConfig,
    /// Card rendering options
    #[serde(default)]
    pub card: CardConfig,
    /// Chat intake options
    #[serde(default)]
    pub chat: ChatConfig,
    /// Speech-to-text collaborator options
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    /// Identities the stages publish under
    #[serde(default)]
    pub stages: StageIds,
    /// Channels notifications are posted to
    #[serde(default)]
    pub channels: ChannelConfig,
    /// Artifact storage options
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `http://<host>:<port>`, the prefix of every URL the pipeline hands out
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CardConfig {
    #[serde(default)]
    pub labels: CardLabels,
    /// Font families to try in order; the first one installed is used
    #[serde(default = "default_font_families")]
    pub font_families: Vec<String>,
    /// Extra font files loaded in addition to the system fonts
    #[serde(default)]
    pub font_files: Vec<PathBuf>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            labels: CardLabels::default(),
            font_families: default_font_families(),
            font_files: Vec::new(),
        }
    }
}

/// Fixed text printed on every card
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CardLabels {
    #[serde(default = "default_ingredients_label")]
    pub ingredients: String,
    #[serde(default = "default_instructions_label")]
    pub instructions: String,
    #[serde(default = "default_scan_caption")]
    pub scan_caption: String,
}

impl Default for CardLabels {
    fn default() -> Self {
        Self {
            ingredients: default_ingredients_label(),
            instructions: default_instructions_label(),
            scan_caption: default_scan_caption(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Case-insensitive terms that mark a chat message as a recipe
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Reply sent to messages that are not recipes
    #[serde(default = "default_acknowledgement")]
    pub acknowledgement: String,
    /// Reply sent when a recipe was accepted for processing
    #[serde(default = "default_processing_notice")]
    pub processing_notice: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            acknowledgement: default_acknowledgement(),
            processing_notice: default_processing_notice(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// API key (can also be set via OPENAI_API_KEY)
    pub api_key: Option<String>,
    #[serde(default = "default_transcription_base_url")]
    pub base_url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Attempts per recording, including the first one
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base delay between attempts in milliseconds (grows linearly)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_transcription_base_url(),
            model: default_transcription_model(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StageIds {
    #[serde(default = "default_recorder_id")]
    pub recorder: String,
    #[serde(default = "default_chat_intake_id")]
    pub chat_intake: String,
    #[serde(default = "default_card_maker_id")]
    pub card_maker: String,
}

impl Default for StageIds {
    fn default() -> Self {
        Self {
            recorder: default_recorder_id(),
            chat_intake: default_chat_intake_id(),
            card_maker: default_card_maker_id(),
        }
    }
}

impl StageIds {
    pub fn all(&self) -> [&str; 3] {
        [&self.recorder, &self.chat_intake, &self.card_maker]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    #[serde(default = "default_uploads_channel")]
    pub uploads: String,
    #[serde(default = "default_cards_channel")]
    pub cards: String,
    #[serde(default = "default_submissions_channel")]
    pub submissions: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            uploads: default_uploads_channel(),
            cards: default_cards_channel(),
            submissions: default_submissions_channel(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8700
}

fn default_font_families() -> Vec<String> {
    [
        "Noto Sans CJK SC",
        "Source Han Sans SC",
        "WenQuanYi Micro Hei",
        "Microsoft YaHei",
        "PingFang SC",
        "SimSun",
        "DejaVu Sans",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_ingredients_label() -> String {
    "Ingredients".to_string()
}

fn default_instructions_label() -> String {
    "Instructions preview".to_string()
}

fn default_scan_caption() -> String {
    "Scan for full recipe".to_string()
}

fn default_keywords() -> Vec<String> {
    [
        "菜谱",
        "recipe",
        "做法",
        "cooking",
        "cook",
        "how to make",
        "怎么做",
        "食谱",
        "ingredients",
        "instructions",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_acknowledgement() -> String {
    "Got your message. Send me a recipe and I will turn it into a card.".to_string()
}

fn default_processing_notice() -> String {
    "Processing your recipe, the card will follow shortly...".to_string()
}

fn default_transcription_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_recorder_id() -> String {
    "recorder".to_string()
}

fn default_chat_intake_id() -> String {
    "chat-intake".to_string()
}

fn default_card_maker_id() -> String {
    "card-maker".to_string()
}

fn default_uploads_channel() -> String {
    "recipe-uploads".to_string()
}

fn default_cards_channel() -> String {
    "recipe-cards".to_string()
}

fn default_submissions_channel() -> String {
    "recipe-md".to_string()
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

impl PipelineConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_CARDS__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_CARDS__SERVER__PORT
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`PipelineConfig::load`] for the layering rules.
pub fn load_config() -> Result<PipelineConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE_CARDS__TRANSCRIPTION__API_KEY
        .add_source(
            Environment::with_prefix("RECIPE_CARDS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
