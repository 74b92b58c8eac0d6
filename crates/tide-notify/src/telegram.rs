//! Telegram Bot API notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tide_core::error::NotifyError;
use tide_core::traits::Notifier;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram refuses messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram notifier configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub parse_mode: Option<String>,
    pub timeout: Duration,
}

impl TelegramConfig {
    /// Create config directly with token and chat id.
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            parse_mode: Some("HTML".to_string()),
            timeout: Duration::from_secs(10),
        }
    }

    /// Load credentials from the named environment variables.
    pub fn from_env(token_var: &str, chat_id_var: &str) -> Result<Self, NotifyError> {
        let bot_token = read_env(token_var)?;
        let chat_id = read_env(chat_id_var)?;
        Ok(Self::new(bot_token, chat_id))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_parse_mode(mut self, parse_mode: Option<String>) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

fn read_env(name: &str) -> Result<String, NotifyError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(NotifyError::Configuration(format!("{} not set", name))),
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Split `text` into chunks of at most `limit` characters, preferring
/// line boundaries so markup on a line stays intact.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();

        if current_chars + line_chars > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if line_chars > limit {
            // A single overlong line is cut hard.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier.
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn send_chunk(&self, text: &str) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: self.config.parse_mode.as_deref(),
        };

        let resp = self
            .client
            .post(self.config.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Connection(e.without_url().to_string()))?;

        let status = resp.status();
        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| NotifyError::Api(format!("{}: {}", status, e.without_url())))?;

        if !status.is_success() || !body.ok {
            return Err(NotifyError::Api(format!(
                "{}: {}",
                status,
                body.description.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        for (i, chunk) in chunks.iter().enumerate() {
            debug!(
                part = i + 1,
                parts = chunks.len(),
                chars = chunk.len(),
                "Sending Telegram message"
            );
            self.send_chunk(chunk).await?;
        }
        info!(parts = chunks.len(), "Telegram notification sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
