//! Minimal Telegram Bot API client: long polling and text replies.

mod types;

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use linkcatalog_shared::{LinkCatalogError, Result, TelegramConfig};

use types::{ApiResponse, GetUpdatesRequest, SendMessageRequest};
pub use types::{
    Chat, KeyboardButton, Message, ReplyKeyboard, ReplyKeyboardMarkup, ReplyKeyboardRemove,
    Update, User,
};

/// Slack added to the HTTP timeout on top of the long-poll timeout.
const POLL_MARGIN_SECS: u64 = 10;

/// Longest `sendMessage` text, in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into parts of at most `limit` UTF-16 code units.
///
/// Parts end after a newline when one falls in the second half of the
/// window; otherwise the cut lands on a char boundary.
pub fn split_text(text: &str, limit: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;

    while rest.encode_utf16().count() > limit {
        let mut units = 0;
        let mut cut = 0;
        let mut newline = None;
        for (i, c) in rest.char_indices() {
            if units + c.len_utf16() > limit {
                break;
            }
            units += c.len_utf16();
            cut = i + c.len_utf8();
            if c == '\n' && units >= limit / 2 {
                newline = Some(cut);
            }
        }
        let cut = match (newline, cut) {
            (Some(at), _) => at,
            // limit smaller than the first char
            (None, 0) => rest.chars().next().map_or(rest.len(), char::len_utf8),
            (None, cut) => cut,
        };
        let (head, tail) = rest.split_at(cut);
        parts.push(head);
        rest = tail;
    }

    parts.push(rest);
    parts
}

/// Client bound to one bot token.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    /// `{api_base}/bot{token}`; never logged.
    endpoint: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(token: &str, config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs + POLL_MARGIN_SECS,
            ))
            .build()
            .map_err(|e| LinkCatalogError::Channel(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}", config.api_base.trim_end_matches('/')),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    /// The bot's own account.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for message updates after `offset`.
    ///
    /// Returns an empty list when the poll times out without activity.
    #[instrument(skip_all, fields(offset = ?offset))]
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), "updates received");
        }
        Ok(updates)
    }

    /// Send a plain-text message, optionally with a reply keyboard.
    #[instrument(skip_all, fields(chat_id = chat_id))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&ReplyKeyboard>,
    ) -> Result<Message> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup,
        };
        self.call("sendMessage", &request).await
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // The URL carries the token, so strip it from transport errors.
        let response = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                LinkCatalogError::Channel(format!("{method} failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            LinkCatalogError::Channel(format!(
                "{method}: malformed response (HTTP {status}): {}",
                e.without_url()
            ))
        })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(LinkCatalogError::Channel(format!(
                "{method} rejected ({}): {}",
                error_code.map_or_else(|| status.as_u16().to_string(), |c| c.to_string()),
                description.unwrap_or_else(|| "no description".into())
            ))),
        }
    }
}
