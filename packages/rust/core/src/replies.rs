//! Outbound replies and the user-facing texts.

use async_trait::async_trait;

use linkcatalog_shared::{CategoryKey, ConversationId, ExtractedContent, Result};

pub const WELCOME: &str = "👋 Hi! I'm your AI Catalog Bot.

Send me any AI-related link and I'll automatically:
• Extract the content
• Categorize it (content, tools, prompts, people)
• Save it to your GitHub portfolio

Just paste a link to get started!";

pub const HELP: &str = "ℹ️ How to use me:

1. Send a link (article, tool, tweet...)
2. Pick a category from the keyboard
3. I save it to your catalog

Commands:
/start - show the welcome message
/cancel - discard the pending link
/ask <question> - ask the AI assistant
/help - show this message";

pub const ANALYZING: &str = "🔍 Analyzing link...";
pub const EXTRACT_FAILED: &str = "❌ Failed to extract content from the URL. Please try again.";
pub const ADDING: &str = "⏳ Adding to catalog...";
pub const ADDED: &str = "✅ Successfully added to your AI catalog!";
pub const ADD_FAILED: &str =
    "❌ Failed to add to catalog. Please try again, or send /cancel to discard this link.";
pub const CANCELLED: &str = "👌 Cancelled. Send me another link whenever you're ready.";
pub const ASK_USAGE: &str = "Usage: /ask <question>";
pub const ASK_FAILED: &str = "❌ I couldn't get an answer right now. Please try again later.";
pub const SOMETHING_WENT_WRONG: &str = "❌ Something went wrong. Please try again.";

/// Summary of an extraction, followed by the category question.
pub fn extracted(content: &ExtractedContent) -> String {
    format!(
        "✨ Content extracted!\n\nTitle: {}\nDescription: {}\n\nWhich category should this go in?",
        content.title, content.description
    )
}

/// Rejection of a non-label reply, listing the valid options.
pub fn invalid_category() -> String {
    let mut text = String::from("❌ Please select a valid category using the buttons:");
    for key in CategoryKey::ALL {
        text.push('\n');
        text.push_str(key.label());
    }
    text
}

/// Keyboard attached to a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMarkup {
    /// Leave whatever keyboard the client shows.
    #[default]
    None,
    /// The four category labels, one per row.
    CategoryKeyboard,
    /// Hide a previously shown keyboard.
    RemoveKeyboard,
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: ReplyMarkup,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: ReplyMarkup::None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: ReplyMarkup::CategoryKeyboard,
        }
    }

    pub fn removing_keyboard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: ReplyMarkup::RemoveKeyboard,
        }
    }
}

/// Delivers replies to a conversation.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, chat: ConversationId, reply: Reply) -> Result<()>;
}
