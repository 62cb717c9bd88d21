//! Core domain types: extracted content, categories, catalog entries, sessions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConversationId
// ---------------------------------------------------------------------------

/// Opaque handle for one chat in the messaging channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ExtractedContent / PendingSession
// ---------------------------------------------------------------------------

/// Normalized description of a shared link, produced once per extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form topic label assigned by the model ("AI Tool", "AI Research", ...).
    pub category: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// A link that has been extracted and is waiting for the user to pick a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSession {
    pub extracted: ExtractedContent,
    pub url: String,
}

// ---------------------------------------------------------------------------
// CategoryKey
// ---------------------------------------------------------------------------

/// One of the four catalog partitions. Selects both the array in the dataset
/// and the shape of the entry stored in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKey {
    Content,
    Tools,
    Prompts,
    People,
}

impl CategoryKey {
    /// All keys, in the order they are offered to the user.
    pub const ALL: [CategoryKey; 4] = [Self::Content, Self::Tools, Self::Prompts, Self::People];

    /// Name of the dataset array holding entries of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Tools => "tools",
            Self::Prompts => "prompts",
            Self::People => "people",
        }
    }

    /// Button label shown in the category keyboard. Replies must match it exactly.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Content => "\u{1F4C4} Content",
            Self::Tools => "\u{1F6E0}\u{FE0F} Tools",
            Self::Prompts => "\u{1F4A1} Prompts",
            Self::People => "\u{1F468}\u{200D}\u{1F4BB} People",
        }
    }

    /// Singular noun used in change descriptions ("Add tool: ...").
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Tools => "tool",
            Self::Prompts => "prompt",
            Self::People => "person",
        }
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CatalogEntry
// ---------------------------------------------------------------------------

/// Entry in the `content` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub author: String,
    pub content: String,
    pub category: String,
    pub date_added: NaiveDate,
    pub link: String,
}

/// Entry in the `tools` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
    pub category: String,
    pub features: Vec<String>,
    pub date_added: NaiveDate,
    pub link: String,
}

/// Entry in the `prompts` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEntry {
    pub title: String,
    pub prompt: String,
    pub category: String,
    pub source: String,
    pub date_added: NaiveDate,
    pub link: String,
}

/// Entry in the `people` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEntry {
    pub name: String,
    pub description: String,
    pub notable_for: String,
    pub date_added: NaiveDate,
    pub link: String,
}

/// A record persisted in the catalog; the variant fixes the field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Content(ContentEntry),
    Tools(ToolEntry),
    Prompts(PromptEntry),
    People(PersonEntry),
}

impl CatalogEntry {
    /// Build the entry for `key` from extracted content.
    pub fn build(
        key: CategoryKey,
        extracted: &ExtractedContent,
        link: &str,
        date_added: NaiveDate,
    ) -> Self {
        let link = link.to_string();
        match key {
            CategoryKey::Content => Self::Content(ContentEntry {
                author: extracted
                    .author
                    .clone()
                    .unwrap_or_else(|| "Unknown".into()),
                content: extracted.description.clone(),
                category: extracted.category.clone(),
                date_added,
                link,
            }),
            CategoryKey::Tools => Self::Tools(ToolEntry {
                name: extracted.title.clone(),
                description: extracted.description.clone(),
                category: extracted.category.clone(),
                features: extracted.features.clone(),
                date_added,
                link,
            }),
            CategoryKey::Prompts => Self::Prompts(PromptEntry {
                title: extracted.title.clone(),
                prompt: extracted.description.clone(),
                category: extracted.category.clone(),
                source: link.clone(),
                date_added,
                link,
            }),
            CategoryKey::People => Self::People(PersonEntry {
                name: extracted.title.clone(),
                description: extracted.description.clone(),
                notable_for: extracted.category.clone(),
                date_added,
                link,
            }),
        }
    }

    /// The category this entry belongs to.
    pub fn key(&self) -> CategoryKey {
        match self {
            Self::Content(_) => CategoryKey::Content,
            Self::Tools(_) => CategoryKey::Tools,
            Self::Prompts(_) => CategoryKey::Prompts,
            Self::People(_) => CategoryKey::People,
        }
    }

    pub fn link(&self) -> &str {
        match self {
            Self::Content(e) => &e.link,
            Self::Tools(e) => &e.link,
            Self::Prompts(e) => &e.link,
            Self::People(e) => &e.link,
        }
    }
}
