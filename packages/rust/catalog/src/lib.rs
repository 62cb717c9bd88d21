//! Catalog persistence: prepend entries to a revisioned JSON dataset.
//!
//! [`CatalogWriter::append`] is a read-modify-write cycle: read the document
//! and its revision, insert the entry at the front of its category array,
//! stamp `lastUpdated`, and write back conditionally on the read revision.
//! A concurrent change makes the write fail; nothing is retried.

mod github;
mod store;

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{info, instrument};

use linkcatalog_shared::{CatalogEntry, CategoryKey, LinkCatalogError, Result};

pub use github::GitHubStore;
pub use store::{DatasetStore, MemoryStore, RemoteDocument, content_revision};

/// Longest title quoted in a change description before truncation.
const MAX_TITLE_CHARS: usize = 50;

/// Appends entries to the dataset document at `path` in a [`DatasetStore`].
#[derive(Clone)]
pub struct CatalogWriter {
    store: Arc<dyn DatasetStore>,
    path: String,
}

impl CatalogWriter {
    pub fn new(store: Arc<dyn DatasetStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Prepend `entry` to its category array and persist the dataset.
    ///
    /// `title` names the entry in the change description. Returns the
    /// dataset as written.
    #[instrument(skip_all, fields(path = %self.path, category = %entry.key()))]
    pub async fn append(&self, entry: &CatalogEntry, title: &str) -> Result<Value> {
        let remote = self.store.read(&self.path).await?;

        let mut dataset: Value = serde_json::from_slice(&remote.content).map_err(|e| {
            LinkCatalogError::Persistence(format!("{}: dataset is not valid JSON: {e}", self.path))
        })?;

        apply_entry(&mut dataset, entry, Utc::now())?;

        let body = serde_json::to_string_pretty(&dataset).map_err(|e| {
            LinkCatalogError::Persistence(format!("{}: failed to serialize dataset: {e}", self.path))
        })?;
        let message = change_description(entry.key(), title);

        let revision = self
            .store
            .write(&self.path, body.as_bytes(), &remote.revision, &message)
            .await?;

        info!(%revision, link = %entry.link(), "catalog entry added");
        Ok(dataset)
    }
}

/// Insert `entry` at index 0 of its category array and set `lastUpdated`.
///
/// The array is created when absent. Other keys keep their values and order.
pub fn apply_entry(dataset: &mut Value, entry: &CatalogEntry, now: DateTime<Utc>) -> Result<()> {
    let root = dataset.as_object_mut().ok_or_else(|| {
        LinkCatalogError::Persistence("dataset root is not a JSON object".into())
    })?;

    let key = entry.key().as_str();
    let value = serde_json::to_value(entry)
        .map_err(|e| LinkCatalogError::Persistence(format!("failed to encode entry: {e}")))?;

    match root
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(items) => items.insert(0, value),
        _ => {
            return Err(LinkCatalogError::Persistence(format!(
                "dataset field {key:?} is not an array"
            )));
        }
    }

    root.insert(
        "lastUpdated".into(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Ok(())
}

/// `Add <singular>: <title>`, the title cut to 50 characters plus "...".
pub fn change_description(key: CategoryKey, title: &str) -> String {
    let title = if title.chars().count() > MAX_TITLE_CHARS {
        let cut: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{cut}...")
    } else {
        title.to_string()
    };
    format!("Add {}: {title}", key.singular())
}
