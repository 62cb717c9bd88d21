//! Per-conversation state machine: Idle ⇄ AwaitingCategory.
//!
//! ```text
//! Idle + text without URL       → welcome                     → Idle
//! Idle + URL                    → extract, ask for category   → AwaitingCategory
//! AwaitingCategory + label      → write entry                 → Idle (or stay on failure)
//! AwaitingCategory + other text → list the options            → AwaitingCategory
//! any + /cancel                 → clear                       → Idle
//! any + /start                  → clear, welcome              → Idle
//! ```
//!
//! Turns of one conversation are serialized; different conversations run
//! concurrently.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use dashmap::DashMap;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use linkcatalog_analysis::ContentAnalyzer;
use linkcatalog_catalog::CatalogWriter;
use linkcatalog_extractor::LinkExtractor;
use linkcatalog_shared::{
    CatalogEntry, CategoryKey, ConversationId, LinkCatalogError, PendingSession, Result,
};

use crate::category;
use crate::command::{self, Command};
use crate::replies::{self, Reply, ReplySink};
use crate::session::SessionStore;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid regex"));

/// First `http(s)://` run of non-whitespace in `text`.
pub fn first_url(text: &str) -> Option<&str> {
    URL_RE.find(text).map(|m| m.as_str())
}

/// Drives conversations from inbound text to catalog entries.
pub struct Controller {
    extractor: Arc<dyn LinkExtractor>,
    sessions: Arc<dyn SessionStore>,
    sink: Arc<dyn ReplySink>,
    catalog: Option<CatalogWriter>,
    analyzer: Option<Arc<dyn ContentAnalyzer>>,
    turns: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl Controller {
    /// Create a controller with no catalog and no analyzer.
    ///
    /// Without a catalog every category selection fails as a persistence
    /// error; without an analyzer `/ask` is unavailable.
    pub fn new(
        extractor: Arc<dyn LinkExtractor>,
        sessions: Arc<dyn SessionStore>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            extractor,
            sessions,
            sink,
            catalog: None,
            analyzer: None,
            turns: DashMap::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: CatalogWriter) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ContentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Handle one inbound text message.
    ///
    /// Errors inside the turn are logged and answered with a generic apology;
    /// only a failure to deliver that apology is returned.
    #[instrument(skip_all, fields(chat = %chat))]
    pub async fn handle_message(&self, chat: ConversationId, text: &str) -> Result<()> {
        let turn = self.turns.entry(chat).or_default().clone();
        let result = {
            let _guard = turn.lock().await;
            self.run_turn(chat, text).await
        };
        drop(turn);
        // Only the map's own handle left: no turn is queued on this lock.
        self.turns
            .remove_if(&chat, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn run_turn(&self, chat: ConversationId, text: &str) -> Result<()> {
        if let Err(e) = self.route(chat, text).await {
            error!(error = %e, "turn failed");
            self.send(chat, Reply::text(replies::SOMETHING_WENT_WRONG))
                .await?;
        }
        Ok(())
    }

    async fn route(&self, chat: ConversationId, text: &str) -> Result<()> {
        if let Some(command) = command::parse(text) {
            return self.run_command(chat, command).await;
        }

        if let Some(session) = self.sessions.get(chat).await? {
            return self.select_category(chat, session, text).await;
        }

        match first_url(text) {
            Some(url) => self.process_url(chat, url).await,
            None => self.send(chat, Reply::text(replies::WELCOME)).await,
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    async fn run_command(&self, chat: ConversationId, command: Command) -> Result<()> {
        debug!(?command, "command received");
        match command {
            Command::Start => {
                self.sessions.clear(chat).await?;
                self.send(chat, Reply::removing_keyboard(replies::WELCOME))
                    .await
            }
            Command::Help => self.send(chat, Reply::text(replies::HELP)).await,
            Command::Cancel => {
                self.sessions.clear(chat).await?;
                self.send(chat, Reply::removing_keyboard(replies::CANCELLED))
                    .await
            }
            Command::Ask(question) => self.ask(chat, &question).await,
        }
    }

    async fn ask(&self, chat: ConversationId, question: &str) -> Result<()> {
        if question.is_empty() {
            return self.send(chat, Reply::text(replies::ASK_USAGE)).await;
        }

        let Some(analyzer) = &self.analyzer else {
            warn!("ask received but analysis is not configured");
            return self.send(chat, Reply::text(replies::ASK_FAILED)).await;
        };

        let answer = match analyzer.complete(question).await {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => {
                warn!("analysis returned an empty answer");
                replies::ASK_FAILED.to_string()
            }
            Err(e) => {
                warn!(error = %e, "ask failed");
                replies::ASK_FAILED.to_string()
            }
        };
        self.send(chat, Reply::text(answer)).await
    }

    // -----------------------------------------------------------------------
    // Idle → AwaitingCategory
    // -----------------------------------------------------------------------

    async fn process_url(&self, chat: ConversationId, url: &str) -> Result<()> {
        self.send(chat, Reply::text(replies::ANALYZING)).await?;

        let extracted = match self.extractor.extract(url).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(%url, error = %e, "extraction failed");
                return self
                    .send(chat, Reply::text(replies::EXTRACT_FAILED))
                    .await;
            }
        };

        info!(%url, title = %extracted.title, "content extracted, awaiting category");

        let prompt = Reply::with_keyboard(replies::extracted(&extracted));
        self.sessions
            .put(
                chat,
                PendingSession {
                    extracted,
                    url: url.to_string(),
                },
            )
            .await?;
        self.send(chat, prompt).await
    }

    // -----------------------------------------------------------------------
    // AwaitingCategory → Idle
    // -----------------------------------------------------------------------

    async fn select_category(
        &self,
        chat: ConversationId,
        session: PendingSession,
        label: &str,
    ) -> Result<()> {
        let key = match category::resolve(label) {
            Ok(key) => key,
            Err(e) => {
                debug!(error = %e, "reply is not a category label");
                return self
                    .send(chat, Reply::with_keyboard(replies::invalid_category()))
                    .await;
            }
        };

        self.send(chat, Reply::text(replies::ADDING)).await?;

        match self.persist(key, &session).await {
            Ok(()) => {
                info!(category = %key, url = %session.url, "entry added");
                self.sessions.clear(chat).await?;
                self.send(chat, Reply::removing_keyboard(replies::ADDED))
                    .await
            }
            Err(e) => {
                warn!(category = %key, url = %session.url, error = %e, "catalog write failed, keeping session");
                self.send(chat, Reply::with_keyboard(replies::ADD_FAILED))
                    .await
            }
        }
    }

    async fn persist(&self, key: CategoryKey, session: &PendingSession) -> Result<()> {
        let catalog = self.catalog.as_ref().ok_or_else(|| {
            LinkCatalogError::Persistence("catalog storage is not configured".into())
        })?;

        let entry = CatalogEntry::build(
            key,
            &session.extracted,
            &session.url,
            Utc::now().date_naive(),
        );
        catalog.append(&entry, &session.extracted.title).await?;
        Ok(())
    }

    async fn send(&self, chat: ConversationId, reply: Reply) -> Result<()> {
        self.sink.send(chat, reply).await
    }
}
