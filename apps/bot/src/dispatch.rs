//! Telegram long-polling loop and per-chat workers.
//!
//! Each chat gets one queue drained by one task, so messages of a chat are
//! handled in arrival order while chats proceed independently. Idle workers
//! exit and are respawned on the next message.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use linkcatalog_core::{Controller, Reply, ReplyMarkup, ReplySink};
use linkcatalog_shared::{CategoryKey, ConversationId, Result};
use linkcatalog_telegram::{MAX_MESSAGE_LEN, ReplyKeyboard, TelegramClient, Update, split_text};

/// Pause after a failed poll before polling again.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);
/// A worker with an empty queue for this long exits.
const WORKER_IDLE: Duration = Duration::from_secs(300);
/// How long shutdown waits for in-flight turns.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// [`ReplySink`] that sends through the Bot API.
pub(crate) struct TelegramSink {
    client: TelegramClient,
}

impl TelegramSink {
    pub(crate) fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

fn keyboard(markup: ReplyMarkup) -> Option<ReplyKeyboard> {
    match markup {
        ReplyMarkup::None => None,
        ReplyMarkup::CategoryKeyboard => Some(ReplyKeyboard::single_column(
            CategoryKey::ALL.map(|key| key.label()),
        )),
        ReplyMarkup::RemoveKeyboard => Some(ReplyKeyboard::remove()),
    }
}

/// Texts over the Bot API limit go out as several messages; the keyboard
/// rides on the last one.
#[async_trait]
impl ReplySink for TelegramSink {
    async fn send(&self, chat: ConversationId, reply: Reply) -> Result<()> {
        let markup = keyboard(reply.markup);
        let parts = split_text(&reply.text, MAX_MESSAGE_LEN);
        let last = parts.len() - 1;
        for (i, part) in parts.into_iter().enumerate() {
            let markup = if i == last { markup.as_ref() } else { None };
            self.client.send_message(chat.0, part, markup).await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Text message carried by `update`, if any.
fn inbound(update: Update) -> Option<(ConversationId, String)> {
    let message = update.message?;
    let text = message.text?;
    Some((ConversationId(message.chat.id), text))
}

/// Routes inbound texts to per-chat workers.
pub(crate) struct Dispatcher {
    controller: Arc<Controller>,
    queues: HashMap<ConversationId, mpsc::UnboundedSender<String>>,
    workers: JoinSet<()>,
}

impl Dispatcher {
    pub(crate) fn new(controller: Arc<Controller>) -> Self {
        Self {
            controller,
            queues: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    /// Queue `text` for `chat`, starting a worker if the chat has none.
    pub(crate) fn dispatch(&mut self, chat: ConversationId, text: String) {
        while self.workers.try_join_next().is_some() {}
        self.queues.retain(|_, queue| !queue.is_closed());

        let text = match self.queues.get(&chat) {
            Some(queue) => match queue.send(text) {
                Ok(()) => return,
                // Worker went idle and closed its queue.
                Err(mpsc::error::SendError(text)) => text,
            },
            None => text,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(text);
        self.queues.insert(chat, tx);
        self.workers
            .spawn(worker(chat, self.controller.clone(), rx));
        debug!(%chat, "worker started");
    }

    /// Close every queue and wait for in-flight turns to finish.
    pub(crate) async fn drain(mut self, timeout: Duration) {
        self.queues.clear();
        let pending = self.workers.len();
        let finished = tokio::time::timeout(timeout, async {
            while self.workers.join_next().await.is_some() {}
        })
        .await;
        if finished.is_err() {
            warn!(pending, "shutdown timed out with turns still running");
            self.workers.abort_all();
        }
    }
}

async fn worker(
    chat: ConversationId,
    controller: Arc<Controller>,
    mut queue: mpsc::UnboundedReceiver<String>,
) {
    loop {
        match tokio::time::timeout(WORKER_IDLE, queue.recv()).await {
            Ok(Some(text)) => handle(&controller, chat, &text).await,
            Ok(None) => break,
            Err(_idle) => {
                queue.close();
                while let Ok(text) = queue.try_recv() {
                    handle(&controller, chat, &text).await;
                }
                break;
            }
        }
    }
    debug!(%chat, "worker stopped");
}

async fn handle(controller: &Controller, chat: ConversationId, text: &str) {
    if let Err(e) = controller.handle_message(chat, text).await {
        error!(%chat, error = %e, "failed to reply");
    }
}

/// Poll for updates and dispatch them until `shutdown` becomes `true`.
pub(crate) async fn run(
    client: TelegramClient,
    controller: Arc<Controller>,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut dispatcher = Dispatcher::new(controller);
    let mut offset: Option<i64> = None;

    info!("polling for messages");

    loop {
        let polled = tokio::select! {
            _ = crate::shutdown::stopped(shutdown.clone()) => break,
            polled = client.get_updates(offset) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    if let Some((chat, text)) = inbound(update) {
                        dispatcher.dispatch(chat, text);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "polling failed");
                tokio::select! {
                    _ = crate::shutdown::stopped(shutdown.clone()) => break,
                    _ = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                }
            }
        }
    }

    info!("polling stopped, finishing in-flight messages");
    dispatcher.drain(DRAIN_TIMEOUT).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcatalog_catalog::{CatalogWriter, MemoryStore};
    use linkcatalog_core::InMemorySessionStore;
    use linkcatalog_extractor::LinkExtractor;
    use linkcatalog_shared::ExtractedContent;
    use std::sync::Mutex;

    struct SlowExtractor;

    #[async_trait]
    impl LinkExtractor for SlowExtractor {
        async fn extract(&self, _url: &str) -> Result<ExtractedContent> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(ExtractedContent {
                title: "MyTool".into(),
                description: "An AI tool for X".into(),
                author: None,
                category: "AI Tool".into(),
                features: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(ConversationId, String)>>,
    }

    #[async_trait]
    impl ReplySink for Recorder {
        async fn send(&self, chat: ConversationId, reply: Reply) -> Result<()> {
            self.sent.lock().unwrap().push((chat, reply.text));
            Ok(())
        }
    }

    #[test]
    fn keyboard_markup_mapping() {
        assert_eq!(keyboard(ReplyMarkup::None), None);
        assert_eq!(keyboard(ReplyMarkup::RemoveKeyboard), Some(ReplyKeyboard::remove()));

        let Some(ReplyKeyboard::Keyboard(markup)) = keyboard(ReplyMarkup::CategoryKeyboard) else {
            panic!("expected a keyboard");
        };
        let rows: Vec<&str> = markup.keyboard.iter().map(|row| row[0].text.as_str()).collect();
        assert_eq!(rows, CategoryKey::ALL.map(|key| key.label()));
        assert!(markup.one_time_keyboard);
        assert!(markup.resize_keyboard);
    }

    #[test]
    fn only_text_messages_are_inbound() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 1, "chat": {"id": 5}, "text": "hi"}
        }))
        .unwrap();
        assert_eq!(inbound(update), Some((ConversationId(5), "hi".to_string())));

        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 2,
            "message": {"message_id": 2, "chat": {"id": 5}}
        }))
        .unwrap();
        assert_eq!(inbound(update), None);

        let update: Update = serde_json::from_value(serde_json::json!({"update_id": 3})).unwrap();
        assert_eq!(inbound(update), None);
    }

    #[tokio::test]
    async fn long_reply_is_split_with_keyboard_last() {
        use linkcatalog_shared::TelegramConfig;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 1, "chat": {"id": 42}}
            })))
            .mount(&server)
            .await;

        let config = TelegramConfig {
            api_base: server.uri(),
            ..TelegramConfig::default()
        };
        let sink = TelegramSink::new(TelegramClient::new("TEST", &config).unwrap());
        let text = "word ".repeat(1000);
        sink.send(ConversationId(42), Reply::with_keyboard(text.clone()))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let bodies: Vec<serde_json::Value> = requests
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();
        assert_eq!(bodies.len(), 2);

        let mut joined = String::new();
        for body in &bodies {
            let part = body["text"].as_str().unwrap();
            assert!(part.encode_utf16().count() <= MAX_MESSAGE_LEN);
            joined.push_str(part);
        }
        assert_eq!(joined, text);
        assert!(bodies[0].get("reply_markup").is_none());
        assert!(bodies[1]["reply_markup"]["keyboard"].is_array());
    }

    #[tokio::test]
    async fn messages_of_a_chat_run_in_order() {
        let store = Arc::new(MemoryStore::with_document("ai-data.json", "{}"));
        let sink = Arc::new(Recorder::default());
        let controller = Controller::new(
            Arc::new(SlowExtractor),
            Arc::new(InMemorySessionStore::new()),
            sink.clone(),
        )
        .with_catalog(CatalogWriter::new(store.clone(), "ai-data.json"));

        let mut dispatcher = Dispatcher::new(Arc::new(controller));
        let chat = ConversationId(1);
        dispatcher.dispatch(chat, "https://example.com/tool".into());
        dispatcher.dispatch(chat, CategoryKey::Tools.label().into());
        dispatcher.dispatch(ConversationId(2), "hello".into());
        dispatcher.drain(Duration::from_secs(5)).await;

        let dataset: serde_json::Value =
            serde_json::from_slice(&store.document("ai-data.json").await.unwrap()).unwrap();
        assert_eq!(dataset["tools"][0]["name"], "MyTool");

        let sent = sink.sent.lock().unwrap();
        let first_chat: Vec<&str> = sent
            .iter()
            .filter(|(c, _)| *c == chat)
            .map(|(_, text)| text.as_str())
            .collect();
        assert_eq!(first_chat.len(), 4);
        assert!(first_chat[1].starts_with("✨ Content extracted!"));
        assert_eq!(first_chat[3], "✅ Successfully added to your AI catalog!");
        assert!(sent.iter().any(|(c, _)| *c == ConversationId(2)));
    }
}
