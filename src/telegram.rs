use crate::image::random_image;
use crate::router::Route;
use crate::server::AppState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// Telegram webhook types
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl User {
    /// Key used for reply titles: last name, else username, else first name.
    pub fn identity(&self) -> &str {
        self.last_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.first_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[allow(dead_code)]
    pub r#type: String,
}

// Bot API request bodies
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: i64,
    photo: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SendChatActionRequest<'a> {
    chat_id: i64,
    action: &'a str,
}

#[derive(Debug, Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
    secret_token: &'a str,
    allowed_updates: &'a [&'a str],
}

/// Telegram Bot API client.
///
/// Built once at startup; `reqwest::Client` pools connections across calls.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
        }
    }

    /// Send a text message, optionally as a reply.
    pub async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_to_message_id: reply_to,
        };
        self.call("sendMessage", &request).await
    }

    /// Send a photo by URL, optionally as a reply.
    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
        reply_to: Option<i64>,
    ) -> Result<()> {
        let request = SendPhotoRequest {
            chat_id,
            photo: photo_url,
            caption: caption.filter(|c| !c.is_empty()),
            reply_to_message_id: reply_to,
        };
        self.call("sendPhoto", &request).await
    }

    /// Show a status such as "upload_photo" in the chat.
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<()> {
        let request = SendChatActionRequest { chat_id, action };
        self.call("sendChatAction", &request).await
    }

    /// Register the webhook URL and the secret Telegram must echo back.
    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<()> {
        let request = SetWebhookRequest {
            url,
            secret_token,
            allowed_updates: &["message"],
        };
        self.call("setWebhook", &request).await
    }

    async fn call<B: Serialize>(&self, method: &str, body: &B) -> Result<()> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Telegram API", method))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error on {} ({}): {}", method, status, body);
        }

        Ok(())
    }
}

/// Handle one webhook update: route it, then answer with an image or with
/// translations. Provider failures are logged and produce no reply.
pub async fn handle_update(state: &AppState, update: Update) -> Result<()> {
    let message = match update.message {
        Some(msg) => msg,
        None => return Ok(()), // Not a message update, ignore
    };

    let text = match message.text.as_deref() {
        Some(t) => t,
        None => return Ok(()), // No text, ignore
    };

    let sender = message.from.as_ref().map(User::identity).unwrap_or_default();
    state.metrics.record_message();

    info!("[{}] {}", sender, text);

    match state.router.route(text) {
        Route::ImageSearch { query } => reply_with_image(state, &message, &query).await,
        Route::Translate => reply_with_translations(state, &message, sender, text.trim()).await,
    }
}

async fn reply_with_image(state: &AppState, message: &Message, query: &str) -> Result<()> {
    let chat_id = message.chat.id;

    let query = query.trim();
    if query.is_empty() {
        debug!("Image request without a query, not searching");
        return Ok(());
    }

    if let Err(e) = state.telegram.send_chat_action(chat_id, "upload_photo").await {
        warn!("Failed to send chat action: {:#}", e);
    }

    let images = match state.images.search(query).await {
        Ok(images) => images,
        Err(e) => {
            warn!("Failed to get image for '{}', skipping silently: {}", query, e);
            state.metrics.record_image_search(false);
            return Ok(());
        }
    };
    state.metrics.record_image_search(true);

    let Some(image) = random_image(&images) else {
        return Ok(());
    };

    state
        .telegram
        .send_photo(chat_id, &image.link, None, Some(message.message_id))
        .await
        .context("Failed to send image reply")?;

    info!("Replied to chat {} with image {}", chat_id, image.link);
    Ok(())
}

async fn reply_with_translations(
    state: &AppState,
    message: &Message,
    sender: &str,
    text: &str,
) -> Result<()> {
    let reply = match state.relay.process(sender, text).await.into_reply() {
        Some(reply) => reply,
        None => return Ok(()),
    };

    if reply.is_blank() {
        info!("Every translation failed and there is no title, not replying");
        return Ok(());
    }

    state
        .telegram
        .send_message(message.chat.id, &reply.to_string(), Some(message.message_id))
        .await
        .context("Failed to send translation reply")?;

    info!(
        "Replied to chat {} with {} translations",
        message.chat.id,
        reply.translations.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::i18n::{LanguageTag, ReplyTitles};
    use crate::image::{Image, SearchProvider};
    use crate::metrics::RelayMetrics;
    use crate::relay::Relay;
    use crate::router::MessageRouter;
    use crate::translation::{LanguageDetector, Translator};
    use async_trait::async_trait;
    use std::sync::Arc;
    use wiremock::{
        matchers::{body_json, body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Update Deserialization Tests ====================

    #[test]
    fn test_update_deserialization_with_message() {
        let json = r#"{
            "update_id": 123456789,
            "message": {
                "message_id": 100,
                "from": {
                    "id": 987654321,
                    "username": "testuser",
                    "first_name": "Test",
                    "last_name": "User"
                },
                "chat": {
                    "id": -1001234567890,
                    "type": "supergroup"
                },
                "text": "你好世界在这里"
            }
        }"#;

        let update: Update = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(update.update_id, 123456789);

        let message = update.message.unwrap();
        assert_eq!(message.message_id, 100);
        assert_eq!(message.chat.id, -1001234567890);
        assert_eq!(message.chat.r#type, "supergroup");
        assert_eq!(message.text.as_deref(), Some("你好世界在这里"));

        let from = message.from.unwrap();
        assert_eq!(from.id, 987654321);
        assert_eq!(from.last_name.as_deref(), Some("User"));
    }

    #[test]
    fn test_update_deserialization_without_message() {
        let json = r#"{"update_id": 123456789}"#;

        let update: Update = serde_json::from_str(json).expect("Should deserialize");
        assert!(update.message.is_none());
    }

    #[test]
    fn test_message_without_text_or_from() {
        let json = r#"{
            "update_id": 123,
            "message": {
                "message_id": 100,
                "chat": { "id": 123, "type": "private" }
            }
        }"#;

        let update: Update = serde_json::from_str(json).expect("Should deserialize");
        let message = update.message.unwrap();
        assert!(message.text.is_none());
        assert!(message.from.is_none());
    }

    // ==================== User Identity Tests ====================

    fn user(username: Option<&str>, last_name: Option<&str>) -> User {
        User {
            id: 1,
            username: username.map(String::from),
            first_name: "First".to_string(),
            last_name: last_name.map(String::from),
        }
    }

    #[test]
    fn test_identity_prefers_last_name() {
        assert_eq!(user(Some("nick"), Some("Tanaka")).identity(), "Tanaka");
    }

    #[test]
    fn test_identity_falls_back_to_username_then_first_name() {
        assert_eq!(user(Some("nick"), None).identity(), "nick");
        assert_eq!(user(None, None).identity(), "First");
    }

    // ==================== Bot API Client Tests ====================

    #[tokio::test]
    async fn test_send_message_as_reply() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": 42,
                "text": "ja: こんにちは\n",
                "reply_to_message_id": 7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(&mock_server.uri(), "test-token");
        client
            .send_message(42, "ja: こんにちは\n", Some(7))
            .await
            .expect("Should send");
    }

    #[tokio::test]
    async fn test_send_message_without_reply_omits_field() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .and(body_json(serde_json::json!({ "chat_id": 42, "text": "hello" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(&format!("{}/", mock_server.uri()), "test-token");
        client.send_message(42, "hello", None).await.expect("Should send");
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendPhoto"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"ok":false,"description":"Bad Request: wrong file identifier"}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(&mock_server.uri(), "test-token");
        let err = client
            .send_photo(42, "not-a-url", None, None)
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("sendPhoto"));
        assert!(err.contains("400"));
        assert!(err.contains("wrong file identifier"));
    }

    #[tokio::test]
    async fn test_set_webhook_sends_secret() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/setWebhook"))
            .and(body_json(serde_json::json!({
                "url": "https://bot.example.com/webhook",
                "secret_token": "hook-secret",
                "allowed_updates": ["message"]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(&mock_server.uri(), "test-token");
        client
            .set_webhook("https://bot.example.com/webhook", "hook-secret")
            .await
            .expect("Should register webhook");
    }

    // ==================== Update Handling Tests ====================

    struct FixedDetector(&'static str);

    #[async_trait]
    impl LanguageDetector for FixedDetector {
        async fn detect(&self, _text: &str) -> std::result::Result<LanguageTag, ProviderError> {
            Ok(LanguageTag::new(self.0))
        }
    }

    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        async fn translate(
            &self,
            text: &str,
            target: &LanguageTag,
        ) -> std::result::Result<String, ProviderError> {
            Ok(format!("[{}] {}", target, text))
        }
    }

    struct FailingTranslator;

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(
            &self,
            _text: &str,
            _target: &LanguageTag,
        ) -> std::result::Result<String, ProviderError> {
            Err(ProviderError::empty("stub"))
        }
    }

    struct FixedImages(Vec<Image>);

    #[async_trait]
    impl SearchProvider for FixedImages {
        async fn search(&self, _query: &str) -> std::result::Result<Vec<Image>, ProviderError> {
            if self.0.is_empty() {
                return Err(ProviderError::empty("0 images"));
            }
            Ok(self.0.clone())
        }
    }

    fn state(
        telegram_url: &str,
        translator: Arc<dyn Translator>,
        images: Vec<Image>,
    ) -> AppState {
        let metrics = Arc::new(RelayMetrics::new());
        AppState {
            relay: Relay::new(Arc::new(FixedDetector("zh")), translator)
                .with_metrics(metrics.clone()),
            router: MessageRouter::default(),
            images: Arc::new(FixedImages(images)),
            telegram: TelegramClient::new(telegram_url, "test-token"),
            webhook_secret: "hook-secret".to_string(),
            metrics,
            tasks: tokio_util::task::TaskTracker::new(),
        }
    }

    fn update(text: &str) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 55,
                "from": { "id": 9, "first_name": "Wei", "last_name": "Li" },
                "chat": { "id": 777, "type": "group" },
                "text": text
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_translation_reply_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": 777,
                "text": "ja: [ja] 你好世界在这里\nen: [en] 你好世界在这里\n",
                "reply_to_message_id": 55
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let state = state(&mock_server.uri(), Arc::new(EchoTranslator), vec![]);
        handle_update(&state, update("  你好世界在这里  "))
            .await
            .expect("Should handle");

        let report = state.metrics.report();
        assert_eq!(report.messages_received, 1);
        assert_eq!(report.replies, 1);
    }

    #[tokio::test]
    async fn test_blank_reply_is_not_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let state = state(&mock_server.uri(), Arc::new(FailingTranslator), vec![]);
        handle_update(&state, update("你好世界在这里"))
            .await
            .expect("Should handle");
    }

    #[tokio::test]
    async fn test_title_only_reply_is_sent_when_every_target_fails() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": 777,
                "text": "who is speaking?\n",
                "reply_to_message_id": 55
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut state = state(&mock_server.uri(), Arc::new(FailingTranslator), vec![]);
        state.relay = state.relay.clone().with_titles(ReplyTitles {
            senders: Default::default(),
            unknown_speaker: Some("who is speaking?".to_string()),
        });

        handle_update(&state, update("你好世界在这里"))
            .await
            .expect("Should handle");

        assert_eq!(state.metrics.report().replies, 1);
    }

    #[tokio::test]
    async fn test_command_gets_no_reply() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let state = state(&mock_server.uri(), Arc::new(EchoTranslator), vec![]);
        handle_update(&state, update("/start")).await.expect("Should handle");

        assert_eq!(state.metrics.report().messages_skipped, 1);
    }

    #[tokio::test]
    async fn test_image_request_sends_photo() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendChatAction"))
            .and(body_json(serde_json::json!({ "chat_id": 777, "action": "upload_photo" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendPhoto"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": 777,
                "photo": "https://img.example.com/cat.jpg",
                "reply_to_message_id": 55
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let images = vec![Image {
            title: "Cat".to_string(),
            link: "https://img.example.com/cat.jpg".to_string(),
        }];
        let state = state(&mock_server.uri(), Arc::new(EchoTranslator), images);
        handle_update(&state, update("猫")).await.expect("Should handle");

        assert_eq!(state.metrics.report().image_searches, 1);
    }

    #[tokio::test]
    async fn test_failed_image_search_is_silent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendChatAction"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendPhoto"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let state = state(&mock_server.uri(), Arc::new(EchoTranslator), vec![]);
        handle_update(&state, update("p nothing"))
            .await
            .expect("Search failure is not an error");

        assert_eq!(state.metrics.report().image_search_failures, 1);
    }

    #[tokio::test]
    async fn test_image_prefix_without_query_does_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let images = vec![Image {
            title: "Cat".to_string(),
            link: "https://img.example.com/cat.jpg".to_string(),
        }];
        let state = state(&mock_server.uri(), Arc::new(EchoTranslator), images);
        handle_update(&state, update("p   ")).await.expect("Should handle");

        let report = state.metrics.report();
        assert_eq!(report.image_searches, 0);
        assert_eq!(report.image_search_failures, 0);
    }

    #[tokio::test]
    async fn test_update_without_text_is_ignored() {
        let mock_server = MockServer::start().await;
        let state = state(&mock_server.uri(), Arc::new(EchoTranslator), vec![]);

        let update: Update = serde_json::from_str(r#"{"update_id": 5}"#).unwrap();
        handle_update(&state, update).await.expect("Should ignore");

        assert_eq!(state.metrics.report().messages_received, 0);
    }

    #[tokio::test]
    async fn test_send_failure_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bottest-token/sendMessage"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bot was kicked"))
            .mount(&mock_server)
            .await;

        let state = state(&mock_server.uri(), Arc::new(EchoTranslator), vec![]);
        let err = handle_update(&state, update("你好世界在这里")).await.unwrap_err();
        assert!(format!("{:#}", err).contains("bot was kicked"));
    }
}
