//! Hosted item store client over HTTP.
//!
//! JSON request/response against the backend's REST surface, with the
//! change feed delivered as a long-lived response streaming one JSON
//! event per line.

use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, instrument, warn};

use crafty_spinx_core::{Item, ItemDraft, ItemEvent, ItemId, ItemPatch, UserId};

use super::{ItemFeed, ItemStore, StoreError};
use crate::config::RemoteStoreConfig;

/// Buffered events between the stream pump and the feed consumer.
const FEED_BUFFER: usize = 64;

/// Client for the hosted item store API.
#[derive(Clone)]
pub struct RestStore {
    inner: Arc<RestStoreInner>,
}

struct RestStoreInner {
    http: reqwest::Client,
    /// Separate client without the per-request timeout; the change feed
    /// holds its response open indefinitely.
    stream_http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl RestStore {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: &RemoteStoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| StoreError::Unavailable(format!("http client: {err}")))?;

        let stream_http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|err| StoreError::Unavailable(format!("http client: {err}")))?;

        Ok(Self {
            inner: Arc::new(RestStoreInner {
                http,
                stream_http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.inner.api_key.expose_secret())
    }

    /// Reject non-success responses, logging a snippet of the body.
    /// 400 maps to [`StoreError::Validation`]; call sites handle the
    /// statuses that carry more specific meaning (404, 409) beforehand.
    async fn check(
        response: reqwest::Response,
        context: &'static str,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        error!(status = %status, body = %snippet, context, "item store request failed");

        if status == StatusCode::BAD_REQUEST {
            return Err(StoreError::Validation(snippet));
        }
        Err(StoreError::Unavailable(format!("{context}: HTTP {status}")))
    }

    /// Connect the change-feed stream and forward decoded events until the
    /// stream or the receiver goes away.
    async fn pump_events(&self, tx: mpsc::Sender<ItemEvent>) {
        let request = self.authorize(self.inner.stream_http.get(self.url("/items/events")));

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "item feed connection failed");
                return;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "item feed rejected");
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(error = %err, "item feed interrupted");
                    break;
                }
            };

            buffer.extend_from_slice(&chunk);
            while let Some(newline) = buffer.iter().position(|&byte| byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                match parse_event_line(&line) {
                    Ok(Some(event)) => {
                        if tx.send(event).await.is_err() {
                            return; // feed dropped
                        }
                    }
                    Ok(None) => {} // keep-alive
                    Err(err) => warn!(error = %err, "skipping malformed feed event"),
                }
            }
        }
    }
}

/// Decode one newline-delimited JSON feed line. Blank lines are
/// keep-alives.
fn parse_event_line(line: &[u8]) -> Result<Option<ItemEvent>, serde_json::Error> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some)
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    wishlisted: bool,
}

#[async_trait::async_trait]
impl ItemStore for RestStore {
    #[instrument(skip(self))]
    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let response = self.authorize(self.inner.http.get(self.url("/items"))).send().await?;
        let response = Self::check(response, "list items").await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn insert_item(&self, draft: ItemDraft) -> Result<Item, StoreError> {
        let response = self
            .authorize(self.inner.http.post(self.url("/items")))
            .json(&draft)
            .send()
            .await?;
        let response = Self::check(response, "insert item").await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self, patch), fields(item = %id))]
    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, StoreError> {
        let response = self
            .authorize(self.inner.http.patch(self.url(&format!("/items/{id}"))))
            .json(&patch)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id));
        }
        let response = Self::check(response, "update item").await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self), fields(item = %id))]
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        let response = self
            .authorize(self.inner.http.delete(self.url(&format!("/items/{id}"))))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(()); // idempotent
        }
        Self::check(response, "delete item").await?;
        Ok(())
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    async fn replace_all(&self, drafts: Vec<ItemDraft>) -> Result<Vec<Item>, StoreError> {
        // Step one: clear the collection.
        let response = self
            .authorize(self.inner.http.delete(self.url("/items")))
            .send()
            .await?;
        Self::check(response, "clear items").await?;

        // Step two: restore. Not atomic with step one; a failure here
        // leaves the collection partially restored and must say so.
        let expected = drafts.len();
        let mut inserted = Vec::with_capacity(expected);
        for draft in drafts {
            match self.insert_item(draft).await {
                Ok(item) => inserted.push(item),
                Err(err) => {
                    return Err(StoreError::ReplaceIncomplete {
                        inserted: inserted.len(),
                        expected,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(inserted)
    }

    fn subscribe(&self) -> ItemFeed {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let store = self.clone();
        let pump = tokio::spawn(async move {
            store.pump_events(tx).await;
        });
        ItemFeed::from_channel(rx, pump)
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn cart(&self, user: UserId) -> Result<Vec<ItemId>, StoreError> {
        let response = self
            .authorize(self.inner.http.get(self.url(&format!("/users/{user}/cart"))))
            .send()
            .await?;
        let response = Self::check(response, "fetch cart").await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self), fields(user = %user, item = %item))]
    async fn add_to_cart(&self, user: UserId, item: ItemId) -> Result<bool, StoreError> {
        let response = self
            .authorize(
                self.inner
                    .http
                    .put(self.url(&format!("/users/{user}/cart/{item}"))),
            )
            .send()
            .await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(false), // duplicate rejected
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(item)),
            _ => {
                Self::check(response, "add to cart").await?;
                Ok(true)
            }
        }
    }

    #[instrument(skip(self), fields(user = %user, item = %item))]
    async fn remove_from_cart(&self, user: UserId, item: ItemId) -> Result<(), StoreError> {
        let response = self
            .authorize(
                self.inner
                    .http
                    .delete(self.url(&format!("/users/{user}/cart/{item}"))),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response, "remove from cart").await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn clear_cart(&self, user: UserId) -> Result<(), StoreError> {
        let response = self
            .authorize(self.inner.http.delete(self.url(&format!("/users/{user}/cart"))))
            .send()
            .await?;
        Self::check(response, "clear cart").await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn wishlist(&self, user: UserId) -> Result<Vec<ItemId>, StoreError> {
        let response = self
            .authorize(
                self.inner
                    .http
                    .get(self.url(&format!("/users/{user}/wishlist"))),
            )
            .send()
            .await?;
        let response = Self::check(response, "fetch wishlist").await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self), fields(user = %user, item = %item))]
    async fn toggle_wishlist(&self, user: UserId, item: ItemId) -> Result<bool, StoreError> {
        let response = self
            .authorize(
                self.inner
                    .http
                    .post(self.url(&format!("/users/{user}/wishlist/{item}/toggle"))),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(item));
        }
        let response = Self::check(response, "toggle wishlist").await?;
        let toggle: ToggleResponse = response.json().await?;
        Ok(toggle.wishlisted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crafty_spinx_core::ChangeKind;

    use super::*;

    #[test]
    fn test_parse_event_line_decodes_events() {
        let line = br#"{"kind":"delete","item":{"id":4,"name":"Frederick the Frog","description":"A friendly frog.","price":{"amount":"300","currency_code":"USD"},"image_url":"https://example.com/frog.jpg","category":"Crochet"}}
"#;
        let event = parse_event_line(line).unwrap().unwrap();
        assert_eq!(event.kind, ChangeKind::Delete);
        assert_eq!(event.item.id, ItemId::new(4));
        assert_eq!(event.item.model_url, None);
    }

    #[test]
    fn test_parse_event_line_blank_is_keepalive() {
        assert!(parse_event_line(b"\n").unwrap().is_none());
        assert!(parse_event_line(b"  \r\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_event_line_rejects_garbage() {
        assert!(parse_event_line(b"not json\n").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = RemoteStoreConfig {
            base_url: "https://api.craftyspinx.shop/".to_string(),
            api_key: SecretString::from("k"),
            request_timeout: std::time::Duration::from_secs(5),
        };
        let store = RestStore::new(&config).unwrap();
        assert_eq!(store.url("/items"), "https://api.craftyspinx.shop/items");
    }
}
