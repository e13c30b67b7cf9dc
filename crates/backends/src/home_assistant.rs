//! Home Assistant shopping-list integration.
//!
//! Talks to the REST API exposed by the `shopping_list` integration:
//! - `GET  /api/shopping_list`: all entries, oldest first
//! - `POST /api/shopping_list/item`: append `{ "name": ... }`
//! - `POST /api/shopping_list/clear_completed`: drop entries marked complete

use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shoplist_core::{BackendError, Item, ListBackend};
use tracing::debug;

pub struct HomeAssistantBackend {
    client: Client,
    base_url: String,
    token: SecretString,
}

#[derive(Debug, Serialize)]
struct NewItem<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShoppingListEntry {
    name: String,
    #[serde(default)]
    complete: bool,
}

impl HomeAssistantBackend {
    pub fn new(client: Client, base_url: impl Into<String>, token: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url, token }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/shopping_list{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|error| BackendError::Unavailable(format!("home assistant: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected { status: status.as_u16(), message });
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ListBackend for HomeAssistantBackend {
    fn name(&self) -> &'static str {
        "home_assistant"
    }

    async fn create(&self, name: &str) -> Result<(), BackendError> {
        self.send(self.client.post(self.endpoint("/item")).json(&NewItem { name })).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Item>, BackendError> {
        let response = self.send(self.client.get(self.endpoint(""))).await?;
        let entries: Vec<ShoppingListEntry> =
            response.json().await.map_err(|error| BackendError::Decode(error.to_string()))?;
        debug!(entries = entries.len(), "fetched home assistant shopping list");

        // Home Assistant appends new entries, so reverse for newest first.
        Ok(entries
            .into_iter()
            .rev()
            .filter(|entry| !entry.complete)
            .map(|entry| Item::new(entry.name))
            .collect())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        self.send(self.client.post(self.endpoint("/clear_completed"))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use serde_json::json;
    use shoplist_core::{BackendError, Item, ListBackend};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::HomeAssistantBackend;

    fn backend_for(server: &MockServer) -> HomeAssistantBackend {
        HomeAssistantBackend::new(
            Client::new(),
            format!("{}/", server.uri()),
            "test-token".to_owned().into(),
        )
    }

    #[tokio::test]
    async fn create_posts_item_name_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/shopping_list/item"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({ "name": "Milk" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Milk", "id": "a1", "complete": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server).create("Milk").await.expect("create");
    }

    #[tokio::test]
    async fn list_skips_completed_entries_and_returns_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shopping_list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "Milk", "id": "1", "complete": false },
                { "name": "Eggs", "id": "2", "complete": true },
                { "name": "Bread", "id": "3", "complete": false }
            ])))
            .mount(&server)
            .await;

        let items = backend_for(&server).list().await.expect("list");

        assert_eq!(items, vec![Item::new("Bread"), Item::new("Milk")]);
    }

    #[tokio::test]
    async fn clear_calls_clear_completed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/shopping_list/clear_completed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server).clear().await.expect("clear");
    }

    #[tokio::test]
    async fn unauthorized_status_maps_to_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shopping_list"))
            .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
            .mount(&server)
            .await;

        let error = backend_for(&server).list().await.expect_err("401 should fail");

        assert_eq!(
            error,
            BackendError::Rejected { status: 401, message: "401: Unauthorized".to_owned() }
        );
    }

    #[tokio::test]
    async fn malformed_payload_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/shopping_list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let error = backend_for(&server).list().await.expect_err("garbage should fail");

        assert!(matches!(error, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_unavailable() {
        let backend = HomeAssistantBackend::new(
            Client::new(),
            "http://127.0.0.1:9",
            "test-token".to_owned().into(),
        );

        let error = backend.clear().await.expect_err("nothing listens on port 9");

        assert!(matches!(error, BackendError::Unavailable(_)));
    }
}
