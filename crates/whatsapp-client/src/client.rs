//! WhatsApp gateway HTTP client.

use crate::error::WhatsAppError;
use crate::types::*;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// REST client for a WhatsApp Web gateway.
#[derive(Clone)]
pub struct WhatsAppClient {
    client: Client,
    base_url: String,
    api_token: Option<Arc<SecretString>>,
}

impl WhatsAppClient {
    /// Create a new gateway client.
    pub fn new(base_url: impl Into<String>) -> Result<Self, WhatsAppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
        })
    }

    /// Authenticate every request with a bearer token.
    pub fn with_api_token(mut self, token: SecretString) -> Self {
        self.api_token = Some(Arc::new(token));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));

        match &self.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn error_body(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if body.is_empty() {
            status.to_string()
        } else {
            body
        }
    }

    /// Check if the gateway is reachable.
    pub async fn health_check(&self) -> bool {
        self.request(Method::GET, "/v1/health")
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Get the pairing state of the gateway session.
    #[instrument(skip(self))]
    pub async fn session_status(&self) -> Result<SessionStatus, WhatsAppError> {
        let response = self.request(Method::GET, "/v1/session").send().await?;

        if !response.status().is_success() {
            return Err(WhatsAppError::Api(Self::error_body(response).await));
        }

        Ok(response.json().await?)
    }

    /// Receive pending messages.
    #[instrument(skip(self))]
    pub async fn receive(&self) -> Result<Vec<IncomingMessage>, WhatsAppError> {
        let response = self.request(Method::GET, "/v1/messages").send().await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(WhatsAppError::NotConnected);
        }
        if !response.status().is_success() {
            return Err(WhatsAppError::Api(Self::error_body(response).await));
        }

        let messages: Vec<IncomingMessage> = response.json().await?;
        debug!("Received {} messages", messages.len());
        Ok(messages)
    }

    /// Send a text message to a chat.
    #[instrument(skip(self, request), fields(chat = %request.chat_id))]
    pub async fn send_text(
        &self,
        request: &SendTextRequest,
    ) -> Result<SendMessageResponse, WhatsAppError> {
        let response = self
            .request(Method::POST, "/v1/messages/text")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = Self::error_body(response).await;
            warn!("Send failed: {}", msg);
            return Err(WhatsAppError::SendFailed(msg));
        }

        debug!("Sent text to {}", request.chat_id);
        Ok(response.json().await.unwrap_or_default())
    }

    /// Send a media message (image, sticker, audio, video) to a chat.
    #[instrument(skip(self, request), fields(chat = %request.chat_id, mimetype = %request.media.mimetype))]
    pub async fn send_media(
        &self,
        request: &SendMediaRequest,
    ) -> Result<SendMessageResponse, WhatsAppError> {
        let response = self
            .request(Method::POST, "/v1/messages/media")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = Self::error_body(response).await;
            warn!("Media send failed: {}", msg);
            return Err(WhatsAppError::SendFailed(msg));
        }

        debug!("Sent media to {}", request.chat_id);
        Ok(response.json().await.unwrap_or_default())
    }

    /// React to a message with an emoji.
    #[instrument(skip(self))]
    pub async fn react(&self, message_id: &str, emoji: &str) -> Result<(), WhatsAppError> {
        let request = ReactionRequest {
            emoji: emoji.to_string(),
        };

        let response = self
            .request(
                Method::POST,
                &format!("/v1/messages/{}/reaction", encode(message_id)),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| WhatsAppError::ReactionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WhatsAppError::ReactionFailed(
                Self::error_body(response).await,
            ));
        }

        Ok(())
    }

    /// Download the media attached to a message, if the gateway still has it.
    #[instrument(skip(self))]
    pub async fn download_media(
        &self,
        message_id: &str,
    ) -> Result<Option<MediaPayload>, WhatsAppError> {
        let response = self
            .request(
                Method::GET,
                &format!("/v1/messages/{}/media", encode(message_id)),
            )
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(WhatsAppError::MediaUnavailable(
                Self::error_body(response).await,
            ));
        }

        Ok(Some(response.json().await?))
    }

    /// Fetch a remote file and wrap it as an outgoing media payload.
    #[instrument(skip(self))]
    pub async fn fetch_media(&self, url: &str) -> Result<MediaPayload, WhatsAppError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(WhatsAppError::MediaUnavailable(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let mimetype = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let filename = url
            .rsplit('/')
            .next()
            .map(|name| name.split('?').next().unwrap_or(name))
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        Ok(MediaPayload {
            mimetype,
            data: STANDARD.encode(&bytes),
            filename,
        })
    }
}
