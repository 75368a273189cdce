//! LINE Sender
//!
//! Reply API and content API client. Each call is a single attempt; the
//! caller owns timeouts and the decision of what to do on failure.

use async_trait::async_trait;
use futures::TryStreamExt;
use meterline_core::{ChannelError, ContentStream, MessagingClient, ReplyPayload};
use reqwest::Client;
use tracing::{debug, info};

use crate::line::{ReplyMessage, ReplyRequest};

#[derive(Clone)]
pub struct LineClientConfig {
    pub channel_access_token: String,
    /// e.g. `https://api.line.me`
    pub api_base: String,
    /// e.g. `https://api-data.line.me`
    pub data_api_base: String,
}

pub struct LineClient {
    config: LineClientConfig,
    http: Client,
}

impl LineClient {
    pub fn new(config: LineClientConfig) -> Self {
        Self { config, http: Client::new() }
    }

    pub fn with_http_client(config: LineClientConfig, http: Client) -> Self {
        Self { config, http }
    }

    fn reply_url(&self) -> String {
        format!("{}/v2/bot/message/reply", self.config.api_base.trim_end_matches('/'))
    }

    fn content_url(&self, message_id: &str) -> String {
        format!(
            "{}/v2/bot/message/{}/content",
            self.config.data_api_base.trim_end_matches('/'),
            message_id
        )
    }
}

#[async_trait]
impl MessagingClient for LineClient {
    fn name(&self) -> &str {
        "line"
    }

    async fn fetch_content(&self, message_id: &str) -> Result<ContentStream, ChannelError> {
        let resp = self
            .http
            .get(self.content_url(message_id))
            .bearer_auth(&self.config.channel_access_token)
            .send()
            .await
            .map_err(|e| ChannelError::ContentRetrieval(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::ContentRetrieval(format!("{status}: {err}")));
        }

        debug!(message_id, length = ?resp.content_length(), "[LINE] Content stream opened");
        let stream = resp
            .bytes_stream()
            .map_err(|e| ChannelError::ContentRetrieval(e.to_string()));
        Ok(Box::pin(stream))
    }

    async fn reply(&self, reply_token: &str, payload: &ReplyPayload) -> Result<(), ChannelError> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![ReplyMessage { message_type: "text", text: &payload.text }],
        };
        let resp = self
            .http
            .post(self.reply_url())
            .bearer_auth(&self.config.channel_access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::ReplyDelivery(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::ReplyDelivery(format!("{status}: {err}")));
        }
        info!("[LINE] Reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api: &str, data: &str) -> LineClient {
        LineClient::new(LineClientConfig {
            channel_access_token: "token".into(),
            api_base: api.into(),
            data_api_base: data.into(),
        })
    }

    #[test]
    fn builds_endpoint_urls() {
        let c = client("https://api.line.me/", "https://api-data.line.me");
        assert_eq!(c.reply_url(), "https://api.line.me/v2/bot/message/reply");
        assert_eq!(
            c.content_url("325708"),
            "https://api-data.line.me/v2/bot/message/325708/content"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_content_retrieval_error() {
        // Nothing listens on the discard port.
        let c = client("http://127.0.0.1:9", "http://127.0.0.1:9");
        let err = c.fetch_content("1").await.err().unwrap();
        assert!(matches!(err, ChannelError::ContentRetrieval(_)));

        let err = c.reply("t", &ReplyPayload::new("hi")).await.unwrap_err();
        assert!(matches!(err, ChannelError::ReplyDelivery(_)));
    }
}
