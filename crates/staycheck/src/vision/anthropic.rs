//! Hosted vision backend speaking the Anthropic Messages API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::{analysis_prompt, comparison_prompt, parse_analysis, parse_comparison};
use super::{
    encoded_image, transport_error, PhotoComparison, RoomAnalysis, VisionAnalyzer, VisionError,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicVision {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicVision {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("http client builds");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn request_text(&self, content: Vec<ContentBlock>) -> Result<String, VisionError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![MessageBody {
                role: "user",
                content,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(VisionError::RequestFailed(format!(
                "HTTP {status}: {detail}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|err| VisionError::RequestFailed(err.to_string()))?;

        Ok(parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .unwrap_or_default())
    }

    async fn image_block(path: &Path) -> Result<ContentBlock, VisionError> {
        let (data, media_type) = encoded_image(path).await?;
        Ok(ContentBlock::Image {
            source: ImageSource {
                kind: "base64",
                media_type,
                data,
            },
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessageBody>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl VisionAnalyzer for AnthropicVision {
    fn id(&self) -> &str {
        &self.model
    }

    async fn analyze(
        &self,
        image: &Path,
        checklist: &[String],
        room_name: &str,
    ) -> Result<RoomAnalysis, VisionError> {
        let content = vec![
            Self::image_block(image).await?,
            ContentBlock::Text {
                text: analysis_prompt(room_name, checklist),
            },
        ];
        let text = self.request_text(content).await?;
        Ok(parse_analysis(&text))
    }

    async fn compare(
        &self,
        before: &Path,
        after: &Path,
        room_name: &str,
    ) -> Result<PhotoComparison, VisionError> {
        let content = vec![
            Self::image_block(before).await?,
            Self::image_block(after).await?,
            ContentBlock::Text {
                text: comparison_prompt(room_name),
            },
        ];
        let text = self.request_text(content).await?;
        Ok(parse_comparison(&text))
    }
}
