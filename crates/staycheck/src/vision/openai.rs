//! OpenAI-compatible vision backend.
//!
//! Works with any endpoint exposing the `/chat/completions` shape, including
//! a local Ollama serving a llava-class model, vLLM, or the OpenAI API
//! itself.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::prompt::{analysis_prompt, comparison_prompt, parse_analysis, parse_comparison};
use super::{
    encoded_image, transport_error, PhotoComparison, RoomAnalysis, VisionAnalyzer, VisionError,
};

const MAX_TOKENS: u32 = 1024;

pub struct OpenAiVision {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiVision {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("http client builds");

        Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }

    /// Backend pointing at a local Ollama instance.
    pub fn ollama(model: &str, timeout: Duration) -> Self {
        Self::new("http://localhost:11434/v1", model, None, timeout)
    }

    async fn request_text(&self, content: Vec<ContentPart>) -> Result<String, VisionError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(VisionError::RequestFailed(format!(
                "HTTP {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| VisionError::RequestFailed(err.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    async fn image_part(path: &Path) -> Result<ContentPart, VisionError> {
        let (data, media_type) = encoded_image(path).await?;
        Ok(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{media_type};base64,{data}"),
            },
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl VisionAnalyzer for OpenAiVision {
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
            Self::image_part(image).await?,
            ContentPart::Text {
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
            Self::image_part(before).await?,
            Self::image_part(after).await?,
            ContentPart::Text {
                text: comparison_prompt(room_name),
            },
        ];
        let text = self.request_text(content).await?;
        Ok(parse_comparison(&text))
    }
}
