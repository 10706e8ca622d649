//! OpenAI-compatible vision captioning over HTTP.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{parse_tagged, CaptionConfig, Caption, Captioner, ImageInfo};

const ANALYSIS_PROMPT: &str = "Analyze this image and report:\n\
1. Any text visible in the image, inside <OCR></OCR> tags.\n\
2. A description of the main content, inside <DESC></DESC> tags.\n\
3. What the image means in the context of its document, inside <CONTEXT></CONTEXT> tags.\n\
Be brief and precise, focusing on the key information in the image.";

/// Captions images with a chat completions endpoint.
pub struct OpenAiCaptioner {
    config: CaptionConfig,
    client: Client,
}

impl OpenAiCaptioner {
    /// Build a client. Fails with [`Error::MissingApiKey`] when no key is set.
    pub fn new(config: CaptionConfig) -> Result<Self> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(Error::MissingApiKey);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CaptionConfig {
        &self.config
    }

    fn request(&self, image: &Path, context: Option<&str>) -> Result<String> {
        let bytes = fs::read(image)?;
        let info = ImageInfo::probe(image);
        let body = build_request(&self.config, &info.format, &bytes, context);

        log::debug!(
            "Captioning {} ({}, {}) with {}",
            image.display(),
            info.format,
            info.size(),
            self.config.model
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Caption(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        let reply: ChatResponse = response.json()?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Caption("response contained no choices".to_string()))
    }
}

impl Captioner for OpenAiCaptioner {
    fn caption(&self, image: &Path, context: Option<&str>) -> Result<Caption> {
        let text = self.request(image, context)?;
        Ok(parse_tagged(&text))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

fn build_request(config: &CaptionConfig, format: &str, bytes: &[u8], context: Option<&str>) -> ChatRequest {
    let mut prompt = ANALYSIS_PROMPT.to_string();
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nContext: ");
        prompt.push_str(context);
    }

    ChatRequest {
        model: config.model.clone(),
        messages: vec![Message {
            role: "user",
            content: vec![
                Part::Text { text: prompt },
                Part::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/{};base64,{}", format, STANDARD.encode(bytes)),
                        detail: "high",
                    },
                },
            ],
        }],
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}
