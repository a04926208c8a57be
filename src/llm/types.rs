use crate::{codec::EncodedImage, prompt::PromptContext};
use serde::{Deserialize, Serialize};

/// Sampling parameters applied identically to every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

pub const GENERATION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 1.0,
    top_p: 0.95,
    max_output_tokens: 8192,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Body of a `streamGenerateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub generation_config: GenerationConfig,
}

impl GenerationRequest {
    /// Image first, then the query (only when non-blank), then the persona.
    pub fn new(image: &EncodedImage, query: &str, prompt: &PromptContext) -> Self {
        let mut parts = vec![Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.to_string(),
                data: image.to_base64(),
            },
        }];

        if !query.trim().is_empty() {
            parts.push(Part::Text {
                text: query.to_string(),
            });
        }

        parts.push(Part::Text {
            text: prompt.persona.clone(),
        });

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.system_instruction.clone(),
                }],
            },
            generation_config: GENERATION_CONFIG,
        }
    }

    pub fn parts(&self) -> &[Part] {
        self.contents
            .first()
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    pub fn text_parts(&self) -> Vec<&str> {
        self.parts()
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.parts()
            .iter()
            .filter(|part| matches!(part, Part::InlineData { .. }))
            .count()
    }
}

/// One decoded server-sent event from the streaming endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: Option<i32>,
    pub message: Option<String>,
    pub status: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

impl StreamChunk {
    /// Text of the first candidate, parts joined in order.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ApiError {
    pub fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match (&self.status, self.code) {
            (Some(status), _) if !status.is_empty() => format!("{status}: {message}"),
            (_, Some(code)) => format!("{code}: {message}"),
            _ => message.to_string(),
        }
    }
}
