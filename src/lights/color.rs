//! Natural-language color resolution
//!
//! Color names are turned into CIE xy chromaticity (the bridge's gamut C
//! coordinates) by asking an auxiliary chat model with a few-shot prompt.
//! Any failure resolves to a neutral warm white so a color command always
//! produces some actuation.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OpenAiConfig;
use crate::{Error, Result};

/// Warm room light, used whenever resolution fails
pub const DEFAULT_CHROMATICITY: Chromaticity = Chromaticity {
    x: 0.4994,
    y: 0.4153,
};

/// CIE xy chromaticity coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chromaticity {
    pub x: f64,
    pub y: f64,
}

impl Chromaticity {
    /// Whether both coordinates are finite and inside the unit square
    #[must_use]
    pub fn is_plausible(self) -> bool {
        [self.x, self.y]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

/// Single-turn text completion
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Complete a single user message and return the reply text
    ///
    /// # Errors
    ///
    /// Returns error if the completion service fails or replies with an error
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 1],
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionReply,
}

#[derive(Deserialize)]
struct CompletionReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions through the `OpenAI` API
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiCompletion {
    /// Create a completion client using the configured color model
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.color_model.clone(),
        })
    }
}

#[async_trait]
impl ChatCompletion for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [CompletionMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response: CompletionResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(Error::Completion(error.to_string()));
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Completion("response has no content".to_string()))
    }
}

/// Build the few-shot prompt for a color description
#[must_use]
pub fn color_prompt(description: &str) -> String {
    format!(
        r#"I'm going to give you a description of a color and you need to respond only with roughly that color in gamut C coords in JSON format.

## Examples:
Input: bluish green
Output: {{"x": "0.245", "y": "0.401"}}

Input: red
Output: {{"x": "0.640", "y": "0.330"}}

Input: warm room light
Output: {{"x": "0.4994", "y": "0.4153"}}


Input: {description}"#
    )
}

/// Parse a model reply into chromaticity
///
/// Accepts a single `{x, y}` object or an array of them (averaged), with
/// coordinates encoded as strings or numbers, optionally inside a fenced
/// code block. Returns `None` for anything else, including coordinates
/// outside the unit square.
#[must_use]
pub fn parse_chromaticity(reply: &str) -> Option<Chromaticity> {
    let value: Value = serde_json::from_str(strip_code_fence(reply)).ok()?;

    let xy = match value {
        Value::Array(items) => {
            let points = items
                .iter()
                .map(point_from_value)
                .collect::<Option<Vec<_>>>()?;
            average(&points)?
        }
        other => point_from_value(&other)?,
    };

    xy.is_plausible().then_some(xy)
}

fn point_from_value(value: &Value) -> Option<Chromaticity> {
    let object = value.as_object()?;
    Some(Chromaticity {
        x: coordinate(object.get("x")?)?,
        y: coordinate(object.get("y")?)?,
    })
}

fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn average(points: &[Chromaticity]) -> Option<Chromaticity> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    Some(Chromaticity {
        x: points.iter().map(|p| p.x).sum::<f64>() / n,
        y: points.iter().map(|p| p.y).sum::<f64>() / n,
    })
}

/// Unwrap a reply wrapped in a Markdown code fence
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the info string ("json") on the opening line
    inner
        .split_once('\n')
        .map_or(inner, |(_, body)| body)
        .trim()
}

/// Resolves color descriptions to chromaticity
pub struct ColorResolver {
    completion: Arc<dyn ChatCompletion>,
}

impl ColorResolver {
    /// Create a resolver over a completion collaborator
    #[must_use]
    pub fn new(completion: Arc<dyn ChatCompletion>) -> Self {
        Self { completion }
    }

    /// Resolve a color description
    ///
    /// Never fails: upstream errors and unparseable replies yield
    /// [`DEFAULT_CHROMATICITY`].
    pub async fn resolve(&self, description: &str) -> Chromaticity {
        let reply = match self.completion.complete(&color_prompt(description)).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(color = description, error = %e, "color resolution failed, using default");
                return DEFAULT_CHROMATICITY;
            }
        };

        if let Some(xy) = parse_chromaticity(&reply) {
            tracing::debug!(color = description, x = xy.x, y = xy.y, "color resolved");
            xy
        } else {
            tracing::warn!(color = description, reply = %reply, "failed to parse color response, using default");
            DEFAULT_CHROMATICITY
        }
    }
}
