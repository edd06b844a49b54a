//! Content pipeline: instruction, generation with retry, sanitize, decode,
//! shape validation.
//!
//! Every structured path is all-or-nothing. A batch either decodes into the
//! exact number of well-formed questions or the call fails with a
//! [`ContentError`]; nothing is ever partially returned.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::curriculum::Curriculum;
use crate::error::{ContentError, DecodeError, ProviderError};
use crate::mastery::Mastery;
use crate::model::{PracticeQuestion, SkillTemplate, TutorContext, OPTION_COUNT};
use crate::prompt;
use crate::sanitizer::sanitize;
use crate::traits::{ContentGenerator, GenerateRequest, ReplyFormat};

/// Questions per drill batch.
pub const DRILL_BATCH_SIZE: usize = 5;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Raw text included in decode-failure logs is cut to this many characters.
const RAW_PREVIEW_CHARS: usize = 200;

/// Configuration for the content pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model override passed to the generator.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Retries on transient generation failures (not decode failures).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Whether decoded records must carry a `domain` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainTag {
    Optional,
    Required,
}

/// Issues content requests and turns replies into validated records.
#[derive(Clone)]
pub struct ContentPipeline {
    generator: Arc<dyn ContentGenerator>,
    config: PipelineConfig,
}

impl ContentPipeline {
    pub fn new(generator: Arc<dyn ContentGenerator>, config: PipelineConfig) -> Self {
        Self { generator, config }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Request one drill batch of [`DRILL_BATCH_SIZE`] questions.
    #[instrument(skip(self, template), fields(provider = %self.generator.name(), mastery = mastery.value()))]
    pub async fn request_drill_batch(
        &self,
        topic: &str,
        mastery: Mastery,
        template: Option<&SkillTemplate>,
    ) -> Result<Vec<PracticeQuestion>, ContentError> {
        let instruction = prompt::drill_instruction(topic, mastery.tier(), template, DRILL_BATCH_SIZE);
        let raw = self.generate(instruction, ReplyFormat::Structured).await?;
        decode_logged(&raw, DRILL_BATCH_SIZE, DomainTag::Optional)
    }

    /// Request one domain-tagged diagnostic batch, one question per slot.
    ///
    /// Returned tags are kept as generated even when they differ from the
    /// requested slot.
    #[instrument(skip(self, distribution), fields(provider = %self.generator.name(), slots = distribution.len()))]
    pub async fn request_diagnostic_batch(
        &self,
        subject_label: &str,
        distribution: &[String],
    ) -> Result<Vec<PracticeQuestion>, ContentError> {
        if distribution.is_empty() {
            return Ok(Vec::new());
        }
        let instruction = prompt::diagnostic_instruction(subject_label, distribution);
        let raw = self.generate(instruction, ReplyFormat::Structured).await?;
        decode_logged(&raw, distribution.len(), DomainTag::Required)
    }

    /// Request every subject's diagnostic batch concurrently and concatenate
    /// them in subject declaration order. Fails if any batch fails.
    #[instrument(skip_all, fields(curriculum = %curriculum.name))]
    pub async fn request_full_diagnostic(
        &self,
        curriculum: &Curriculum,
    ) -> Result<Vec<PracticeQuestion>, ContentError> {
        let batches = try_join_all(
            curriculum
                .subjects
                .iter()
                .map(|s| self.request_diagnostic_batch(&s.label, &s.distribution)),
        )
        .await?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// Ask the tutor about an answered question. The reply is plain text and
    /// skips sanitizing and decoding.
    #[instrument(skip_all, fields(provider = %self.generator.name()))]
    pub async fn request_tutor_reply(
        &self,
        context: &TutorContext,
        learner_message: &str,
    ) -> Result<String, ContentError> {
        let instruction = prompt::tutor_instruction(context, learner_message);
        let raw = self.generate(instruction, ReplyFormat::PlainText).await?;
        let reply = raw.trim();
        if reply.is_empty() {
            return Err(ContentError::EmptyResponse);
        }
        Ok(reply.to_string())
    }

    async fn generate(
        &self,
        instruction: String,
        reply_format: ReplyFormat,
    ) -> Result<String, ContentError> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            instruction,
            reply_format,
            temperature: self.config.temperature,
        };

        // Retry on transient provider errors with exponential backoff
        let mut retry_delay = self.config.retry_delay;
        let mut last_error = ContentError::EmptyResponse;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match self.generator.generate(&request).await {
                Ok(response) if response.content.trim().is_empty() => {
                    tracing::warn!(attempt, "generator returned an empty reply");
                    last_error = ContentError::EmptyResponse;
                }
                Ok(response) => {
                    tracing::debug!(
                        model = %response.model,
                        latency_ms = response.latency_ms,
                        bytes = response.content.len(),
                        "generation complete"
                    );
                    return Ok(response.content);
                }
                Err(e) => {
                    let provider_error = e.downcast_ref::<ProviderError>();
                    if provider_error.is_some_and(ProviderError::is_permanent) {
                        return Err(ContentError::Generation(format!("{e:#}")));
                    }
                    // Use provider's retry-after hint if available
                    if let Some(ms) = provider_error.and_then(ProviderError::retry_after_ms) {
                        retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                    tracing::warn!(attempt, "generation attempt failed: {e:#}");
                    last_error = match provider_error {
                        Some(ProviderError::EmptyContent) => ContentError::EmptyResponse,
                        _ => ContentError::Generation(format!("{e:#}")),
                    };
                }
            }
        }

        Err(last_error)
    }
}

fn decode_logged(
    raw: &str,
    expected: usize,
    tag: DomainTag,
) -> Result<Vec<PracticeQuestion>, ContentError> {
    decode_questions(raw, expected, tag).map_err(|e| {
        let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
        tracing::error!(error = %e, raw = %preview, "failed to decode generated questions");
        ContentError::Decode(e)
    })
}

/// Record shape as generators emit it, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    #[serde(default)]
    domain: Option<String>,
    question: String,
    options: Vec<String>,
    correct_index: i64,
    explanation: String,
}

impl WireQuestion {
    fn validate(self, tag: DomainTag) -> Result<PracticeQuestion, String> {
        if self.question.trim().is_empty() {
            return Err("question text is empty".into());
        }
        let options: [String; OPTION_COUNT] = self
            .options
            .try_into()
            .map_err(|o: Vec<String>| format!("expected {OPTION_COUNT} options, got {}", o.len()))?;
        let correct_index = usize::try_from(self.correct_index)
            .ok()
            .filter(|i| *i < OPTION_COUNT)
            .ok_or_else(|| format!("correctIndex {} is out of range", self.correct_index))?;
        let domain = self
            .domain
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if tag == DomainTag::Required && domain.is_none() {
            return Err("missing domain tag".into());
        }
        Ok(PracticeQuestion {
            domain,
            prompt: self.question,
            options,
            correct_index,
            explanation: self.explanation,
        })
    }
}

/// Sanitize, decode, and validate a structured reply into exactly `expected`
/// questions.
pub fn decode_questions(
    raw: &str,
    expected: usize,
    tag: DomainTag,
) -> Result<Vec<PracticeQuestion>, DecodeError> {
    let sanitized = sanitize(raw);
    let value: Value =
        serde_json::from_str(&sanitized).map_err(|e| DecodeError::Syntax(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(DecodeError::NotASequence);
    };
    if items.len() != expected {
        return Err(DecodeError::WrongLength {
            expected,
            actual: items.len(),
        });
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let wire: WireQuestion = serde_json::from_value(item)
                .map_err(|e| DecodeError::InvalidRecord {
                    index,
                    reason: e.to_string(),
                })?;
            wire.validate(tag)
                .map_err(|reason| DecodeError::InvalidRecord { index, reason })
        })
        .collect()
}
