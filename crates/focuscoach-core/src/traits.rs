//! Collaborator traits: content generation, the learner store, template
//! lookup, and diagnostic scoring.
//!
//! The async traits are implemented by the `focuscoach-providers` and
//! `focuscoach-store` crates respectively.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::PersistenceError;
use crate::model::{
    AnswerRecord, AttemptRecord, LearnerProfile, NewProfile, ProfileUpdate, Role, SkillTemplate,
};
use crate::scoring::DiagnosticReport;

// ---------------------------------------------------------------------------
// Content generation
// ---------------------------------------------------------------------------

/// Trait for generative backends that turn an instruction into text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate a whole response for one instruction. No streaming.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

/// What kind of reply the instruction expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    /// Structured (JSON) data.
    #[default]
    Structured,
    /// Plain text or markdown.
    PlainText,
}

/// Request to generate content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model override; providers fall back to their configured model.
    #[serde(default)]
    pub model: Option<String>,
    /// The natural-language instruction.
    pub instruction: String,
    #[serde(default)]
    pub reply_format: ReplyFormat,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response text.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Filter for live profile queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileFilter {
    /// Profiles owned by one authenticated identity.
    Identity(String),
    Role(Role),
    All,
}

impl ProfileFilter {
    pub fn matches(&self, profile: &LearnerProfile) -> bool {
        match self {
            ProfileFilter::Identity(identity) => &profile.identity == identity,
            ProfileFilter::Role(role) => profile.role == *role,
            ProfileFilter::All => true,
        }
    }
}

/// Persistent store for learner profiles and attempt logs.
///
/// Records are never deleted through this trait, and no call needs a
/// multi-record transaction.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Create a profile and return it with its assigned id.
    async fn create_profile(&self, profile: NewProfile) -> Result<LearnerProfile, PersistenceError>;

    /// Write only the fields present in `update`.
    async fn update_profile(&self, id: &str, update: &ProfileUpdate)
        -> Result<(), PersistenceError>;

    /// Live filtered query. The receiver holds the current ordered snapshot and
    /// is notified on every change affecting it.
    async fn watch_profiles(
        &self,
        filter: ProfileFilter,
    ) -> Result<watch::Receiver<Vec<LearnerProfile>>, PersistenceError>;

    /// Append an attempt record to the log.
    async fn append_attempt(&self, record: &AttemptRecord) -> Result<(), PersistenceError>;
}

/// Read-only lookup of authoring templates, keyed by domain name.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// `Ok(None)` when no template exists for the domain.
    async fn template_for(&self, domain: &str) -> anyhow::Result<Option<SkillTemplate>>;
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Converts recorded diagnostic answers into a ranked report.
pub trait DiagnosticScoring: Send + Sync {
    fn score(&self, answers: &[AnswerRecord]) -> DiagnosticReport;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn filter_matching() {
        let profile = NewProfile {
            identity: "uid-9".into(),
            name: "Grace".into(),
            email: None,
            role: Role::Student,
        }
        .into_profile("p".into(), Utc::now());

        assert!(ProfileFilter::Identity("uid-9".into()).matches(&profile));
        assert!(!ProfileFilter::Identity("uid-1".into()).matches(&profile));
        assert!(ProfileFilter::Role(Role::Student).matches(&profile));
        assert!(!ProfileFilter::Role(Role::Counselor).matches(&profile));
        assert!(ProfileFilter::All.matches(&profile));
    }

    #[test]
    fn request_defaults_to_structured() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"instruction":"hi","temperature":0.7}"#).unwrap();
        assert_eq!(request.reply_format, ReplyFormat::Structured);
        assert!(request.model.is_none());
    }
}
