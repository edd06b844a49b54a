//! Core data model types for focuscoach.
//!
//! Learner profiles, skill templates, generated questions, and the records
//! emitted toward the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mastery::{Mastery, Tier};

/// Number of options every practice question carries.
pub const OPTION_COUNT: usize = 4;

/// A named skill grouping with a fixed urgency weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    /// Subject this domain belongs to (e.g. "Math").
    pub subject: String,
    /// Urgency weight in `(0, 1]`.
    pub weight: f64,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// What the learner is currently assigned to practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    /// Profile created, diagnostic not taken yet.
    PendingDiagnostic,
    /// Neutral sentinel applied when the diagnostic is abandoned.
    GeneralPractice,
    Domain(String),
}

impl FocusArea {
    pub fn domain(&self) -> Option<&str> {
        match self {
            FocusArea::Domain(name) => Some(name),
            _ => None,
        }
    }

    /// Text used as the topic of drill instructions and attempt logs.
    pub fn label(&self) -> &str {
        match self {
            FocusArea::PendingDiagnostic => "Pending Diagnostic",
            FocusArea::GeneralPractice => "General Practice",
            FocusArea::Domain(name) => name,
        }
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Counselor,
    Author,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Counselor => write!(f, "counselor"),
            Role::Author => write!(f, "author"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "counselor" => Ok(Role::Counselor),
            "author" | "teacher" => Ok(Role::Author),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A learner profile as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Store-assigned record id.
    pub id: String,
    /// Authenticated identity the profile belongs to.
    pub identity: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub focus: FocusArea,
    pub mastery: Mastery,
    /// Completed drill batches.
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub diagnostic_completed: bool,
    /// Domain names, most urgent first.
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    /// Mastery seeded by the diagnostic, kept for progress reporting.
    #[serde(default)]
    pub initial_mastery: Option<Mastery>,
}

impl LearnerProfile {
    pub fn tier(&self) -> Tier {
        self.mastery.tier()
    }
}

/// Data needed to create a profile on first login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub identity: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl NewProfile {
    /// Materialize with first-login defaults.
    pub fn into_profile(self, id: String, now: DateTime<Utc>) -> LearnerProfile {
        LearnerProfile {
            id,
            identity: self.identity,
            name: self.name,
            email: self.email.filter(|e| !e.trim().is_empty()),
            role: self.role,
            focus: FocusArea::PendingDiagnostic,
            mastery: Mastery::MIN,
            streak: 0,
            diagnostic_completed: false,
            weaknesses: Vec::new(),
            last_active: Some(now),
            initial_mastery: None,
        }
    }
}

/// Partial-field update intent. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<FocusArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery: Option<Mastery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_mastery: Option<Mastery>,
}

impl ProfileUpdate {
    pub fn mastery(mut self, mastery: Mastery) -> Self {
        self.mastery = Some(mastery);
        self
    }

    pub fn focus(mut self, focus: FocusArea) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn streak(mut self, streak: u32) -> Self {
        self.streak = Some(streak);
        self
    }

    pub fn diagnostic_completed(mut self, done: bool) -> Self {
        self.diagnostic_completed = Some(done);
        self
    }

    pub fn weaknesses(mut self, weaknesses: Vec<String>) -> Self {
        self.weaknesses = Some(weaknesses);
        self
    }

    pub fn last_active(mut self, at: DateTime<Utc>) -> Self {
        self.last_active = Some(at);
        self
    }

    pub fn initial_mastery(mut self, mastery: Mastery) -> Self {
        self.initial_mastery = Some(mastery);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    /// Write the present fields onto `profile`, leaving the rest untouched.
    pub fn apply_to(&self, profile: &mut LearnerProfile) {
        if let Some(focus) = &self.focus {
            profile.focus = focus.clone();
        }
        if let Some(mastery) = self.mastery {
            profile.mastery = mastery;
        }
        if let Some(streak) = self.streak {
            profile.streak = streak;
        }
        if let Some(done) = self.diagnostic_completed {
            profile.diagnostic_completed = done;
        }
        if let Some(weaknesses) = &self.weaknesses {
            profile.weaknesses = weaknesses.clone();
        }
        if let Some(at) = self.last_active {
            profile.last_active = Some(at);
        }
        if let Some(initial) = self.initial_mastery {
            profile.initial_mastery = Some(initial);
        }
    }
}

/// One generated multiple-choice item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuestion {
    /// Domain tag; present on diagnostic questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    pub correct_index: usize,
    #[serde(rename = "explanation")]
    pub explanation: String,
}

impl PracticeQuestion {
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_index
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }
}

/// One answer recorded during a diagnostic run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub domain: String,
    pub correct: bool,
}

impl AnswerRecord {
    pub fn new(domain: impl Into<String>, correct: bool) -> Self {
        Self {
            domain: domain.into(),
            correct,
        }
    }
}

/// Append-only log entry for one drill answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub learner_id: String,
    pub learner_name: String,
    /// Focus label the drill targeted.
    pub domain: String,
    pub question: String,
    pub correct: bool,
    pub time_spent_secs: f64,
    pub was_fast: bool,
    pub recorded_at: DateTime<Utc>,
}

/// A reference example inside a skill template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateExample {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub correct: String,
    /// The trap the wrong answers exploit.
    #[serde(default)]
    pub logic: String,
}

/// Per-domain authoring data used to bias drill generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTemplate {
    /// Domain (or skill) name the template is keyed by.
    pub domain: String,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub base_prompt: Option<String>,
    /// Un-tiered examples, used when no tiered list applies.
    #[serde(default)]
    pub examples: Vec<TemplateExample>,
    #[serde(default)]
    pub examples_level1: Vec<TemplateExample>,
    #[serde(default)]
    pub examples_level2: Vec<TemplateExample>,
    #[serde(default)]
    pub examples_level3: Vec<TemplateExample>,
}

impl SkillTemplate {
    /// Tier-specific examples, then the un-tiered list, then nothing.
    pub fn examples_for(&self, tier: Tier) -> &[TemplateExample] {
        let tiered = match tier {
            Tier::Foundational => &self.examples_level1,
            Tier::Standard => &self.examples_level2,
            Tier::Elite => &self.examples_level3,
        };
        if !tiered.is_empty() {
            tiered
        } else {
            &self.examples
        }
    }
}

/// Question context handed to the tutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorContext {
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    pub correct_index: usize,
    pub selected_index: usize,
}

impl TutorContext {
    pub fn for_answer(question: &PracticeQuestion, selected_index: usize) -> Self {
        Self {
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            correct_index: question.correct_index,
            selected_index,
        }
    }
}

/// Who said a line in the tutor chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Learner,
    Tutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> LearnerProfile {
        NewProfile {
            identity: "uid-1".into(),
            name: "Ada".into(),
            email: Some("  ".into()),
            role: Role::Student,
        }
        .into_profile("p-1".into(), Utc::now())
    }

    #[test]
    fn new_profile_defaults() {
        let p = profile();
        assert_eq!(p.focus, FocusArea::PendingDiagnostic);
        assert_eq!(p.mastery, Mastery::MIN);
        assert_eq!(p.streak, 0);
        assert!(!p.diagnostic_completed);
        assert!(p.weaknesses.is_empty());
        assert!(p.email.is_none(), "blank email should be dropped");
    }

    #[test]
    fn partial_update_leaves_other_fields() {
        let mut p = profile();
        p.streak = 7;
        p.weaknesses = vec!["Algebra".into()];

        ProfileUpdate::default()
            .mastery(Mastery::new(55))
            .apply_to(&mut p);

        assert_eq!(p.mastery.value(), 55);
        assert_eq!(p.streak, 7);
        assert_eq!(p.weaknesses, vec!["Algebra".to_string()]);
        assert!(ProfileUpdate::default().is_empty());
        assert!(!ProfileUpdate::default().streak(1).is_empty());
    }

    #[test]
    fn focus_labels() {
        assert_eq!(FocusArea::GeneralPractice.to_string(), "General Practice");
        assert_eq!(FocusArea::PendingDiagnostic.label(), "Pending Diagnostic");
        let algebra = FocusArea::Domain("Algebra".into());
        assert_eq!(algebra.domain(), Some("Algebra"));
        assert_eq!(FocusArea::GeneralPractice.domain(), None);
    }

    #[test]
    fn role_parse() {
        assert_eq!("Student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Author);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn question_uses_generator_field_names() {
        let json = r#"{"domain":"Algebra","question":"2+2?","options":["1","2","3","4"],"correctIndex":3,"explanation":"sum"}"#;
        let q: PracticeQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(q.prompt, "2+2?");
        assert_eq!(q.correct_option(), "4");
        assert!(q.is_correct(3));
        assert!(!q.is_correct(0));
    }

    #[test]
    fn template_example_fallback_order() {
        let example = |q: &str| TemplateExample {
            question: q.into(),
            ..Default::default()
        };
        let template = SkillTemplate {
            domain: "Algebra".into(),
            examples: vec![example("plain")],
            examples_level2: vec![example("tier2")],
            ..Default::default()
        };
        assert_eq!(template.examples_for(Tier::Standard)[0].question, "tier2");
        assert_eq!(template.examples_for(Tier::Elite)[0].question, "plain");

        let bare = SkillTemplate {
            domain: "Algebra".into(),
            ..Default::default()
        };
        assert!(bare.examples_for(Tier::Foundational).is_empty());
    }
}
