//! Curriculum definitions: subjects, weighted domains, diagnostic layout.
//!
//! Loads curricula from TOML files and validates them. A reference curriculum
//! is embedded for use when no file is configured.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CurriculumError;
use crate::mastery::Mastery;
use crate::model::{Domain, FocusArea};

/// Target response time when a focus has no subject-specific target.
pub const DEFAULT_TARGET_SECS: u64 = 60;

/// A subject area with its domains and diagnostic slot layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    /// Label used in diagnostic instructions.
    pub label: String,
    /// Standard-tier response target for this subject's domains.
    pub target_response_secs: Option<u64>,
    /// Domain name per diagnostic question slot.
    pub distribution: Vec<String>,
    pub domains: Vec<Domain>,
}

/// Applied instead of scoring when a learner abandons the diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackProfile {
    pub weaknesses: Vec<String>,
    pub mastery: Mastery,
}

/// A complete curriculum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub name: String,
    pub subjects: Vec<Subject>,
    pub default_target_secs: u64,
    /// Countdown for the whole diagnostic battery.
    pub diagnostic_budget_secs: u64,
    pub fallback: FallbackProfile,
}

impl Curriculum {
    /// The embedded reference curriculum.
    pub fn reference() -> Result<Self> {
        parse_curriculum_str(REFERENCE_CURRICULUM, Path::new("<reference>"))
    }

    /// All domains in declaration order.
    pub fn domains(&self) -> Vec<Domain> {
        self.subjects
            .iter()
            .flat_map(|s| s.domains.iter().cloned())
            .collect()
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.subjects
            .iter()
            .flat_map(|s| s.domains.iter())
            .find(|d| d.name == name)
    }

    pub fn subject_of(&self, domain: &str) -> Option<&Subject> {
        self.subjects
            .iter()
            .find(|s| s.domains.iter().any(|d| d.name == domain))
    }

    /// Standard-tier response target for the given focus.
    pub fn target_response_time(&self, focus: &FocusArea) -> Duration {
        let secs = focus
            .domain()
            .and_then(|d| self.subject_of(d))
            .and_then(|s| s.target_response_secs)
            .unwrap_or(self.default_target_secs);
        Duration::from_secs(secs)
    }

    pub fn diagnostic_budget(&self) -> Duration {
        Duration::from_secs(self.diagnostic_budget_secs)
    }

    /// Total diagnostic question slots across subjects.
    pub fn diagnostic_slots(&self) -> usize {
        self.subjects.iter().map(|s| s.distribution.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// TOML parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TomlCurriculumFile {
    curriculum: TomlHeader,
    #[serde(default)]
    diagnostic: TomlDiagnostic,
    fallback: TomlFallback,
    #[serde(default)]
    subjects: Vec<TomlSubject>,
}

#[derive(Debug, Deserialize)]
struct TomlHeader {
    name: String,
    #[serde(default = "default_target_secs")]
    default_target_secs: u64,
}

fn default_target_secs() -> u64 {
    DEFAULT_TARGET_SECS
}

#[derive(Debug, Deserialize)]
struct TomlDiagnostic {
    #[serde(default = "default_budget_secs")]
    time_budget_secs: u64,
}

impl Default for TomlDiagnostic {
    fn default() -> Self {
        Self {
            time_budget_secs: default_budget_secs(),
        }
    }
}

fn default_budget_secs() -> u64 {
    25 * 60
}

#[derive(Debug, Deserialize)]
struct TomlFallback {
    #[serde(default)]
    weaknesses: Vec<String>,
    mastery: i64,
}

#[derive(Debug, Deserialize)]
struct TomlSubject {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    target_response_secs: Option<u64>,
    #[serde(default)]
    distribution: Vec<String>,
    #[serde(default)]
    domains: Vec<TomlDomain>,
}

#[derive(Debug, Deserialize)]
struct TomlDomain {
    name: String,
    weight: f64,
    #[serde(default)]
    skills: Vec<String>,
}

/// Parse a curriculum file.
pub fn load_curriculum(path: &Path) -> Result<Curriculum> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read curriculum file: {}", path.display()))?;

    parse_curriculum_str(&content, path)
}

/// Parse a TOML string into a `Curriculum` (useful for testing).
pub fn parse_curriculum_str(content: &str, source_path: &Path) -> Result<Curriculum> {
    let parsed: TomlCurriculumFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let subjects: Vec<Subject> = parsed
        .subjects
        .into_iter()
        .map(|s| {
            let domains = s
                .domains
                .into_iter()
                .map(|d| {
                    if !d.weight.is_finite() {
                        return Err(CurriculumError::Invalid(format!(
                            "domain '{}' has a non-finite weight",
                            d.name
                        )));
                    }
                    Ok(Domain {
                        name: d.name,
                        subject: s.name.clone(),
                        weight: d.weight,
                        skills: d.skills,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Subject {
                label: s.label.unwrap_or_else(|| s.name.clone()),
                name: s.name,
                target_response_secs: s.target_response_secs,
                distribution: s.distribution,
                domains,
            })
        })
        .collect::<Result<Vec<_>, CurriculumError>>()?;

    if subjects.iter().all(|s| s.domains.is_empty()) {
        return Err(CurriculumError::NoDomains)
            .with_context(|| format!("unusable curriculum: {}", source_path.display()));
    }

    let fallback_mastery = i32::try_from(parsed.fallback.mastery)
        .ok()
        .filter(|m| (0..=100).contains(m))
        .ok_or_else(|| {
            CurriculumError::Invalid(format!(
                "fallback mastery {} is outside 0..=100",
                parsed.fallback.mastery
            ))
        })?;

    Ok(Curriculum {
        name: parsed.curriculum.name,
        subjects,
        default_target_secs: parsed.curriculum.default_target_secs,
        diagnostic_budget_secs: parsed.diagnostic.time_budget_secs,
        fallback: FallbackProfile {
            weaknesses: parsed.fallback.weaknesses,
            mastery: Mastery::new(fallback_mastery),
        },
    })
}

/// A warning from curriculum validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The subject (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

const WEIGHT_SUM_TOLERANCE: f64 = 0.02;

/// Validate a curriculum for common issues.
pub fn validate_curriculum(curriculum: &Curriculum) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen = std::collections::HashSet::new();
    for subject in &curriculum.subjects {
        let warn = |message: String| ValidationWarning {
            subject: Some(subject.name.clone()),
            message,
        };

        if subject.domains.is_empty() {
            warnings.push(warn("subject declares no domains".into()));
            continue;
        }

        for domain in &subject.domains {
            if !seen.insert(domain.name.as_str()) {
                warnings.push(warn(format!("duplicate domain: {}", domain.name)));
            }
            if domain.weight <= 0.0 || domain.weight > 1.0 {
                warnings.push(warn(format!(
                    "domain '{}' weight {} is outside (0, 1]",
                    domain.name, domain.weight
                )));
            }
        }

        let sum: f64 = subject.domains.iter().map(|d| d.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warnings.push(warn(format!("domain weights sum to {sum:.2}, expected 1.00")));
        }

        if subject.distribution.is_empty() {
            warnings.push(warn("diagnostic distribution is empty".into()));
        }
        for slot in &subject.distribution {
            if !subject.domains.iter().any(|d| &d.name == slot) {
                warnings.push(warn(format!(
                    "distribution references unknown domain: {slot}"
                )));
            }
        }
    }

    for name in &curriculum.fallback.weaknesses {
        if curriculum.domain(name).is_none() {
            warnings.push(ValidationWarning {
                subject: None,
                message: format!("fallback weakness is not a declared domain: {name}"),
            });
        }
    }

    if curriculum.diagnostic_budget_secs == 0 {
        warnings.push(ValidationWarning {
            subject: None,
            message: "diagnostic time budget is zero".into(),
        });
    }

    warnings
}

/// Two subjects, eight domains, sixteen diagnostic slots.
pub const REFERENCE_CURRICULUM: &str = r#"
[curriculum]
name = "SAT"
default_target_secs = 60

[diagnostic]
time_budget_secs = 1500

[fallback]
weaknesses = ["Algebra", "Craft and Structure", "Standard English Conventions"]
mastery = 40

[[subjects]]
name = "Reading and Writing"
label = "Reading & Writing"
target_response_secs = 60
distribution = [
    "Craft and Structure", "Craft and Structure",
    "Information and Ideas", "Information and Ideas",
    "Standard English Conventions", "Standard English Conventions",
    "Expression of Ideas", "Expression of Ideas",
]

[[subjects.domains]]
name = "Craft and Structure"
weight = 0.28
skills = ["Words in Context", "Text Structure and Purpose", "Cross-Text Connections"]

[[subjects.domains]]
name = "Information and Ideas"
weight = 0.26
skills = ["Central Ideas and Details", "Inferences", "Command of Evidence"]

[[subjects.domains]]
name = "Standard English Conventions"
weight = 0.26
skills = ["Boundaries", "Form, Structure, and Sense"]

[[subjects.domains]]
name = "Expression of Ideas"
weight = 0.20
skills = ["Rhetorical Synthesis", "Transitions"]

[[subjects]]
name = "Math"
label = "Math"
target_response_secs = 90
distribution = [
    "Algebra", "Algebra", "Algebra",
    "Advanced Math", "Advanced Math", "Advanced Math",
    "Problem-Solving and Data Analysis",
    "Geometry and Trigonometry",
]

[[subjects.domains]]
name = "Algebra"
weight = 0.35
skills = [
    "Linear equations in one variable",
    "Linear functions",
    "Linear equations in two variables",
    "Systems of two linear equations in two variables",
    "Linear inequalities in one or two variables",
]

[[subjects.domains]]
name = "Advanced Math"
weight = 0.35
skills = [
    "Nonlinear functions",
    "Nonlinear equations in one variable",
    "Systems of equations in two variables",
    "Equivalent expressions",
]

[[subjects.domains]]
name = "Problem-Solving and Data Analysis"
weight = 0.15
skills = [
    "Ratios, rates, proportional relationships, and units",
    "Percentages",
    "One-variable data: Distributions and measures of center and spread",
    "Two-variable data: Models and scatterplots",
    "Probability and conditional probability",
    "Inference from sample statistics and margin of error",
    "Evaluating statistical claims: Observational studies and experiments",
]

[[subjects.domains]]
name = "Geometry and Trigonometry"
weight = 0.15
skills = [
    "Area and volume",
    "Lines, angles, and triangles",
    "Right triangles and trigonometry",
    "Circles",
]
"#;
