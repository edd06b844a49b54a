//! Diagnostic scoring: per-domain accuracy, urgency ranking, initial mastery.
//!
//! Urgency = (1 - accuracy) * domain weight. Priorities are sorted by urgency
//! descending with ties kept in curriculum declaration order.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::error::CurriculumError;
use crate::mastery::Mastery;
use crate::model::{AnswerRecord, Domain};
use crate::traits::DiagnosticScoring;

/// Initial mastery never drops below this, so a fresh progress bar is visible.
pub const INITIAL_MASTERY_FLOOR: i32 = 5;

/// Ranked result for a single domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPriority {
    pub domain: String,
    /// Fraction of answered questions that were correct; 0 when none answered.
    pub accuracy: f64,
    pub urgency: f64,
    pub correct: u32,
    pub total: u32,
}

/// Outcome of scoring a diagnostic run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub primary_focus: String,
    /// One entry per configured domain, most urgent first.
    pub priorities: Vec<DomainPriority>,
    pub initial_mastery: Mastery,
    /// Answers whose domain matched no configured domain.
    #[serde(default)]
    pub ignored_answers: usize,
}

impl DiagnosticReport {
    /// Domain names ordered by urgency.
    pub fn weaknesses(&self) -> Vec<String> {
        self.priorities.iter().map(|p| p.domain.clone()).collect()
    }

    pub fn priority(&self, domain: &str) -> Option<&DomainPriority> {
        self.priorities.iter().find(|p| p.domain == domain)
    }

    pub fn total_urgency(&self) -> f64 {
        self.priorities.iter().map(|p| p.urgency).sum()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: DiagnosticReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    correct: u32,
    total: u32,
}

/// Scores diagnostic answers against a fixed, non-empty domain set.
#[derive(Debug, Clone)]
pub struct DiagnosticScorer {
    domains: Vec<Domain>,
}

impl DiagnosticScorer {
    pub fn new(domains: Vec<Domain>) -> Result<Self, CurriculumError> {
        if domains.is_empty() {
            return Err(CurriculumError::NoDomains);
        }
        Ok(Self { domains })
    }

    pub fn from_curriculum(curriculum: &Curriculum) -> Result<Self, CurriculumError> {
        Self::new(curriculum.domains())
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }
}

impl DiagnosticScoring for DiagnosticScorer {
    fn score(&self, answers: &[AnswerRecord]) -> DiagnosticReport {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, domain) in self.domains.iter().enumerate() {
            index.entry(domain.name.as_str()).or_insert(i);
        }

        let mut tallies = vec![Tally::default(); self.domains.len()];
        let mut ignored_answers = 0usize;
        for answer in answers {
            match index.get(answer.domain.as_str()) {
                Some(&i) => {
                    tallies[i].total += 1;
                    if answer.correct {
                        tallies[i].correct += 1;
                    }
                }
                None => {
                    tracing::debug!(domain = %answer.domain, "ignoring answer for unknown domain");
                    ignored_answers += 1;
                }
            }
        }
        if ignored_answers > 0 {
            tracing::warn!(
                ignored_answers,
                "diagnostic answers tagged with unknown domains were dropped"
            );
        }

        let mut priorities: Vec<DomainPriority> = self
            .domains
            .iter()
            .zip(&tallies)
            .map(|(domain, tally)| {
                let accuracy = if tally.total == 0 {
                    0.0
                } else {
                    f64::from(tally.correct) / f64::from(tally.total)
                };
                DomainPriority {
                    domain: domain.name.clone(),
                    accuracy,
                    urgency: (1.0 - accuracy) * domain.weight,
                    correct: tally.correct,
                    total: tally.total,
                }
            })
            .collect();

        // Vec::sort_by is stable: equal urgencies keep declaration order
        priorities.sort_by(|a, b| b.urgency.total_cmp(&a.urgency));

        // The constructor rejects empty domain sets
        let top = &priorities[0];
        let initial = ((top.accuracy * 100.0).round() as i32).max(INITIAL_MASTERY_FLOOR);

        DiagnosticReport {
            primary_focus: top.domain.clone(),
            initial_mastery: Mastery::new(initial),
            priorities,
            ignored_answers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(name: &str, weight: f64) -> Domain {
        Domain {
            name: name.into(),
            subject: "Test".into(),
            weight,
            skills: vec![],
        }
    }

    fn scorer(domains: &[(&str, f64)]) -> DiagnosticScorer {
        DiagnosticScorer::new(domains.iter().map(|(n, w)| domain(n, *w)).collect()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn weighted_example_picks_b_with_floored_mastery() {
        let s = scorer(&[("A", 0.3), ("B", 0.7)]);
        let report = s.score(&[
            AnswerRecord::new("A", true),
            AnswerRecord::new("A", false),
            AnswerRecord::new("B", false),
        ]);

        assert_eq!(report.primary_focus, "B");
        assert_eq!(report.priorities[0].domain, "B");
        assert!(close(report.priorities[0].accuracy, 0.0));
        assert!(close(report.priorities[0].urgency, 0.7));

        let a = report.priority("A").unwrap();
        assert!(close(a.accuracy, 0.5));
        assert!(close(a.urgency, 0.15));
        assert_eq!(report.initial_mastery.value(), 5);
    }

    #[test]
    fn no_answers_ranks_by_weight() {
        let s = scorer(&[("Low", 0.2), ("High", 0.5), ("Mid", 0.3)]);
        let report = s.score(&[]);

        assert_eq!(report.primary_focus, "High");
        assert_eq!(report.weaknesses(), vec!["High", "Mid", "Low"]);
        for p in &report.priorities {
            assert!(close(p.accuracy, 0.0));
            assert_eq!(p.total, 0);
        }
        assert!(close(report.priorities[1].urgency, 0.3));
        assert_eq!(report.initial_mastery.value(), 5);
    }

    #[test]
    fn ties_keep_declaration_order() {
        let c = Curriculum::reference().unwrap();
        let s = DiagnosticScorer::from_curriculum(&c).unwrap();
        let report = s.score(&[]);
        // Algebra and Advanced Math share the top weight; Algebra is declared first
        assert_eq!(report.primary_focus, "Algebra");
        assert_eq!(report.priorities[1].domain, "Advanced Math");
        assert_eq!(report.priorities.len(), 8);
    }

    #[test]
    fn all_correct_ranks_by_declaration_order() {
        let c = Curriculum::reference().unwrap();
        let s = DiagnosticScorer::from_curriculum(&c).unwrap();
        let answers: Vec<AnswerRecord> = c
            .subjects
            .iter()
            .flat_map(|subject| subject.distribution.iter())
            .map(|domain| AnswerRecord::new(domain.as_str(), true))
            .collect();
        assert_eq!(answers.len(), 16);

        let report = s.score(&answers);
        // every urgency is zero, so the order is the declaration order
        assert!(report.priorities.iter().all(|p| close(p.urgency, 0.0)));
        assert_eq!(report.primary_focus, "Craft and Structure");
        assert_eq!(
            report.weaknesses(),
            vec![
                "Craft and Structure",
                "Information and Ideas",
                "Standard English Conventions",
                "Expression of Ideas",
                "Algebra",
                "Advanced Math",
                "Problem-Solving and Data Analysis",
                "Geometry and Trigonometry",
            ]
        );
        assert_eq!(report.initial_mastery.value(), 100);
    }

    #[test]
    fn unanswered_questions_lower_total_not_accuracy() {
        // Battery had slots [A, A, B]; only the first was answered before time ran out
        let s = scorer(&[("A", 0.3), ("B", 0.7)]);
        let report = s.score(&[AnswerRecord::new("A", true)]);

        let a = report.priority("A").unwrap();
        assert_eq!((a.correct, a.total), (1, 1));
        assert!(close(a.accuracy, 1.0));
        assert!(close(a.urgency, 0.0));

        let b = report.priority("B").unwrap();
        assert_eq!(b.total, 0);
        assert!(close(b.urgency, 0.7));
        assert_eq!(report.primary_focus, "B");
    }

    #[test]
    fn unknown_domains_are_ignored_and_counted() {
        let s = scorer(&[("A", 0.5), ("B", 0.5)]);
        let report = s.score(&[
            AnswerRecord::new("A", true),
            AnswerRecord::new("Geometry", false),
            AnswerRecord::new("B", true),
        ]);
        assert_eq!(report.ignored_answers, 1);
        assert_eq!(
            report.priorities.iter().map(|p| p.total).sum::<u32>(),
            2
        );
    }

    #[test]
    fn initial_mastery_rounds_top_accuracy() {
        let s = scorer(&[("A", 0.9), ("B", 0.1)]);
        let report = s.score(&[
            AnswerRecord::new("A", true),
            AnswerRecord::new("A", true),
            AnswerRecord::new("A", false),
            AnswerRecord::new("B", false),
        ]);
        // A: accuracy 2/3, urgency 0.3; B: urgency 0.1
        assert_eq!(report.primary_focus, "A");
        assert_eq!(report.initial_mastery.value(), 67);
        assert!(report.initial_mastery.value() as i32 >= INITIAL_MASTERY_FLOOR);
    }

    #[test]
    fn scoring_is_deterministic() {
        let s = scorer(&[("A", 0.25), ("B", 0.25), ("C", 0.5)]);
        let answers = vec![
            AnswerRecord::new("C", true),
            AnswerRecord::new("B", false),
            AnswerRecord::new("A", true),
            AnswerRecord::new("C", false),
        ];
        let first = s.score(&answers);
        let second = s.score(&answers);
        assert_eq!(first, second);
        assert_eq!(first.total_urgency(), second.total_urgency());
        assert_eq!(first.primary_focus, first.priorities[0].domain);
    }

    #[test]
    fn rejects_empty_domain_set() {
        assert!(matches!(
            DiagnosticScorer::new(vec![]),
            Err(CurriculumError::NoDomains)
        ));
    }

    #[test]
    fn report_json_roundtrip_on_disk() {
        let s = scorer(&[("A", 0.3), ("B", 0.7)]);
        let report = s.score(&[AnswerRecord::new("A", false)]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("diagnostic.json");
        report.save_json(&path).unwrap();
        let loaded = DiagnosticReport::load_json(&path).unwrap();
        assert_eq!(loaded, report);
    }
}
