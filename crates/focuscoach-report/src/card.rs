//! Diagnostic report card rendering.
//!
//! Produces a plain-text card for the terminal and a markdown card for
//! sharing. Both show the primary focus, how the learner did there, and a
//! bar per domain.

use std::path::Path;

use anyhow::{Context, Result};

use focuscoach_core::curriculum::Curriculum;
use focuscoach_core::scoring::DiagnosticReport;

/// Bars never shrink below this fraction so a 0% domain stays visible.
const BAR_FLOOR: f64 = 0.05;
const BAR_WIDTH: usize = 20;

/// Accuracy as a whole percentage.
fn percent(fraction: f64) -> u32 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Weight of `domain` as a share of its subject's total weight.
pub fn subject_share(curriculum: &Curriculum, domain: &str) -> Option<f64> {
    let subject = curriculum.subject_of(domain)?;
    let total: f64 = subject.domains.iter().map(|d| d.weight).sum();
    let weight = subject.domains.iter().find(|d| d.name == domain)?.weight;
    if total > 0.0 {
        Some(weight / total)
    } else {
        None
    }
}

/// Filled cells of an accuracy bar, floored at [`BAR_FLOOR`].
fn bar_cells(accuracy: f64) -> usize {
    let fill = accuracy.clamp(0.0, 1.0).max(BAR_FLOOR);
    ((fill * BAR_WIDTH as f64).round() as usize).clamp(1, BAR_WIDTH)
}

fn text_bar(accuracy: f64) -> String {
    let filled = bar_cells(accuracy);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn focus_summary(report: &DiagnosticReport, curriculum: &Curriculum) -> (u32, Option<u32>, String) {
    let accuracy = report
        .priority(&report.primary_focus)
        .map(|p| percent(p.accuracy))
        .unwrap_or(0);
    let share = subject_share(curriculum, &report.primary_focus).map(percent);
    let subject = curriculum
        .subject_of(&report.primary_focus)
        .map(|s| s.name.clone())
        .unwrap_or_default();
    (accuracy, share, subject)
}

/// Render the report card as terminal text.
pub fn render_text(report: &DiagnosticReport, curriculum: &Curriculum) -> String {
    let (accuracy, share, subject) = focus_summary(report, curriculum);
    let mut out = String::new();

    out.push_str("DIAGNOSTIC REPORT\n");
    out.push_str(&format!("Primary focus: {}\n", report.primary_focus));
    out.push_str(&format!("  You scored {accuracy}% in this domain.\n"));
    if let Some(share) = share {
        out.push_str(&format!("  It carries {share}% of the {subject} section.\n"));
    }
    out.push_str(&format!("Starting mastery: {}\n\n", report.initial_mastery));

    let name_width = report
        .priorities
        .iter()
        .map(|p| p.domain.chars().count())
        .max()
        .unwrap_or(0);
    for p in &report.priorities {
        out.push_str(&format!(
            "{:<name_width$}  {} {:>3}%  ({}/{})\n",
            p.domain,
            text_bar(p.accuracy),
            percent(p.accuracy),
            p.correct,
            p.total
        ));
    }
    if report.ignored_answers > 0 {
        out.push_str(&format!(
            "\n{} answer(s) were tagged with an unknown domain and not scored.\n",
            report.ignored_answers
        ));
    }
    out
}

/// Render the report card as markdown.
pub fn render_markdown(report: &DiagnosticReport, curriculum: &Curriculum) -> String {
    let (accuracy, share, subject) = focus_summary(report, curriculum);
    let mut md = String::new();

    md.push_str("# Diagnostic report\n\n");
    md.push_str(&format!("**Primary focus:** {}\n\n", report.primary_focus));
    md.push_str(&format!("- Accuracy in this domain: {accuracy}%\n"));
    if let Some(share) = share {
        md.push_str(&format!("- Weight in the {subject} section: {share}%\n"));
    }
    md.push_str(&format!("- Starting mastery: {}\n\n", report.initial_mastery));

    md.push_str("| Domain | Accuracy | Correct | Urgency |\n");
    md.push_str("|---|---|---|---|\n");
    for p in &report.priorities {
        md.push_str(&format!(
            "| {} | {} {}% | {}/{} | {:.3} |\n",
            p.domain,
            text_bar(p.accuracy),
            percent(p.accuracy),
            p.correct,
            p.total,
            p.urgency
        ));
    }
    md
}

/// Write the card to `path`; the extension picks markdown (`.md`),
/// JSON (`.json`) or plain text.
pub fn write_report_card(
    report: &DiagnosticReport,
    curriculum: &Curriculum,
    path: &Path,
) -> Result<()> {
    let body = match path.extension().and_then(|e| e.to_str()) {
        Some("md") => render_markdown(report, curriculum),
        Some("json") => {
            return report.save_json(path);
        }
        _ => render_text(report, curriculum),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)
        .with_context(|| format!("failed to write report card: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use focuscoach_core::model::AnswerRecord;
    use focuscoach_core::scoring::DiagnosticScorer;
    use focuscoach_core::traits::DiagnosticScoring;

    fn report() -> (DiagnosticReport, Curriculum) {
        let curriculum = Curriculum::reference().unwrap();
        let scorer = DiagnosticScorer::from_curriculum(&curriculum).unwrap();
        let answers = vec![
            AnswerRecord::new("Algebra", false),
            AnswerRecord::new("Algebra", false),
            AnswerRecord::new("Algebra", true),
            AnswerRecord::new("Geometry and Trigonometry", true),
        ];
        (scorer.score(&answers), curriculum)
    }

    #[test]
    fn bars_are_floored() {
        assert_eq!(bar_cells(0.0), 1);
        assert_eq!(bar_cells(0.5), 10);
        assert_eq!(bar_cells(1.0), BAR_WIDTH);
        assert_eq!(text_bar(0.0).chars().count(), BAR_WIDTH);
    }

    #[test]
    fn subject_share_of_reference_domains() {
        let curriculum = Curriculum::reference().unwrap();
        let share = subject_share(&curriculum, "Algebra").unwrap();
        assert!((share - 0.35).abs() < 1e-9);
        assert!(subject_share(&curriculum, "Underwater Basket Weaving").is_none());
    }

    #[test]
    fn text_card_names_focus_and_every_domain() {
        let (report, curriculum) = report();
        let text = render_text(&report, &curriculum);
        assert!(text.contains(&format!("Primary focus: {}", report.primary_focus)));
        for p in &report.priorities {
            assert!(text.contains(&p.domain));
        }
        assert!(text.contains("Algebra"));
        assert!(text.contains("(1/3)"));
        assert!(!text.contains("unknown domain"));
    }

    #[test]
    fn markdown_card_has_table() {
        let (report, curriculum) = report();
        let md = render_markdown(&report, &curriculum);
        assert!(md.starts_with("# Diagnostic report"));
        assert!(md.contains("| Domain | Accuracy | Correct | Urgency |"));
        assert_eq!(
            md.lines().filter(|l| l.starts_with("| ") && !l.starts_with("| Domain")).count(),
            report.priorities.len()
        );
    }

    #[test]
    fn write_card_by_extension() {
        let (report, curriculum) = report();
        let dir = tempfile::tempdir().unwrap();

        let md = dir.path().join("out").join("card.md");
        write_report_card(&report, &curriculum, &md).unwrap();
        assert!(std::fs::read_to_string(&md).unwrap().contains("# Diagnostic report"));

        let json = dir.path().join("card.json");
        write_report_card(&report, &curriculum, &json).unwrap();
        assert_eq!(DiagnosticReport::load_json(&json).unwrap(), report);
    }
}
