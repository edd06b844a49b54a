//! Instruction text sent to the content generator.

use crate::mastery::Tier;
use crate::model::{SkillTemplate, TemplateExample, TutorContext, OPTION_COUNT};

/// Reference question text is cut to this many characters.
const REFERENCE_PREVIEW_CHARS: usize = 50;

const RECORD_SHAPE: &str = r#"[{"question": "...", "options": ["A", "B", "C", "D"], "correctIndex": 0, "explanation": "..."}]"#;

const DIAGNOSTIC_RECORD_SHAPE: &str = r#"[{"domain": "<one of the requested domains>", "question": "...", "options": ["...", "...", "...", "..."], "correctIndex": 0, "explanation": "..."}]"#;

/// Letter shown next to an option index (0 => 'A').
pub fn option_letter(index: usize) -> char {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i),
        _ => '?',
    }
}

/// Build a drill batch instruction for `topic` at the given tier.
pub fn drill_instruction(
    topic: &str,
    tier: Tier,
    template: Option<&SkillTemplate>,
    count: usize,
) -> String {
    let preamble = template
        .and_then(|t| t.base_prompt.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("You are an expert test-prep tutor. Skill: \"{topic}\"."));

    let mut out = String::new();
    out.push_str(&preamble);
    out.push('\n');
    out.push_str(&format!(
        "GOAL: Write {count} distinct multiple-choice questions for \"{topic}\".\n"
    ));
    out.push_str(&format!("DIFFICULTY: {}.\n", tier.difficulty_label()));

    let examples = template.map(|t| t.examples_for(tier)).unwrap_or_default();
    if !examples.is_empty() {
        out.push_str("MATCH THE STYLE OF THESE REFERENCES:\n");
        for (i, example) in examples.iter().enumerate() {
            out.push_str(&reference_line(i + 1, example));
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "OUTPUT: JSON only, an array of exactly {count} objects, each with {OPTION_COUNT} options.\n"
    ));
    out.push_str("- Use **bold** for key terms.\n");
    out.push_str("- Write math in Unicode (1/2, x², √). Do not use LaTeX backslash commands.\n");
    out.push_str("- Escape every double quote inside a string as \\\".\n");
    out.push_str(&format!("Structure: {RECORD_SHAPE}\n"));
    out
}

fn reference_line(number: usize, example: &TemplateExample) -> String {
    let preview: String = example.question.chars().take(REFERENCE_PREVIEW_CHARS).collect();
    format!(
        "REF {number}: Question: \"{preview}...\" | Correct: {} | Trap: {}",
        example.correct, example.logic
    )
}

/// Build a diagnostic batch instruction: one question per distribution slot.
pub fn diagnostic_instruction(subject_label: &str, distribution: &[String]) -> String {
    let count = distribution.len();
    let mut out = String::new();
    out.push_str(&format!(
        "You are an expert diagnostic test writer for {subject_label}.\n"
    ));
    out.push_str(&format!(
        "GOAL: Write exactly {count} multiple-choice questions following this domain distribution, in order:\n"
    ));
    out.push_str(&distribution.join(", "));
    out.push('\n');
    out.push_str("DIFFICULTY: Mixed (easy, medium and hard) to measure the true level.\n");
    out.push_str(&format!(
        "OUTPUT: JSON only, an array of exactly {count} objects.\n"
    ));
    out.push_str("- Set the \"domain\" field of each object to the domain it was written for.\n");
    out.push_str("- Use **bold** for emphasis.\n");
    out.push_str("- No LaTeX. Use plain text (\"line AB\", \"10%\", \"x^2\").\n");
    out.push_str(&format!("Structure: {DIAGNOSTIC_RECORD_SHAPE}\n"));
    out
}

/// Build a tutor chat instruction about one answered question.
pub fn tutor_instruction(context: &TutorContext, learner_message: &str) -> String {
    let describe = |index: usize| {
        let text = context.options.get(index).map(String::as_str).unwrap_or("");
        format!("Option {} (\"{text}\")", option_letter(index))
    };
    let options = context
        .options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}) {o}", option_letter(i)))
        .collect::<Vec<_>>()
        .join("  ");

    let mut out = String::new();
    out.push_str("You are an encouraging but precise tutor chatting with a student.\n");
    out.push_str(&format!("Question: \"{}\"\n", context.prompt));
    out.push_str(&format!("Options: {options}\n"));
    out.push_str(&format!("Correct answer: {}\n", describe(context.correct_index)));
    out.push_str(&format!(
        "Student selected: {}\n",
        describe(context.selected_index)
    ));
    out.push_str(&format!("Student asks: \"{}\"\n", learner_message.trim()));
    out.push_str("Answer the student directly in two or three sentences. Use **bold** for key ideas.\n");
    out.push_str("Reply in plain text or markdown, not JSON.\n");
    out
}
