//! Mock generator for testing and offline sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use focuscoach_core::curriculum::Curriculum;
use focuscoach_core::model::OPTION_COUNT;
use focuscoach_core::pipeline::DRILL_BATCH_SIZE;
use focuscoach_core::prompt::option_letter;
use focuscoach_core::traits::{ContentGenerator, GenerateRequest, GenerateResponse, ReplyFormat};

const DEFAULT_TUTOR_REPLY: &str =
    "Compare your choice with the **keyed option** and check each condition in the question.";

/// A mock content generator that answers without any network access.
///
/// Replies are chosen by instruction substring; tutor (plain text) requests
/// get a separate canned reply.
pub struct MockGenerator {
    /// Instruction substring → reply, checked in order.
    responses: Vec<(String, String)>,
    /// Reply when no substring matches.
    default_response: String,
    /// Reply for plain-text requests.
    tutor_response: String,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockGenerator {
    /// Create a mock with the given substring → reply mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        let mut responses: Vec<(String, String)> = responses.into_iter().collect();
        // longest key first so the most specific match wins
        responses.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self {
            responses,
            default_response: "[]".to_string(),
            tutor_response: DEFAULT_TUTOR_REPLY.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.default_response = response.to_string();
        mock.tutor_response = response.to_string();
        mock
    }

    /// A mock that serves well-formed sample batches for `curriculum`:
    /// one tagged diagnostic batch per subject, and drill batches otherwise.
    pub fn for_curriculum(curriculum: &Curriculum) -> Self {
        let mut mock = Self::new(HashMap::new());
        for subject in &curriculum.subjects {
            let domains: Vec<Option<&str>> =
                subject.distribution.iter().map(|d| Some(d.as_str())).collect();
            mock.responses.push((
                format!("writer for {}.", subject.label),
                sample_batch(&domains),
            ));
        }
        mock.default_response = sample_batch(&vec![None; DRILL_BATCH_SIZE]);
        mock
    }

    /// Number of calls made to this generator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this generator.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

/// JSON array with one sample question per slot.
fn sample_batch(slots: &[Option<&str>]) -> String {
    let items: Vec<serde_json::Value> = slots
        .iter()
        .enumerate()
        .map(|(i, domain)| {
            let correct = i % OPTION_COUNT;
            let options: Vec<String> = (0..OPTION_COUNT)
                .map(|o| format!("Choice {}", option_letter(o)))
                .collect();
            let mut item = serde_json::json!({
                "question": format!(
                    "Sample question {}: which choice is **{}**?",
                    i + 1,
                    option_letter(correct)
                ),
                "options": options,
                "correctIndex": correct,
                "explanation": format!("Choice {} is the keyed answer.", option_letter(correct)),
            });
            if let Some(domain) = domain {
                item["domain"] = serde_json::Value::String(domain.to_string());
            }
            item
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let content = match request.reply_format {
            ReplyFormat::PlainText => self.tutor_response.clone(),
            ReplyFormat::Structured => self
                .responses
                .iter()
                .find(|(key, _)| request.instruction.contains(key.as_str()))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| self.default_response.clone()),
        };

        Ok(GenerateResponse {
            content,
            model: request.model.clone().unwrap_or_else(|| "mock-model".into()),
            latency_ms: 1,
        })
    }
}
