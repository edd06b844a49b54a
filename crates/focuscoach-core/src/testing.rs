//! In-crate test doubles for the collaborator traits.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use crate::error::PersistenceError;
use crate::model::{
    AnswerRecord, AttemptRecord, LearnerProfile, NewProfile, ProfileUpdate, SkillTemplate,
};
use crate::scoring::{DiagnosticReport, DiagnosticScorer};
use crate::traits::{
    ContentGenerator, DiagnosticScoring, GenerateRequest, GenerateResponse, ProfileFilter,
    ProfileStore, TemplateSource,
};

/// JSON array of `count` well-formed questions, correct answer always index 1.
pub fn questions_json(count: usize, domain: Option<&str>) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            let tag = domain
                .map(|d| format!(r#""domain":"{d}","#))
                .unwrap_or_default();
            format!(
                r#"{{{tag}"question":"Question {i}","options":["w","r","x","y"],"correctIndex":1,"explanation":"because {i}"}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

/// Questions tagged slot-by-slot with the given domains.
pub fn tagged_questions_json(domains: &[&str]) -> String {
    let items: Vec<String> = domains
        .iter()
        .enumerate()
        .map(|(i, d)| {
            format!(
                r#"{{"domain":"{d}","question":"Diag {i}","options":["a","b","c","d"],"correctIndex":0,"explanation":"e"}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

type Responder = Box<dyn Fn(&GenerateRequest) -> anyhow::Result<String> + Send + Sync>;

/// Generator whose replies come from a closure or a fixed queue.
pub struct ScriptedGenerator {
    responder: Option<Responder>,
    queue: Mutex<VecDeque<anyhow::Result<String>>>,
    delay: Option<Duration>,
    call_count: AtomicU32,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    pub fn new(
        responder: impl Fn(&GenerateRequest) -> anyhow::Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Some(Box::new(responder)),
            queue: Mutex::new(VecDeque::new()),
            delay: None,
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Replies are consumed in order; an exhausted queue fails.
    pub fn sequence(replies: Vec<anyhow::Result<String>>) -> Self {
        Self {
            responder: None,
            queue: Mutex::new(replies.into()),
            delay: None,
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Each call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let content = match &self.responder {
            Some(responder) => responder(request)?,
            None => self
                .queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))?,
        };
        Ok(GenerateResponse {
            content,
            model: "scripted-model".into(),
            latency_ms: 1,
        })
    }
}

/// Store double that records every intent and can be told to reject writes.
#[derive(Default)]
pub struct FakeStore {
    profiles: Mutex<Vec<LearnerProfile>>,
    subscribers: Mutex<Vec<(ProfileFilter, watch::Sender<Vec<LearnerProfile>>)>>,
    updates: Mutex<Vec<(String, ProfileUpdate)>>,
    attempts: Mutex<Vec<AttemptRecord>>,
    templates: Mutex<HashMap<String, SkillTemplate>>,
    reject_writes: AtomicBool,
    fail_template_lookup: AtomicBool,
    next_id: AtomicU32,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: LearnerProfile) -> Self {
        let store = Self::new();
        store.profiles.lock().unwrap().push(profile);
        store
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn fail_template_lookup(&self, fail: bool) {
        self.fail_template_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn insert_template(&self, template: SkillTemplate) {
        self.templates
            .lock()
            .unwrap()
            .insert(template.domain.clone(), template);
    }

    pub fn updates(&self) -> Vec<(String, ProfileUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> Vec<AttemptRecord> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn profile(&self, id: &str) -> Option<LearnerProfile> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Overwrite a profile as if another writer changed it, and notify watchers.
    pub fn external_write(&self, id: &str, update: &ProfileUpdate) {
        if let Some(p) = self.profiles.lock().unwrap().iter_mut().find(|p| p.id == id) {
            update.apply_to(p);
        }
        self.broadcast();
    }

    fn broadcast(&self) {
        let profiles = self.profiles.lock().unwrap().clone();
        for (filter, tx) in self.subscribers.lock().unwrap().iter() {
            let matching: Vec<LearnerProfile> =
                profiles.iter().filter(|p| filter.matches(p)).cloned().collect();
            tx.send_replace(matching);
        }
    }

    fn check_writable(&self, operation: &'static str) -> Result<(), PersistenceError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected {
                operation,
                reason: "store offline".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FakeStore {
    async fn create_profile(&self, profile: NewProfile) -> Result<LearnerProfile, PersistenceError> {
        self.check_writable("create_profile")?;
        let id = format!("learner-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let created = profile.into_profile(id, Utc::now());
        self.profiles.lock().unwrap().push(created.clone());
        self.broadcast();
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));
        self.check_writable("update_profile")?;
        {
            let mut profiles = self.profiles.lock().unwrap();
            let profile = profiles
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
            update.apply_to(profile);
        }
        self.broadcast();
        Ok(())
    }

    async fn watch_profiles(
        &self,
        filter: ProfileFilter,
    ) -> Result<watch::Receiver<Vec<LearnerProfile>>, PersistenceError> {
        let matching: Vec<LearnerProfile> = self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        let (tx, rx) = watch::channel(matching);
        self.subscribers.lock().unwrap().push((filter, tx));
        Ok(rx)
    }

    async fn append_attempt(&self, record: &AttemptRecord) -> Result<(), PersistenceError> {
        self.check_writable("append_attempt")?;
        self.attempts.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl TemplateSource for FakeStore {
    async fn template_for(&self, domain: &str) -> anyhow::Result<Option<SkillTemplate>> {
        if self.fail_template_lookup.load(Ordering::SeqCst) {
            anyhow::bail!("template collection unavailable");
        }
        Ok(self.templates.lock().unwrap().get(domain).cloned())
    }
}

/// Scorer wrapper that counts invocations.
pub struct CountingScorer {
    inner: DiagnosticScorer,
    calls: AtomicU32,
}

impl CountingScorer {
    pub fn new(inner: DiagnosticScorer) -> Self {
        Self {
            inner,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DiagnosticScoring for CountingScorer {
    fn score(&self, answers: &[AnswerRecord]) -> DiagnosticReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.score(answers)
    }
}
