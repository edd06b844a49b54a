//! Session controller: the per-learner state machine.
//!
//! ```text
//! Loading -> Setup -> Diagnostic
//! Loading -> Diagnostic | Dashboard
//! Diagnostic -> Report -> Dashboard      (abandon: Diagnostic -> Dashboard)
//! Dashboard -> Drill -> Summary -> Dashboard   (abandon: Drill -> Dashboard)
//! ```
//!
//! The controller owns the only mutable copy of the learner's session state
//! and is driven through `&mut self`, so answers are processed strictly one at
//! a time. Content requests run as spawned tasks returned as [`Pending`]
//! handles carrying a [`Ticket`]; a completion whose ticket no longer matches
//! the controller's current state is discarded.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::curriculum::Curriculum;
use crate::error::{ContentError, SessionError};
use crate::mastery::{self, Mastery, Tier};
use crate::model::{
    AnswerRecord, AttemptRecord, ChatTurn, FocusArea, LearnerProfile, NewProfile,
    PracticeQuestion, ProfileUpdate, Role, Speaker, TutorContext, OPTION_COUNT,
};
use crate::pipeline::ContentPipeline;
use crate::scoring::DiagnosticReport;
use crate::traits::{DiagnosticScoring, ProfileFilter, ProfileStore, TemplateSource};

/// Which screen the learner is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Loading,
    Setup,
    Diagnostic,
    Report,
    Dashboard,
    Drill,
    Summary,
}

/// Identity of the session state a content request was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    epoch: u64,
    question: usize,
}

/// An outstanding content request.
#[derive(Debug)]
pub struct Pending<T> {
    ticket: Ticket,
    handle: JoinHandle<Result<T, ContentError>>,
}

impl<T> Pending<T> {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the underlying request. Joining afterwards yields a
    /// generation failure.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the request to finish.
    pub async fn join(self) -> Completion<T> {
        let result = match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ContentError::Generation(format!("request task failed: {e}"))),
        };
        Completion {
            ticket: self.ticket,
            result,
        }
    }
}

/// A finished content request, not yet applied.
#[derive(Debug)]
pub struct Completion<T> {
    pub ticket: Ticket,
    pub result: Result<T, ContentError>,
}

/// Result of recording one diagnostic answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticStep {
    /// More questions remain.
    Next,
    /// That was the last question; the report is ready.
    Complete,
    /// The countdown had already run out; the answer was not recorded and
    /// the report was built from earlier answers.
    TimeUp,
}

/// What happened when a drill answer was scored.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
    pub delta: i32,
    pub previous_tier: Tier,
    pub mastery: Mastery,
    pub tier: Tier,
    pub was_fast: bool,
    pub elapsed: Duration,
    pub feedback: String,
    /// Both store intents were accepted.
    pub persisted: bool,
}

/// End-of-batch summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub correct: usize,
    pub total: usize,
    pub streak: u32,
    pub persisted: bool,
}

/// Result of advancing past an answered drill question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillStep {
    Next,
    Complete(SessionSummary),
}

/// Position within the current drill batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillProgress {
    /// Zero-based index of the visible question.
    pub index: usize,
    pub total: usize,
    pub correct: usize,
    pub answered: bool,
}

struct DiagnosticRun {
    questions: Vec<PracticeQuestion>,
    answers: Vec<AnswerRecord>,
    deadline: Instant,
}

struct DrillRun {
    topic: String,
    questions: Vec<PracticeQuestion>,
    current: usize,
    shown_at: Instant,
    answered: Option<usize>,
    correct: usize,
    chat: Vec<ChatTurn>,
}

impl DrillRun {
    fn question(&self) -> Option<&PracticeQuestion> {
        self.questions.get(self.current)
    }
}

/// Orchestrates one learner's session.
pub struct SessionController {
    identity: String,
    pipeline: ContentPipeline,
    scorer: Arc<dyn DiagnosticScoring>,
    store: Arc<dyn ProfileStore>,
    templates: Arc<dyn TemplateSource>,
    curriculum: Arc<Curriculum>,

    mode: Mode,
    profile: Option<LearnerProfile>,
    subscription: Option<watch::Receiver<Vec<LearnerProfile>>>,
    /// Locally applied mastery not yet confirmed by a store snapshot.
    mastery_override: Option<Mastery>,
    epoch: u64,
    diagnostic: Option<DiagnosticRun>,
    report: Option<DiagnosticReport>,
    drill: Option<DrillRun>,
}

impl SessionController {
    pub fn new(
        identity: impl Into<String>,
        pipeline: ContentPipeline,
        scorer: Arc<dyn DiagnosticScoring>,
        store: Arc<dyn ProfileStore>,
        templates: Arc<dyn TemplateSource>,
        curriculum: Arc<Curriculum>,
    ) -> Self {
        Self {
            identity: identity.into(),
            pipeline,
            scorer,
            store,
            templates,
            curriculum,
            mode: Mode::Loading,
            profile: None,
            subscription: None,
            mastery_override: None,
            epoch: 0,
            diagnostic: None,
            report: None,
            drill: None,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn profile(&self) -> Option<&LearnerProfile> {
        self.profile.as_ref()
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// Mastery as shown to the learner, including unconfirmed local changes.
    pub fn mastery(&self) -> Mastery {
        self.mastery_override
            .or_else(|| self.profile.as_ref().map(|p| p.mastery))
            .unwrap_or(Mastery::MIN)
    }

    pub fn tier(&self) -> Tier {
        self.mastery().tier()
    }

    pub fn report(&self) -> Option<&DiagnosticReport> {
        self.report.as_ref()
    }

    pub fn current_diagnostic_question(&self) -> Option<&PracticeQuestion> {
        let run = self.diagnostic.as_ref()?;
        run.questions.get(run.answers.len())
    }

    /// `(answered, total)` for the running diagnostic.
    pub fn diagnostic_progress(&self) -> Option<(usize, usize)> {
        self.diagnostic
            .as_ref()
            .map(|run| (run.answers.len(), run.questions.len()))
    }

    /// Countdown left on the running diagnostic.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.diagnostic
            .as_ref()
            .map(|run| run.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn current_question(&self) -> Option<&PracticeQuestion> {
        self.drill.as_ref().and_then(DrillRun::question)
    }

    pub fn drill_progress(&self) -> Option<DrillProgress> {
        self.drill.as_ref().map(|run| DrillProgress {
            index: run.current,
            total: run.questions.len(),
            correct: run.correct,
            answered: run.answered.is_some(),
        })
    }

    /// Tutor transcript for the visible question.
    pub fn chat(&self) -> &[ChatTurn] {
        self.drill.as_ref().map(|run| run.chat.as_slice()).unwrap_or(&[])
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch,
            question: self.drill.as_ref().map_or(0, |run| run.current),
        }
    }

    fn expect_mode(&self, mode: Mode, action: &'static str) -> Result<(), SessionError> {
        if self.mode != mode {
            return Err(SessionError::InvalidTransition {
                mode: self.mode,
                action,
            });
        }
        Ok(())
    }

    fn require_profile(&self) -> Result<&LearnerProfile, SessionError> {
        self.profile.as_ref().ok_or(SessionError::NoProfile)
    }

    // -- profile ------------------------------------------------------------

    /// Resolve the initial mode from the store. The only automatic transition.
    #[tracing::instrument(skip(self), fields(identity = %self.identity))]
    pub async fn load(&mut self) -> Result<Mode, SessionError> {
        self.expect_mode(Mode::Loading, "load")?;
        let mut rx = self
            .store
            .watch_profiles(ProfileFilter::Identity(self.identity.clone()))
            .await?;
        let found = rx.borrow_and_update().first().cloned();
        self.subscription = Some(rx);

        self.mode = match &found {
            None => Mode::Setup,
            Some(p) if p.diagnostic_completed => Mode::Dashboard,
            Some(_) => Mode::Diagnostic,
        };
        self.profile = found;
        tracing::info!(mode = ?self.mode, "session loaded");
        Ok(self.mode)
    }

    /// Create the learner's profile and move on to the diagnostic.
    pub async fn create_profile(
        &mut self,
        name: &str,
        email: Option<String>,
    ) -> Result<&LearnerProfile, SessionError> {
        self.expect_mode(Mode::Setup, "create a profile")?;
        let created = self
            .store
            .create_profile(NewProfile {
                identity: self.identity.clone(),
                name: name.trim().to_string(),
                email,
                role: Role::Student,
            })
            .await?;
        tracing::info!(learner = %created.id, "profile created");
        self.mode = Mode::Diagnostic;
        Ok(self.profile.insert(created))
    }

    /// Pull the latest snapshot from the store subscription, if any arrived.
    ///
    /// Fields come from the snapshot, except a locally applied mastery that
    /// the snapshot has not confirmed yet.
    pub fn sync_profile(&mut self) -> bool {
        let Some(rx) = self.subscription.as_mut() else {
            return false;
        };
        if !rx.has_changed().unwrap_or(false) {
            return false;
        }
        let fresh = {
            let snapshot = rx.borrow_and_update();
            match &self.profile {
                Some(current) => snapshot.iter().find(|p| p.id == current.id).cloned(),
                None => snapshot.first().cloned(),
            }
        };
        let Some(fresh) = fresh else {
            return false;
        };
        if self.mastery_override == Some(fresh.mastery) {
            self.mastery_override = None;
        }
        self.profile = Some(fresh);
        true
    }

    /// Apply an update locally, then send it to the store. A rejected write
    /// is logged and the local state is kept.
    async fn commit(&mut self, update: ProfileUpdate) -> Result<bool, SessionError> {
        let profile = self.profile.as_mut().ok_or(SessionError::NoProfile)?;
        update.apply_to(profile);
        let id = profile.id.clone();
        if let Some(mastery) = update.mastery {
            self.mastery_override = Some(mastery);
        }
        Ok(self.persist_update(&id, &update).await)
    }

    async fn persist_update(&self, id: &str, update: &ProfileUpdate) -> bool {
        match self.store.update_profile(id, update).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(learner = id, "profile update not persisted: {e}");
                false
            }
        }
    }

    // -- diagnostic ---------------------------------------------------------

    /// Start generating the full diagnostic battery.
    pub fn request_diagnostic(&mut self) -> Result<Pending<Vec<PracticeQuestion>>, SessionError> {
        self.expect_mode(Mode::Diagnostic, "request the diagnostic")?;
        if self.diagnostic.is_some() {
            return Err(SessionError::InvalidTransition {
                mode: self.mode,
                action: "request a second diagnostic",
            });
        }
        let pipeline = self.pipeline.clone();
        let curriculum = Arc::clone(&self.curriculum);
        let handle =
            tokio::spawn(async move { pipeline.request_full_diagnostic(&curriculum).await });
        Ok(Pending {
            ticket: self.ticket(),
            handle,
        })
    }

    /// Install a generated battery and start the countdown. Returns
    /// `Ok(false)` when the completion is stale.
    pub fn install_diagnostic(
        &mut self,
        completion: Completion<Vec<PracticeQuestion>>,
    ) -> Result<bool, SessionError> {
        if self.mode != Mode::Diagnostic
            || self.diagnostic.is_some()
            || completion.ticket != self.ticket()
        {
            tracing::debug!("discarding stale diagnostic batch");
            return Ok(false);
        }
        let questions = completion.result?;
        if questions.is_empty() {
            return Err(ContentError::EmptyResponse.into());
        }
        tracing::info!(
            questions = questions.len(),
            budget_secs = self.curriculum.diagnostic_budget_secs,
            "diagnostic started"
        );
        self.diagnostic = Some(DiagnosticRun {
            questions,
            answers: Vec::new(),
            deadline: Instant::now() + self.curriculum.diagnostic_budget(),
        });
        Ok(true)
    }

    /// Request, await, and install the diagnostic battery.
    pub async fn start_diagnostic(&mut self) -> Result<(), SessionError> {
        let pending = self.request_diagnostic()?;
        let completion = pending.join().await;
        self.install_diagnostic(completion)?;
        Ok(())
    }

    /// Score early if the countdown has run out. Returns whether it had.
    pub fn check_deadline(&mut self) -> bool {
        let expired = self
            .diagnostic
            .as_ref()
            .is_some_and(|run| Instant::now() >= run.deadline);
        if expired {
            tracing::info!("diagnostic time budget exhausted");
            self.finish_diagnostic();
        }
        expired
    }

    /// Record one diagnostic answer. Correctness only, no reward.
    pub fn answer_diagnostic(&mut self, selected: usize) -> Result<DiagnosticStep, SessionError> {
        self.expect_mode(Mode::Diagnostic, "answer a diagnostic question")?;
        if self.check_deadline() {
            return Ok(DiagnosticStep::TimeUp);
        }
        if selected >= OPTION_COUNT {
            return Err(SessionError::InvalidOption(selected));
        }
        let run = self
            .diagnostic
            .as_mut()
            .ok_or(SessionError::InvalidTransition {
                mode: Mode::Diagnostic,
                action: "answer before the diagnostic is loaded",
            })?;
        let Some(question) = run.questions.get(run.answers.len()) else {
            return Err(SessionError::AlreadyAnswered(run.answers.len()));
        };
        run.answers.push(AnswerRecord::new(
            question.domain.clone().unwrap_or_default(),
            question.is_correct(selected),
        ));

        if run.answers.len() == run.questions.len() {
            self.finish_diagnostic();
            Ok(DiagnosticStep::Complete)
        } else {
            Ok(DiagnosticStep::Next)
        }
    }

    fn finish_diagnostic(&mut self) {
        let Some(run) = self.diagnostic.take() else {
            return;
        };
        let report = self.scorer.score(&run.answers);
        tracing::info!(
            answered = run.answers.len(),
            total = run.questions.len(),
            focus = %report.primary_focus,
            initial_mastery = report.initial_mastery.value(),
            "diagnostic scored"
        );
        self.report = Some(report);
        self.epoch += 1;
        self.mode = Mode::Report;
    }

    /// Skip the diagnostic and apply the fallback profile. The scorer is not
    /// consulted. Returns whether the store accepted the write.
    pub async fn abandon_diagnostic(&mut self) -> Result<bool, SessionError> {
        self.expect_mode(Mode::Diagnostic, "abandon the diagnostic")?;
        self.require_profile()?;
        let fallback = self.curriculum.fallback.clone();
        let update = ProfileUpdate::default()
            .diagnostic_completed(true)
            .focus(FocusArea::GeneralPractice)
            .weaknesses(fallback.weaknesses)
            .mastery(fallback.mastery)
            .last_active(Utc::now());

        self.diagnostic = None;
        self.epoch += 1;
        self.mode = Mode::Dashboard;
        tracing::info!("diagnostic abandoned, fallback profile applied");
        self.commit(update).await
    }

    /// Accept the report: write focus, weaknesses and initial mastery.
    pub async fn confirm_report(&mut self) -> Result<bool, SessionError> {
        self.expect_mode(Mode::Report, "confirm the report")?;
        self.require_profile()?;
        let Some(report) = self.report.take() else {
            return Err(SessionError::InvalidTransition {
                mode: self.mode,
                action: "confirm a missing report",
            });
        };
        let update = ProfileUpdate::default()
            .diagnostic_completed(true)
            .focus(FocusArea::Domain(report.primary_focus.clone()))
            .weaknesses(report.weaknesses())
            .mastery(report.initial_mastery)
            .initial_mastery(report.initial_mastery)
            .last_active(Utc::now());
        self.mode = Mode::Dashboard;
        self.commit(update).await
    }

    // -- drill --------------------------------------------------------------

    /// Start generating a drill batch for the current focus.
    pub async fn request_drill(&mut self) -> Result<Pending<Vec<PracticeQuestion>>, SessionError> {
        self.expect_mode(Mode::Dashboard, "start a drill")?;
        self.sync_profile();
        let topic = self.require_profile()?.focus.label().to_string();
        let mastery = self.mastery();

        let template = match self.templates.template_for(&topic).await {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!(topic = %topic, "template lookup failed, using default instruction: {e:#}");
                None
            }
        };

        let pipeline = self.pipeline.clone();
        let handle = tokio::spawn(async move {
            pipeline
                .request_drill_batch(&topic, mastery, template.as_ref())
                .await
        });
        Ok(Pending {
            ticket: self.ticket(),
            handle,
        })
    }

    /// Install a generated batch and show its first question. Returns
    /// `Ok(false)` when the completion is stale.
    pub fn install_drill(
        &mut self,
        completion: Completion<Vec<PracticeQuestion>>,
    ) -> Result<bool, SessionError> {
        if self.mode != Mode::Dashboard || completion.ticket != self.ticket() {
            tracing::debug!("discarding stale drill batch");
            return Ok(false);
        }
        let questions = completion.result?;
        if questions.is_empty() {
            return Err(ContentError::EmptyResponse.into());
        }
        let topic = self.require_profile()?.focus.label().to_string();
        self.epoch += 1;
        self.drill = Some(DrillRun {
            topic,
            questions,
            current: 0,
            shown_at: Instant::now(),
            answered: None,
            correct: 0,
            chat: Vec::new(),
        });
        self.mode = Mode::Drill;
        Ok(true)
    }

    /// Request, await, and install a drill batch.
    pub async fn start_drill(&mut self) -> Result<(), SessionError> {
        let pending = self.request_drill().await?;
        let completion = pending.join().await;
        self.install_drill(completion)?;
        Ok(())
    }

    /// Score an answer to the visible question and emit the two store
    /// intents (profile update and attempt log).
    pub async fn submit_answer(&mut self, selected: usize) -> Result<AnswerOutcome, SessionError> {
        self.expect_mode(Mode::Drill, "submit an answer")?;
        if selected >= OPTION_COUNT {
            return Err(SessionError::InvalidOption(selected));
        }
        self.sync_profile();
        let profile = self.require_profile()?;
        let learner_id = profile.id.clone();
        let learner_name = profile.name.clone();
        let target = self.curriculum.target_response_time(&profile.focus);
        let previous = self.mastery();

        let (question, topic, elapsed, correct) = {
            let run = self.drill.as_mut().ok_or(SessionError::InvalidTransition {
                mode: Mode::Drill,
                action: "submit without a batch",
            })?;
            if run.answered.is_some() {
                return Err(SessionError::AlreadyAnswered(run.current));
            }
            let question = run
                .question()
                .cloned()
                .ok_or(SessionError::AlreadyAnswered(run.current))?;
            let correct = question.is_correct(selected);
            run.answered = Some(selected);
            if correct {
                run.correct += 1;
            }
            (question, run.topic.clone(), run.shown_at.elapsed(), correct)
        };

        let reward = mastery::reward(previous.tier(), correct, elapsed, target);
        let updated = previous.apply(reward.delta);
        self.mastery_override = Some(updated);
        let now = Utc::now();
        if let Some(p) = self.profile.as_mut() {
            p.last_active = Some(now);
        }

        let update = ProfileUpdate::default().mastery(updated).last_active(now);
        let attempt = AttemptRecord {
            id: Uuid::new_v4(),
            learner_id: learner_id.clone(),
            learner_name,
            domain: topic,
            question: question.prompt.clone(),
            correct,
            time_spent_secs: elapsed.as_secs_f64(),
            was_fast: reward.was_fast,
            recorded_at: now,
        };
        let profile_saved = self.persist_update(&learner_id, &update).await;
        let attempt_saved = match self.store.append_attempt(&attempt).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(learner = %learner_id, "attempt not logged: {e}");
                false
            }
        };

        tracing::debug!(
            correct,
            delta = reward.delta,
            mastery = updated.value(),
            tier = %updated.tier(),
            "answer scored"
        );

        Ok(AnswerOutcome {
            correct,
            correct_index: question.correct_index,
            explanation: question.explanation,
            delta: reward.delta,
            previous_tier: previous.tier(),
            mastery: updated,
            tier: updated.tier(),
            was_fast: reward.was_fast,
            elapsed,
            feedback: mastery::feedback_text(correct, &reward, elapsed, target),
            persisted: profile_saved && attempt_saved,
        })
    }

    /// Ask the tutor about the answered question.
    pub fn request_tutor(&mut self, message: &str) -> Result<Pending<String>, SessionError> {
        self.expect_mode(Mode::Drill, "ask the tutor")?;
        let ticket = self.ticket();
        let run = self.drill.as_mut().ok_or(SessionError::InvalidTransition {
            mode: Mode::Drill,
            action: "ask the tutor without a batch",
        })?;
        let Some(selected) = run.answered else {
            return Err(SessionError::NotAnswered(run.current));
        };
        let question = run
            .question()
            .ok_or(SessionError::NotAnswered(run.current))?;
        let context = TutorContext::for_answer(question, selected);
        let message = message.trim().to_string();
        run.chat.push(ChatTurn {
            speaker: Speaker::Learner,
            text: message.clone(),
        });

        let pipeline = self.pipeline.clone();
        let handle =
            tokio::spawn(async move { pipeline.request_tutor_reply(&context, &message).await });
        Ok(Pending { ticket, handle })
    }

    /// Append a tutor reply to the transcript. Returns `Ok(false)` when the
    /// learner has moved on since asking.
    pub fn accept_tutor_reply(&mut self, completion: Completion<String>) -> Result<bool, SessionError> {
        if self.mode != Mode::Drill || completion.ticket != self.ticket() {
            tracing::debug!("discarding stale tutor reply");
            return Ok(false);
        }
        let reply = completion.result?;
        if let Some(run) = self.drill.as_mut() {
            run.chat.push(ChatTurn {
                speaker: Speaker::Tutor,
                text: reply,
            });
        }
        Ok(true)
    }

    /// Request, await, and record a tutor reply.
    pub async fn ask_tutor(&mut self, message: &str) -> Result<Option<String>, SessionError> {
        let pending = self.request_tutor(message)?;
        let completion = pending.join().await;
        if self.accept_tutor_reply(completion)? {
            Ok(self.chat().last().map(|turn| turn.text.clone()))
        } else {
            Ok(None)
        }
    }

    /// Move past the answered question. After the last one the batch is
    /// complete and the streak grows by one.
    pub async fn next_question(&mut self) -> Result<DrillStep, SessionError> {
        self.expect_mode(Mode::Drill, "advance the drill")?;
        let run = self.drill.as_mut().ok_or(SessionError::InvalidTransition {
            mode: Mode::Drill,
            action: "advance without a batch",
        })?;
        if run.answered.is_none() {
            return Err(SessionError::NotAnswered(run.current));
        }
        run.chat.clear();
        if run.current + 1 < run.questions.len() {
            run.current += 1;
            run.answered = None;
            run.shown_at = Instant::now();
            return Ok(DrillStep::Next);
        }

        let (correct, total) = (run.correct, run.questions.len());
        self.drill = None;
        self.epoch += 1;
        self.mode = Mode::Summary;

        let streak = self.require_profile()?.streak + 1;
        let persisted = self
            .commit(ProfileUpdate::default().streak(streak).last_active(Utc::now()))
            .await?;
        tracing::info!(correct, total, streak, "drill batch complete");
        Ok(DrillStep::Complete(SessionSummary {
            correct,
            total,
            streak,
            persisted,
        }))
    }

    /// Leave a drill early. The streak is not touched.
    pub fn abandon_drill(&mut self) -> Result<(), SessionError> {
        self.expect_mode(Mode::Drill, "abandon the drill")?;
        self.drill = None;
        self.epoch += 1;
        self.mode = Mode::Dashboard;
        Ok(())
    }

    pub fn return_to_dashboard(&mut self) -> Result<(), SessionError> {
        self.expect_mode(Mode::Summary, "return to the dashboard")?;
        self.mode = Mode::Dashboard;
        self.sync_profile();
        Ok(())
    }
}
