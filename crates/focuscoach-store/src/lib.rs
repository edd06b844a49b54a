//! focuscoach-store — Profile, template and attempt-log store.
//!
//! An in-memory implementation of the `ProfileStore` and `TemplateSource`
//! collaborators with live `watch` subscriptions. When opened on a path,
//! every write is committed to a JSON snapshot before it becomes visible.

pub mod snapshot;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use focuscoach_core::error::PersistenceError;
use focuscoach_core::model::{
    AttemptRecord, LearnerProfile, NewProfile, ProfileUpdate, SkillTemplate,
};
use focuscoach_core::traits::{ProfileFilter, ProfileStore, TemplateSource};

pub use snapshot::Snapshot;

type Subscriber = (ProfileFilter, watch::Sender<Vec<LearnerProfile>>);

/// Store backed by memory, optionally persisted to a snapshot file.
pub struct MemoryStore {
    state: RwLock<Snapshot>,
    subscribers: Mutex<Vec<Subscriber>>,
    snapshot_path: Option<PathBuf>,
    read_only: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::default(), None)
    }
}

impl MemoryStore {
    /// An empty store that never touches disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`, loading any existing snapshot.
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = Snapshot::load(path)?;
        debug!(
            path = %path.display(),
            profiles = snapshot.profiles.len(),
            templates = snapshot.templates.len(),
            attempts = snapshot.attempts.len(),
            "opened store"
        );
        Ok(Self::from_snapshot(snapshot, Some(path.to_path_buf())))
    }

    fn from_snapshot(snapshot: Snapshot, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            state: RwLock::new(snapshot),
            subscribers: Mutex::new(Vec::new()),
            snapshot_path,
            read_only: AtomicBool::new(false),
        }
    }

    /// Reject every subsequent write with `PersistenceError::Rejected`.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// All profiles in creation order.
    pub async fn profiles(&self) -> Vec<LearnerProfile> {
        self.state.read().await.profiles.clone()
    }

    /// The whole attempt log in append order.
    pub async fn attempts(&self) -> Vec<AttemptRecord> {
        self.state.read().await.attempts.clone()
    }

    /// Attempts logged for one learner.
    pub async fn attempts_for(&self, learner_id: &str) -> Vec<AttemptRecord> {
        self.state
            .read()
            .await
            .attempts
            .iter()
            .filter(|a| a.learner_id == learner_id)
            .cloned()
            .collect()
    }

    /// Templates sorted by domain.
    pub async fn templates(&self) -> Vec<SkillTemplate> {
        let mut templates = self.state.read().await.templates.clone();
        templates.sort_by(|a, b| a.domain.cmp(&b.domain));
        templates
    }

    /// Insert or replace the template for `template.domain`.
    /// Returns `true` when the domain had no template before.
    pub async fn upsert_template(&self, template: SkillTemplate) -> Result<bool, PersistenceError> {
        self.write("upsert_template", |state| {
            match state.templates.iter_mut().find(|t| t.domain == template.domain) {
                Some(existing) => {
                    *existing = template;
                    Ok(false)
                }
                None => {
                    state.templates.push(template);
                    Ok(true)
                }
            }
        })
        .await
    }

    /// Snapshot of the current state.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    /// Apply `mutate` to a copy of the state, persist it, then publish it.
    async fn write<T>(
        &self,
        operation: &'static str,
        mutate: impl FnOnce(&mut Snapshot) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected {
                operation,
                reason: "store is read-only".into(),
            });
        }

        let mut state = self.state.write().await;
        let mut next = state.clone();
        let out = mutate(&mut next)?;

        if let Some(path) = &self.snapshot_path {
            let to_save = next.clone();
            let path = path.clone();
            tokio::task::spawn_blocking(move || to_save.save(&path))
                .await
                .map_err(|e| PersistenceError::Io(e.to_string()))?
                .map_err(|e| {
                    warn!(operation, error = %e, "snapshot write failed");
                    PersistenceError::Io(format!("{e:#}"))
                })?;
        }

        *state = next;
        self.publish(&state.profiles);
        Ok(out)
    }

    fn publish(&self, profiles: &[LearnerProfile]) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        subscribers.retain(|(_, tx)| !tx.is_closed());
        for (filter, tx) in subscribers.iter() {
            let view = filtered(profiles, filter);
            tx.send_if_modified(|current| {
                if *current == view {
                    false
                } else {
                    *current = view;
                    true
                }
            });
        }
    }
}

/// Profiles matching `filter`, ordered for that query.
///
/// Role queries (rosters) are most recently active first with never-active
/// profiles last; other queries keep creation order.
fn filtered(profiles: &[LearnerProfile], filter: &ProfileFilter) -> Vec<LearnerProfile> {
    let mut view: Vec<LearnerProfile> = profiles
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();
    if matches!(filter, ProfileFilter::Role(_)) {
        // Option orders None first, so reversing puts missing timestamps last
        view.sort_by(|a, b| b.last_active.cmp(&a.last_active));
    }
    view
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create_profile(&self, profile: NewProfile) -> Result<LearnerProfile, PersistenceError> {
        let id = Uuid::new_v4().to_string();
        let created = profile.into_profile(id, Utc::now());
        let record = created.clone();
        self.write("create_profile", move |state| {
            state.profiles.push(record);
            Ok(())
        })
        .await?;
        debug!(id = %created.id, identity = %created.identity, "created profile");
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), PersistenceError> {
        if update.is_empty() {
            return Ok(());
        }
        self.write("update_profile", |state| {
            let profile = state
                .profiles
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
            update.apply_to(profile);
            Ok(())
        })
        .await
    }

    async fn watch_profiles(
        &self,
        filter: ProfileFilter,
    ) -> Result<watch::Receiver<Vec<LearnerProfile>>, PersistenceError> {
        let state = self.state.read().await;
        let (tx, rx) = watch::channel(filtered(&state.profiles, &filter));
        self.subscribers
            .lock()
            .map_err(|_| PersistenceError::Io("subscriber list poisoned".into()))?
            .push((filter, tx));
        Ok(rx)
    }

    async fn append_attempt(&self, record: &AttemptRecord) -> Result<(), PersistenceError> {
        self.write("append_attempt", |state| {
            // ids are unique; a repeated append is a no-op
            if !state.attempts.iter().any(|a| a.id == record.id) {
                state.attempts.push(record.clone());
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TemplateSource for MemoryStore {
    async fn template_for(&self, domain: &str) -> Result<Option<SkillTemplate>> {
        let state = self.state.read().await;
        let by_domain = state.templates.iter().find(|t| t.domain == domain);
        let found = by_domain.or_else(|| {
            state
                .templates
                .iter()
                .find(|t| t.skill.as_deref() == Some(domain))
        });
        Ok(found.cloned())
    }
}
