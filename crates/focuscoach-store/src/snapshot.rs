//! JSON snapshot of the complete store state.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use focuscoach_core::model::{AttemptRecord, LearnerProfile, SkillTemplate};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything the store holds, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub profiles: Vec<LearnerProfile>,
    #[serde(default)]
    pub templates: Vec<SkillTemplate>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
}

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            profiles: Vec::new(),
            templates: Vec::new(),
            attempts: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Load a snapshot; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot: {}", path.display()))?;
        if snapshot.version > SNAPSHOT_VERSION {
            anyhow::bail!(
                "snapshot {} has version {}, newer than supported version {}",
                path.display(),
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }
        Ok(snapshot)
    }

    /// Write the snapshot as pretty JSON, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory: {}", dir.display()))?;

        let mut file = NamedTempFile::new_in(dir).context("failed to create temp file")?;
        serde_json::to_writer_pretty(&mut file, self).context("failed to serialize snapshot")?;
        file.write_all(b"\n").context("failed to write snapshot")?;
        file.persist(path)
            .with_context(|| format!("failed to replace snapshot: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use focuscoach_core::model::{NewProfile, Role, TemplateExample};

    fn sample() -> Snapshot {
        let profile = NewProfile {
            identity: "uid-1".into(),
            name: "Ada".into(),
            email: Some("ada@example.com".into()),
            role: Role::Student,
        }
        .into_profile("p-1".into(), Utc::now());
        Snapshot {
            profiles: vec![profile],
            templates: vec![SkillTemplate {
                domain: "Algebra".into(),
                examples: vec![TemplateExample {
                    question: "If 2x = 8, what is x?".into(),
                    correct: "4".into(),
                    logic: "halving the wrong side".into(),
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn save_creates_parent_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let snapshot = sample();
        snapshot.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"diagnostic_completed\": false"));
        assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"version": 99}"#).unwrap();
        let err = Snapshot::load(&path).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn corrupt_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = Snapshot::load(&path).unwrap_err();
        assert!(err.to_string().contains("store.json"));
    }
}
