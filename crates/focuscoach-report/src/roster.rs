//! Counselor roster: learner status at a glance.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use focuscoach_core::model::{LearnerProfile, Role};

/// Mastery below this marks a learner as at risk.
pub const AT_RISK_BELOW: u8 = 40;
/// Learners idle longer than this many days are inactive.
pub const INACTIVE_AFTER_DAYS: i64 = 3;

/// How a learner is doing, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    AtRisk,
    Unknown,
    Inactive,
    OnTrack,
}

impl RosterStatus {
    /// Classify a profile as of `now`.
    pub fn classify(profile: &LearnerProfile, now: DateTime<Utc>) -> Self {
        if profile.mastery.value() < AT_RISK_BELOW {
            return RosterStatus::AtRisk;
        }
        match profile.last_active {
            None => RosterStatus::Unknown,
            Some(at) if now - at > Duration::days(INACTIVE_AFTER_DAYS) => RosterStatus::Inactive,
            Some(_) => RosterStatus::OnTrack,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RosterStatus::AtRisk => "At Risk",
            RosterStatus::Unknown => "Unknown",
            RosterStatus::Inactive => "Inactive",
            RosterStatus::OnTrack => "On Track",
        }
    }
}

impl std::fmt::Display for RosterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub focus: String,
    pub mastery: u8,
    pub streak: u32,
    pub last_active: Option<DateTime<Utc>>,
    pub status: RosterStatus,
}

/// Build the roster: students only, most recently active first, never-active last.
pub fn build_roster(profiles: &[LearnerProfile], now: DateTime<Utc>) -> Vec<RosterEntry> {
    let mut students: Vec<&LearnerProfile> =
        profiles.iter().filter(|p| p.role == Role::Student).collect();
    students.sort_by(|a, b| match (a.last_active, b.last_active) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    students
        .into_iter()
        .map(|p| RosterEntry {
            id: p.id.clone(),
            name: p.name.clone(),
            email: p.email.clone(),
            focus: p.focus.label().to_string(),
            mastery: p.mastery.value(),
            streak: p.streak,
            last_active: p.last_active,
            status: RosterStatus::classify(p, now),
        })
        .collect()
}

/// Human description of how long ago `at` was.
pub fn last_seen(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "never".to_string();
    };
    let elapsed = now - at;
    if elapsed.num_days() >= 1 {
        format!("{}d ago", elapsed.num_days())
    } else if elapsed.num_hours() >= 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        "just now".to_string()
    }
}
