//! Mastery scalar, tier policy, and the per-answer reward table.
//!
//! Tier is always derived from mastery through [`Tier::of`]; nothing else in
//! the crate compares raw mastery against thresholds.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the Standard tier.
pub const STANDARD_THRESHOLD: u8 = 25;
/// Lower bound (inclusive) of the Elite tier.
pub const ELITE_THRESHOLD: u8 = 75;

/// Learner proficiency estimate in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mastery(u8);

impl Mastery {
    pub const MIN: Mastery = Mastery(0);
    pub const MAX: Mastery = Mastery(100);

    /// Build a mastery value, clamping into `0..=100`.
    pub fn new(value: i32) -> Self {
        Mastery(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn tier(self) -> Tier {
        Tier::of(self)
    }

    /// Apply a signed delta, clamped.
    pub fn apply(self, delta: i32) -> Self {
        Mastery::new(i32::from(self.0) + delta)
    }
}

impl fmt::Display for Mastery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behavioral policy bucket derived from mastery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Foundational,
    Standard,
    Elite,
}

impl Tier {
    pub fn of(mastery: Mastery) -> Tier {
        match mastery.value() {
            v if v < STANDARD_THRESHOLD => Tier::Foundational,
            v if v < ELITE_THRESHOLD => Tier::Standard,
            _ => Tier::Elite,
        }
    }

    /// Difficulty label used in drill instructions.
    pub fn difficulty_label(self) -> &'static str {
        match self {
            Tier::Foundational => "Foundational/Easy",
            Tier::Standard => "Medium/Standard",
            Tier::Elite => "Hard/Advanced",
        }
    }

    /// Index into a template's tiered example lists (1-based level).
    pub fn level(self) -> u8 {
        match self {
            Tier::Foundational => 1,
            Tier::Standard => 2,
            Tier::Elite => 3,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Foundational => write!(f, "Foundational"),
            Tier::Standard => write!(f, "Standard"),
            Tier::Elite => write!(f, "Elite"),
        }
    }
}

/// Outcome of the reward table for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub delta: i32,
    /// Only set on the Standard-tier, correct, within-target branch.
    pub was_fast: bool,
    /// Whether the response-time target was consulted at all.
    pub timed: bool,
}

/// Reward for a single drill answer.
///
/// | Tier         | correct, fast | correct, slow | incorrect |
/// |--------------|---------------|---------------|-----------|
/// | Foundational | +4            | +4            | -1        |
/// | Standard     | +3            | +1            | -2        |
/// | Elite        | +2            | +2            | -3        |
///
/// `elapsed <= target` counts as within target.
pub fn reward(tier: Tier, correct: bool, elapsed: Duration, target: Duration) -> Reward {
    match (tier, correct) {
        (Tier::Foundational, true) => Reward::untimed(4),
        (Tier::Foundational, false) => Reward::untimed(-1),
        (Tier::Standard, true) if elapsed <= target => Reward {
            delta: 3,
            was_fast: true,
            timed: true,
        },
        (Tier::Standard, true) => Reward {
            delta: 1,
            was_fast: false,
            timed: true,
        },
        (Tier::Standard, false) => Reward::untimed(-2),
        (Tier::Elite, true) => Reward::untimed(2),
        (Tier::Elite, false) => Reward::untimed(-3),
    }
}

impl Reward {
    fn untimed(delta: i32) -> Self {
        Reward {
            delta,
            was_fast: false,
            timed: false,
        }
    }
}

/// Feedback line shown after an answer.
pub fn feedback_text(correct: bool, reward: &Reward, elapsed: Duration, target: Duration) -> String {
    if !correct {
        return "Incorrect.".to_string();
    }
    if !reward.timed {
        return "Correct!".to_string();
    }
    let secs = elapsed.as_secs_f64().round() as u64;
    if reward.was_fast {
        format!("Correct! ({secs}s)")
    } else {
        format!(
            "Correct, but slow ({secs}s). Target: {}s",
            target.as_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIXTY: Duration = Duration::from_secs(60);

    #[test]
    fn tier_boundaries() {
        assert_eq!(Tier::of(Mastery::new(0)), Tier::Foundational);
        assert_eq!(Tier::of(Mastery::new(24)), Tier::Foundational);
        assert_eq!(Tier::of(Mastery::new(25)), Tier::Standard);
        assert_eq!(Tier::of(Mastery::new(74)), Tier::Standard);
        assert_eq!(Tier::of(Mastery::new(75)), Tier::Elite);
        assert_eq!(Tier::of(Mastery::new(100)), Tier::Elite);
    }

    #[test]
    fn mastery_clamps() {
        assert_eq!(Mastery::new(-4), Mastery::MIN);
        assert_eq!(Mastery::new(130), Mastery::MAX);
        assert_eq!(Mastery::new(1).apply(-3), Mastery::MIN);
        assert_eq!(Mastery::new(99).apply(4), Mastery::MAX);
        assert_eq!(Mastery::new(40).apply(3).value(), 43);
    }

    #[test]
    fn standard_fast_and_slow() {
        let fast = reward(Tier::Standard, true, Duration::from_secs(12), SIXTY);
        assert_eq!(fast.delta, 3);
        assert!(fast.was_fast);

        let slow = reward(Tier::Standard, true, Duration::from_secs(61), SIXTY);
        assert_eq!(slow.delta, 1);
        assert!(!slow.was_fast);

        let wrong = reward(Tier::Standard, false, Duration::from_secs(5), SIXTY);
        assert_eq!(wrong.delta, -2);
        assert!(!wrong.was_fast);
    }

    #[test]
    fn exactly_on_target_is_fast() {
        let r = reward(Tier::Standard, true, SIXTY, SIXTY);
        assert_eq!(r.delta, 3);
        assert!(r.was_fast);
    }

    #[test]
    fn foundational_and_elite_ignore_time() {
        let slow = Duration::from_secs(600);
        assert_eq!(reward(Tier::Foundational, true, slow, SIXTY).delta, 4);
        assert_eq!(reward(Tier::Foundational, false, slow, SIXTY).delta, -1);
        assert_eq!(reward(Tier::Elite, true, slow, SIXTY).delta, 2);
        assert_eq!(reward(Tier::Elite, false, slow, SIXTY).delta, -3);
        assert!(!reward(Tier::Elite, true, Duration::ZERO, SIXTY).was_fast);
        assert!(!reward(Tier::Foundational, true, Duration::ZERO, SIXTY).was_fast);
    }

    #[test]
    fn feedback_lines() {
        let fast = reward(Tier::Standard, true, Duration::from_secs(20), SIXTY);
        assert_eq!(
            feedback_text(true, &fast, Duration::from_secs(20), SIXTY),
            "Correct! (20s)"
        );
        let slow = reward(Tier::Standard, true, Duration::from_secs(75), SIXTY);
        assert_eq!(
            feedback_text(true, &slow, Duration::from_secs(75), SIXTY),
            "Correct, but slow (75s). Target: 60s"
        );
        let elite = reward(Tier::Elite, false, Duration::ZERO, SIXTY);
        assert_eq!(feedback_text(false, &elite, Duration::ZERO, SIXTY), "Incorrect.");
    }
}
