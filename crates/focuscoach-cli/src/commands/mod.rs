//! Subcommand implementations.

pub mod init;
pub mod roster;
pub mod session;
pub mod templates;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use focuscoach_core::curriculum::{load_curriculum, Curriculum};
use focuscoach_providers::CoachConfig;

/// Curriculum from an explicit path, else the configured one, else the built-in reference.
pub fn resolve_curriculum(config: &CoachConfig, explicit: Option<&Path>) -> Result<Curriculum> {
    match explicit.or(config.curriculum_path.as_deref()) {
        Some(path) => load_curriculum(path),
        None => Curriculum::reference(),
    }
}
