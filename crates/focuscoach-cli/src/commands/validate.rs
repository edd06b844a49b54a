//! The `focuscoach validate` command.

use std::path::PathBuf;

use anyhow::Result;

use focuscoach_core::curriculum::validate_curriculum;
use focuscoach_providers::load_config_from;

pub fn execute(config_path: Option<PathBuf>, curriculum_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let curriculum = super::resolve_curriculum(&config, curriculum_path.as_deref())?;

    println!(
        "Curriculum: {} ({} subjects, {} domains, {} diagnostic questions)",
        curriculum.name,
        curriculum.subjects.len(),
        curriculum.domains().len(),
        curriculum.diagnostic_slots()
    );

    let warnings = validate_curriculum(&curriculum);
    for w in &warnings {
        let prefix = w
            .subject
            .as_ref()
            .map(|s| format!("  [{s}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Curriculum valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
