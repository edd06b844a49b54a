//! The `focuscoach templates` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;
use serde::Deserialize;

use focuscoach_core::model::SkillTemplate;
use focuscoach_providers::load_config_from;
use focuscoach_store::MemoryStore;

/// A template file holds one template or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    Many(Vec<SkillTemplate>),
    One(Box<SkillTemplate>),
}

impl TemplateFile {
    fn into_vec(self) -> Vec<SkillTemplate> {
        match self {
            TemplateFile::Many(templates) => templates,
            TemplateFile::One(template) => vec![*template],
        }
    }
}

pub async fn list(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = MemoryStore::open(&config.store_path)?;
    let templates = store.templates().await;

    if templates.is_empty() {
        println!("No templates. Import some with: focuscoach templates import <file.json>");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Domain", "Skill", "Base prompt", "Examples", "L1", "L2", "L3"]);
    for t in &templates {
        table.add_row(vec![
            t.domain.clone(),
            t.skill.clone().unwrap_or_else(|| "-".into()),
            if t.base_prompt.is_some() { "yes" } else { "no" }.to_string(),
            t.examples.len().to_string(),
            t.examples_level1.len().to_string(),
            t.examples_level2.len().to_string(),
            t.examples_level3.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn import(config_path: Option<PathBuf>, file: PathBuf) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let templates = serde_json::from_str::<TemplateFile>(&content)
        .with_context(|| format!("failed to parse templates: {}", file.display()))?
        .into_vec();

    if let Some(index) = templates.iter().position(|t| t.domain.trim().is_empty()) {
        anyhow::bail!("template {index} has an empty domain");
    }

    let curriculum = super::resolve_curriculum(&config, None)?;
    let store = MemoryStore::open(&config.store_path)?;
    let (mut created, mut replaced) = (0, 0);
    for template in templates {
        if curriculum.domain(&template.domain).is_none() {
            tracing::warn!(domain = %template.domain, "template domain is not in the curriculum");
        }
        if store.upsert_template(template).await? {
            created += 1;
        } else {
            replaced += 1;
        }
    }

    println!(
        "Imported {} template(s) ({created} new, {replaced} replaced).",
        created + replaced
    );
    Ok(())
}
