//! The `focuscoach init` command.

use std::path::Path;

use anyhow::Result;

use focuscoach_core::curriculum::REFERENCE_CURRICULUM;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("focuscoach.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("curriculum.toml"), REFERENCE_CURRICULUM.trim_start())?;

    println!("\nNext steps:");
    println!("  1. Set FOCUSCOACH_GEMINI_KEY (or use default_provider = \"mock\" to try it offline)");
    println!("  2. Run: focuscoach validate --curriculum curriculum.toml");
    println!("  3. Run: focuscoach session --learner you@example.com");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# focuscoach configuration

default_provider = "gemini"
default_model = "gemini-2.5-flash"
default_temperature = 0.7
max_retries = 2
retry_delay_ms = 1000
store_path = "./focuscoach-data/store.json"
curriculum_path = "curriculum.toml"

[providers.gemini]
type = "gemini"
api_key = "${FOCUSCOACH_GEMINI_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
model = "llama3.1"

[providers.mock]
type = "mock"
"#;
