//! The `focuscoach session` command: an interactive practice loop.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use focuscoach_core::model::{PracticeQuestion, OPTION_COUNT};
use focuscoach_core::pipeline::ContentPipeline;
use focuscoach_core::prompt::option_letter;
use focuscoach_core::scoring::DiagnosticScorer;
use focuscoach_core::session::{DiagnosticStep, DrillStep, Mode, SessionController};
use focuscoach_providers::{create_provider, load_config_from};
use focuscoach_report::markup::{to_plain, to_terminal};
use focuscoach_report::{render_text, write_report_card};
use focuscoach_store::MemoryStore;

pub struct SessionArgs {
    pub config: Option<PathBuf>,
    pub learner: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub provider: Option<String>,
    pub curriculum: Option<PathBuf>,
    pub report_out: Option<PathBuf>,
}

/// Line-oriented prompt reader over stdin.
struct Console {
    lines: Lines<BufReader<Stdin>>,
    styled: bool,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            styled: std::io::stdout().is_terminal(),
        }
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    fn render(&self, text: &str) -> String {
        if self.styled {
            to_terminal(text)
        } else {
            to_plain(text)
        }
    }

    fn show_question(&self, question: &PracticeQuestion) {
        println!("{}", self.render(&question.prompt));
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {}", option_letter(i), self.render(option));
        }
    }
}

/// Parse `A`-`D` (any case) or `1`-`4` into an option index.
pub fn parse_choice(input: &str) -> Option<usize> {
    let mut chars = input.trim().chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let index = match c.to_ascii_uppercase() {
        l @ 'A'..='Z' => (l as u8 - b'A') as usize,
        d @ '1'..='9' => (d as u8 - b'1') as usize,
        _ => return None,
    };
    (index < OPTION_COUNT).then_some(index)
}

/// `MM:SS` countdown text.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub async fn execute(args: SessionArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let curriculum = Arc::new(super::resolve_curriculum(&config, args.curriculum.as_deref())?);

    let provider_name = args
        .provider
        .clone()
        .unwrap_or_else(|| config.default_provider.clone());
    let generator = create_provider(&config.provider(&provider_name)?, &curriculum)?;
    info!(provider = %provider_name, generator = generator.name(), "content generator ready");

    let pipeline = ContentPipeline::new(generator, config.pipeline_config());
    let scorer = Arc::new(DiagnosticScorer::from_curriculum(&curriculum)?);
    let store = Arc::new(MemoryStore::open(&config.store_path)?);
    let mut controller = SessionController::new(
        args.learner.clone(),
        pipeline,
        scorer,
        store.clone(),
        store,
        Arc::clone(&curriculum),
    );
    let mut console = Console::new();

    controller.load().await?;
    loop {
        let keep_going = match controller.mode() {
            Mode::Setup => setup(&mut controller, &mut console, &args).await?,
            Mode::Diagnostic => diagnostic(&mut controller, &mut console).await?,
            Mode::Report => {
                report(&mut controller, &mut console, args.report_out.as_deref()).await?
            }
            Mode::Dashboard => dashboard(&mut controller, &mut console).await?,
            Mode::Drill => drill(&mut controller, &mut console).await?,
            Mode::Summary => {
                controller.return_to_dashboard()?;
                true
            }
            Mode::Loading => anyhow::bail!("session did not finish loading"),
        };
        if !keep_going {
            break;
        }
    }

    println!("\nGoodbye!");
    Ok(())
}

async fn setup(
    controller: &mut SessionController,
    console: &mut Console,
    args: &SessionArgs,
) -> Result<bool> {
    let name = match args.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => loop {
            match console.ask("What's your name? ").await? {
                None => return Ok(false),
                Some(name) if !name.is_empty() => break name,
                Some(_) => continue,
            }
        },
    };
    controller.create_profile(&name, args.email.clone()).await?;
    println!(
        "\nWelcome, {name}! Let's start with a {}-question diagnostic.",
        controller.curriculum().diagnostic_slots()
    );
    Ok(true)
}

async fn diagnostic(controller: &mut SessionController, console: &mut Console) -> Result<bool> {
    let budget = controller.curriculum().diagnostic_budget();
    println!(
        "Preparing your diagnostic ({} minutes on the clock)...",
        budget.as_secs() / 60
    );
    if let Err(e) = controller.start_diagnostic().await {
        println!("Could not prepare the diagnostic: {e}");
        return match console
            .ask("[r]etry, [s]kip to general practice, or [q]uit: ")
            .await?
            .as_deref()
        {
            None | Some("q") => Ok(false),
            Some("s") => {
                skip_diagnostic(controller).await?;
                Ok(true)
            }
            Some(_) => Ok(true),
        };
    }

    while let Some(question) = controller.current_diagnostic_question().cloned() {
        let (answered, total) = controller.diagnostic_progress().unwrap_or((0, 0));
        let remaining = controller.time_remaining().unwrap_or_default();
        println!(
            "\nQuestion {}/{}  [{}]  {} left",
            answered + 1,
            total,
            question.domain.as_deref().unwrap_or("General"),
            format_remaining(remaining)
        );
        console.show_question(&question);

        let line = tokio::select! {
            line = console.ask("Answer (A-D), or 'skip' to leave the diagnostic: ") => line?,
            _ = tokio::time::sleep(remaining) => {
                controller.check_deadline();
                println!("\nTime is up! Scoring the answers you gave.");
                break;
            }
        };
        let Some(line) = line else {
            return Ok(false);
        };
        if line.eq_ignore_ascii_case("skip") {
            skip_diagnostic(controller).await?;
            return Ok(true);
        }
        let Some(selected) = parse_choice(&line) else {
            println!("Please enter A, B, C or D.");
            continue;
        };
        match controller.answer_diagnostic(selected)? {
            DiagnosticStep::Next => {}
            DiagnosticStep::Complete => println!("\nDiagnostic complete!"),
            DiagnosticStep::TimeUp => {
                println!("\nTime is up! That answer came too late; scoring the earlier ones.")
            }
        }
    }
    Ok(true)
}

async fn skip_diagnostic(controller: &mut SessionController) -> Result<()> {
    let saved = controller.abandon_diagnostic().await?;
    println!("Diagnostic skipped. You'll start with general practice.");
    if !saved {
        println!("(warning: your profile could not be saved)");
    }
    Ok(())
}

async fn report(
    controller: &mut SessionController,
    console: &mut Console,
    report_out: Option<&Path>,
) -> Result<bool> {
    {
        let Some(report) = controller.report() else {
            anyhow::bail!("no diagnostic report to show");
        };
        println!("\n{}", render_text(report, controller.curriculum()));
        if let Some(path) = report_out {
            write_report_card(report, controller.curriculum(), path)?;
            println!("Report card written to {}", path.display());
        }
    }

    match console
        .ask("Press enter to accept this study plan, or 'q' to quit: ")
        .await?
        .as_deref()
    {
        None | Some("q") => return Ok(false),
        Some(_) => {}
    }
    if !controller.confirm_report().await? {
        println!("(warning: your study plan could not be saved)");
    }
    Ok(true)
}

async fn dashboard(controller: &mut SessionController, console: &mut Console) -> Result<bool> {
    controller.sync_profile();
    let mastery = controller.mastery();
    let Some(profile) = controller.profile() else {
        anyhow::bail!("no learner profile loaded");
    };
    println!("\n== {} ==", profile.name);
    println!(
        "Focus: {}  |  Mastery: {} ({})  |  Streak: {}",
        profile.focus.label(),
        mastery,
        mastery.tier(),
        profile.streak
    );
    if !profile.weaknesses.is_empty() {
        let top: Vec<&str> = profile.weaknesses.iter().take(3).map(String::as_str).collect();
        println!("Work on next: {}", top.join(", "));
    }

    match console.ask("[d]rill or [q]uit: ").await?.as_deref() {
        None | Some("q") => Ok(false),
        Some("d") | Some("") => {
            println!("Generating questions...");
            if let Err(e) = controller.start_drill().await {
                println!("Could not generate questions: {e}. Try again.");
            }
            Ok(true)
        }
        Some(other) => {
            println!("Unknown choice: {other}");
            Ok(true)
        }
    }
}

async fn drill(controller: &mut SessionController, console: &mut Console) -> Result<bool> {
    let (Some(question), Some(progress)) = (
        controller.current_question().cloned(),
        controller.drill_progress(),
    ) else {
        anyhow::bail!("no drill question to show");
    };
    println!(
        "\nQuestion {}/{}  |  Mastery {} ({})",
        progress.index + 1,
        progress.total,
        controller.mastery(),
        controller.tier()
    );
    console.show_question(&question);

    let selected = loop {
        match console.ask("Answer (A-D), or 'quit': ").await? {
            None => return Ok(false),
            Some(line) if line.eq_ignore_ascii_case("quit") => {
                controller.abandon_drill()?;
                println!("Drill ended early. Your streak is unchanged.");
                return Ok(true);
            }
            Some(line) => match parse_choice(&line) {
                Some(index) => break index,
                None => println!("Please enter A, B, C or D."),
            },
        }
    };

    let outcome = controller.submit_answer(selected).await?;
    println!(
        "{}  Mastery {} ({:+})",
        outcome.feedback, outcome.mastery, outcome.delta
    );
    if !outcome.correct {
        println!(
            "The answer was {}.",
            option_letter(outcome.correct_index)
        );
    }
    if outcome.tier != outcome.previous_tier {
        println!("Tier changed: {} -> {}", outcome.previous_tier, outcome.tier);
    }
    println!("{}", console.render(&outcome.explanation));
    if !outcome.persisted {
        println!("(warning: this answer could not be saved)");
    }

    loop {
        let Some(message) = console
            .ask("Ask the tutor about this question, or press enter to continue: ")
            .await?
        else {
            return Ok(false);
        };
        if message.is_empty() {
            break;
        }
        match controller.ask_tutor(&message).await {
            Ok(Some(reply)) => println!("Tutor: {}", console.render(&reply)),
            Ok(None) => {}
            Err(e) => println!("The tutor is unavailable right now: {e}"),
        }
    }

    if let DrillStep::Complete(summary) = controller.next_question().await? {
        println!(
            "\nBatch complete: {}/{} correct. Streak: {}",
            summary.correct, summary.total, summary.streak
        );
        if !summary.persisted {
            println!("(warning: your streak could not be saved)");
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_by_letter_or_number() {
        assert_eq!(parse_choice("a"), Some(0));
        assert_eq!(parse_choice(" D "), Some(3));
        assert_eq!(parse_choice("2"), Some(1));
        assert_eq!(parse_choice("E"), None);
        assert_eq!(parse_choice("5"), None);
        assert_eq!(parse_choice("ab"), None);
        assert_eq!(parse_choice(""), None);
        assert_eq!(parse_choice("?"), None);
    }

    #[test]
    fn countdown_text() {
        assert_eq!(format_remaining(Duration::from_secs(1500)), "25:00");
        assert_eq!(format_remaining(Duration::from_secs(61)), "01:01");
        assert_eq!(format_remaining(Duration::ZERO), "00:00");
    }
}
