//! Display normalization for generated question text.
//!
//! Generators sometimes emit LaTeX commands despite being told not to, and
//! use `**bold**` for emphasis. These helpers turn both into something a
//! terminal can show.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const BOLD_ON: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[0m";

/// A run of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\%").expect("hardcoded regex"));

static OVERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\overline\{([^}]*)\}").expect("hardcoded regex"));

static SQRT_BRACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\sqrt\{([^}]*)\}").expect("hardcoded regex"));

static SQRT_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\sqrt\b").expect("hardcoded regex"));

static SYMBOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(leq|le|geq|ge|neq|ne|approx|cdot|times|pi)\b").expect("hardcoded regex")
});

fn symbol(command: &str) -> &'static str {
    match command {
        "le" | "leq" => "≤",
        "ge" | "geq" => "≥",
        "ne" | "neq" => "≠",
        "approx" => "≈",
        "cdot" => "·",
        "times" => "×",
        _ => "π",
    }
}

/// Rewrite common LaTeX fragments into plain Unicode.
///
/// `\overline` is applied before `\sqrt` so `\sqrt{\overline{AB}}` comes out
/// as `√AB`. Unknown commands are left untouched.
pub fn normalize_math(text: &str) -> String {
    let out = PERCENT.replace_all(text, "%");
    let out = OVERLINE.replace_all(&out, "$1");
    let out = SQRT_BRACED.replace_all(&out, "√$1");
    let out = SQRT_BARE.replace_all(&out, "√");
    SYMBOLS
        .replace_all(&out, |caps: &Captures| symbol(&caps[1]))
        .into_owned()
}

/// Split `**bold**` markers into spans. An unmatched marker is kept as text.
pub fn emphasis_spans(text: &str) -> Vec<Span> {
    let parts: Vec<&str> = text.split("**").collect();
    let paired = if parts.len() % 2 == 1 {
        parts.len()
    } else {
        // odd marker count: the last marker has no partner
        parts.len() - 1
    };

    let mut spans = Vec::new();
    for (i, part) in parts[..paired].iter().enumerate() {
        if !part.is_empty() {
            spans.push(Span {
                text: part.to_string(),
                bold: i % 2 == 1,
            });
        }
    }
    if paired < parts.len() {
        let tail = format!("**{}", parts[paired]);
        match spans.last_mut() {
            Some(last) if !last.bold => last.text.push_str(&tail),
            _ => spans.push(Span {
                text: tail,
                bold: false,
            }),
        }
    }
    spans
}

/// Normalized text with bold spans rendered as ANSI escapes.
pub fn to_terminal(text: &str) -> String {
    emphasis_spans(&normalize_math(text))
        .into_iter()
        .map(|s| {
            if s.bold {
                format!("{BOLD_ON}{}{BOLD_OFF}", s.text)
            } else {
                s.text
            }
        })
        .collect()
}

/// Normalized text with emphasis markers removed.
pub fn to_plain(text: &str) -> String {
    emphasis_spans(&normalize_math(text))
        .into_iter()
        .map(|s| s.text)
        .collect()
}
