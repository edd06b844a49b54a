//! Normalizes raw generated text into strict JSON before decoding.
//!
//! Generators wrap payloads in markdown fences, leave stray backslashes from
//! LaTeX-ish math, and sometimes put raw newlines inside string literals. The
//! passes here repair those so `serde_json` accepts the text. Every function is
//! total: no input makes them panic.

/// Recognized two-character escapes and their placeholders.
///
/// The escaped backslash comes first so that `\\"` (an escaped backslash
/// followed by a closing quote) is tokenized the way a JSON lexer would.
/// Placeholding and restoring both walk this table in the same order.
const ESCAPES: [(&str, &str); 8] = [
    ("\\\\", "\u{E000}BACKSLASH\u{E001}"),
    ("\\\"", "\u{E000}QUOTE\u{E001}"),
    ("\\/", "\u{E000}SLASH\u{E001}"),
    ("\\b", "\u{E000}B\u{E001}"),
    ("\\f", "\u{E000}F\u{E001}"),
    ("\\n", "\u{E000}N\u{E001}"),
    ("\\r", "\u{E000}R\u{E001}"),
    ("\\t", "\u{E000}T\u{E001}"),
];

const FENCE: &str = "```";

/// Full sanitize pass: strip fences, escape stray backslashes, escape raw
/// control characters inside string literals.
///
/// A single pass is sufficient. Re-sanitizing already sanitized text is not
/// part of the contract.
pub fn sanitize(raw: &str) -> String {
    let body = strip_code_fence(raw);
    let escaped = escape_stray_backslashes(body);
    escape_control_characters(&escaped)
}

/// Remove a surrounding markdown code fence (with optional language tag) and
/// surrounding whitespace.
///
/// Handles:
/// - ```` ```json ... ``` ```` blocks, closed or truncated
/// - prose before the opening fence or after the closing one
/// - a bare payload with only a trailing fence
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let body = match text.find(FENCE) {
        Some(0) => &text[FENCE.len()..],
        Some(start) if !starts_like_json(text) => &text[start + FENCE.len()..],
        _ => return text.strip_suffix(FENCE).unwrap_or(text).trim(),
    };

    // Language tag directly after the opening fence
    let body = body.trim_start_matches(|c: char| c.is_ascii_alphanumeric());

    match body.find(FENCE) {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn starts_like_json(text: &str) -> bool {
    text.starts_with(|c: char| c == '[' || c == '{')
}

/// Double every backslash that is not part of a recognized escape.
///
/// 1. Replace each recognized escape with its placeholder, in table order.
/// 2. Double every remaining backslash.
/// 3. Restore placeholders, in the same order.
pub fn escape_stray_backslashes(text: &str) -> String {
    let mut out = text.to_string();
    for (escape, placeholder) in ESCAPES {
        out = out.replace(escape, placeholder);
    }
    out = out.replace('\\', "\\\\");
    for (escape, placeholder) in ESCAPES {
        out = out.replace(placeholder, escape);
    }
    out
}

/// Escape raw control characters that appear inside JSON string literals.
///
/// Control characters between tokens are whitespace and kept as-is. Expects
/// backslashes to be well formed already (run after
/// [`escape_stray_backslashes`]).
pub fn escape_control_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c < ' ' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    out
}
