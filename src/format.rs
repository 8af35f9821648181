//! Duration, status and error-text formatting for reports.

use once_cell::sync::Lazy;
use regex::Regex;

/// Icon token per status, as understood by the report's icon font
const STATUS_ICONS: &[(&str, &str)] = &[
    ("passed", "check_circle"),
    ("failed", "cancel"),
    ("skipped", "skip_next"),
    ("flaky", "warning"),
    ("timedOut", "hourglass_empty"),
];

/// ANSI sequences translated by [`ansi_to_html`]; anything else passes through
const ANSI_SPANS: &[(&str, &str)] = &[
    ("\u{1b}[31m", "<span style=\"color: red;\">"),
    ("\u{1b}[32m", "<span style=\"color: green;\">"),
    ("\u{1b}[33m", "<span style=\"color: yellow;\">"),
    ("\u{1b}[0m", "</span>"),
];

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;]*m").expect("static ANSI pattern is valid")
});

static SPAN_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span style="color: (?:red|green|yellow);">|</span>"#)
        .expect("static span pattern is valid")
});

/// Format a millisecond duration as `Xm Ys Zms`, omitting leading zero units.
///
/// Fractional milliseconds are floored. Negative input is formatted by
/// magnitude with a leading `-` on the whole string.
pub fn format_duration(ms: f64) -> String {
    if !ms.is_finite() {
        return "0ms".to_string();
    }
    let total = ms.abs().floor() as u64;
    let sign = if ms < 0.0 && total > 0 { "-" } else { "" };

    let minutes = total / 60_000;
    let seconds = (total % 60_000) / 1000;
    let millis = total % 1000;

    if minutes > 0 {
        format!("{}{}m {}s {}ms", sign, minutes, seconds, millis)
    } else if total >= 1000 {
        format!("{}{}s {}ms", sign, seconds, millis)
    } else {
        format!("{}{}ms", sign, millis)
    }
}

/// Icon token for a status name; unknown statuses have none
pub fn status_icon(status: &str) -> Option<&'static str> {
    STATUS_ICONS
        .iter()
        .find(|(name, _)| *name == status)
        .map(|(_, icon)| *icon)
}

/// Replace the red/green/yellow/reset escapes with inline spans and newlines
/// with `<br>`. This is not a general ANSI parser.
pub fn ansi_to_html(text: &str) -> String {
    let mut html = text.to_string();
    for (escape, span) in ANSI_SPANS {
        html = html.replace(escape, span);
    }
    html.replace('\n', "<br>")
}

/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Turn a raw or already-HTML-converted error message into plain text:
/// ANSI escapes and report markup removed, blank-line runs collapsed, trimmed.
pub fn clean_error_message(error: &str) -> String {
    let text = error.replace("<br>", "\n");
    let text = SPAN_MARKUP.replace_all(&text, "");
    let text = ANSI_ESCAPE.replace_all(&text, "");
    let text = unescape_html(&text);

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
