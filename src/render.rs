//! Report rendering boundary.
//!
//! The aggregator hands fully populated records and summaries to a
//! [`Renderer`] and writes whatever document comes back. [`HtmlRenderer`] is
//! the built-in implementation; a templating engine can be plugged in by
//! implementing the trait.

use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

use crate::error::{ReportError, ReportResult};
use crate::format::escape_html;
use crate::reporter::events::TestStatus;
use crate::reporter::types::{RunSummary, TestResultRecord};
use crate::tags::badge_css;

/// Turns report data into documents
pub trait Renderer {
    /// Document for a single test
    fn render_test(&self, record: &TestResultRecord) -> ReportResult<String>;

    /// Aggregate document for the whole run
    fn render_summary(&self, summary: &RunSummary) -> ReportResult<String>;
}

/// Self-contained HTML pages with inline styles
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

const STYLE: &str = "\
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px; background: #f5f5f5; }
    .container { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
    h1 { color: #333; border-bottom: 2px solid #4CAF50; padding-bottom: 10px; }
    .status-passed { color: #4CAF50; }
    .status-failed, .status-timedOut, .status-interrupted { color: #f44336; }
    .status-skipped { color: #ff9800; }
    .tag { display: inline-block; padding: 2px 8px; margin: 2px; border-radius: 12px; font-size: 0.85em; }
    .tag-invalid { text-decoration: line-through; }
    .summary { display: flex; gap: 20px; margin: 20px 0; }
    .stat { padding: 20px; border-radius: 8px; text-align: center; flex: 1; background: #f8f9fa; }
    .stat-value { font-size: 2em; font-weight: bold; }
    .error-box { background: #ffebee; padding: 15px; border-radius: 4px; margin: 10px 0; font-family: monospace; }
    pre { background: #263238; color: #aed581; padding: 15px; border-radius: 4px; overflow-x: auto; white-space: pre-wrap; }
    table { border-collapse: collapse; width: 100%; margin: 20px 0; }
    th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
    img { max-width: 100%; border: 1px solid #ddd; }";

const COPY_SCRIPT: &str = "\
function copyPrompt(id, button) {
  const text = document.getElementById(id).innerText;
  navigator.clipboard.writeText(text).then(() => {
    const label = button.innerText;
    button.innerText = 'Copied!';
    setTimeout(() => { button.innerText = label; }, 2000);
  });
}";

fn open_document(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "  <meta charset=\"UTF-8\">")?;
    writeln!(out, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(out, "  <title>{}</title>", escape_html(title))?;
    writeln!(out, "  <style>\n{}\n  </style>", STYLE)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<div class=\"container\">")
}

fn close_document(out: &mut String) -> std::fmt::Result {
    writeln!(out, "</div>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn write_list(out: &mut String, heading: &str, items: &[String]) -> std::fmt::Result {
    writeln!(out, "  <h2>{}</h2>", heading)?;
    writeln!(out, "  <ol>")?;
    for item in items {
        writeln!(out, "    <li>{}</li>", escape_html(item))?;
    }
    writeln!(out, "  </ol>")
}

fn write_tags(out: &mut String, record: &TestResultRecord) -> std::fmt::Result {
    if record.tag_meta.is_empty() {
        return Ok(());
    }
    write!(out, "  <p class=\"tags\">")?;
    for tag in &record.tag_meta {
        let class = if tag.valid { "tag" } else { "tag tag-invalid" };
        let title = tag
            .error
            .as_deref()
            .unwrap_or_else(|| tag.category_name());
        write!(
            out,
            "<span class=\"{}\" style=\"{}\" title=\"{}\">{}</span>",
            class,
            badge_css(&tag.color),
            escape_html(title),
            escape_html(&tag.normalized)
        )?;
    }
    writeln!(out, "</p>")
}

fn write_attachments(out: &mut String, record: &TestResultRecord) -> std::fmt::Result {
    if !record.screenshot_paths.is_empty() {
        writeln!(out, "  <h2>Screenshots</h2>")?;
        for path in &record.screenshot_paths {
            writeln!(out, "  <img src=\"{}\" alt=\"screenshot\">", escape_html(path))?;
        }
    }
    if let Some(video) = &record.video_path {
        let video = escape_html(video);
        writeln!(out, "  <h2>Video</h2>")?;
        writeln!(out, "  <video src=\"{}\" controls width=\"800\"></video>", video)?;
        writeln!(out, "  <p><a href=\"{}\" download>Download video</a></p>", video)?;
    }
    if !record.attachments.is_empty() {
        writeln!(out, "  <h2>Attachments</h2>")?;
        writeln!(out, "  <ul>")?;
        for attachment in &record.attachments {
            writeln!(
                out,
                "    <li><a href=\"{}\">{}</a></li>",
                escape_html(&attachment.path),
                escape_html(&attachment.name)
            )?;
        }
        writeln!(out, "  </ul>")?;
    }
    Ok(())
}

fn write_prompts(out: &mut String, record: &TestResultRecord) -> std::fmt::Result {
    let Some(prompts) = &record.prompts else {
        return Ok(());
    };
    writeln!(out, "  <h2>AI Debugging Prompts</h2>")?;
    for (id, label, text) in [
        ("prompt-full", "Full Analysis", &prompts.full),
        ("prompt-quick", "Quick Analysis", &prompts.quick),
        ("prompt-debug", "Debugging", &prompts.debug),
    ] {
        writeln!(out, "  <h3>{}</h3>", label)?;
        writeln!(
            out,
            "  <button type=\"button\" onclick=\"copyPrompt('{}', this)\">Copy Prompt</button>",
            id
        )?;
        writeln!(out, "  <pre id=\"{}\">{}</pre>", id, escape_html(text))?;
    }
    writeln!(out, "  <script>\n{}\n  </script>", COPY_SCRIPT)
}

fn test_page(record: &TestResultRecord) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    open_document(&mut out, &record.title)?;

    writeln!(
        out,
        "  <h1>{} <span class=\"status-{}\" data-icon=\"{}\">({})</span></h1>",
        escape_html(&record.title),
        record.status,
        record.status_icon,
        record.status.as_str().to_uppercase()
    )?;
    writeln!(
        out,
        "  <p>#{} | {} | {}:{}:{} | Duration: {}</p>",
        record.num,
        escape_html(&record.browser),
        escape_html(&record.file_name),
        record.line,
        record.column,
        escape_html(&record.duration)
    )?;
    write_tags(&mut out, record)?;

    if let Some(description) = &record.description {
        writeln!(out, "  <p class=\"description\">{}</p>", escape_html(description))?;
    }

    write_list(&mut out, "Pre-conditions", &record.pre_conditions)?;
    write_list(&mut out, "Steps", &record.steps)?;
    write_list(&mut out, "Post-conditions", &record.post_conditions)?;

    if !record.errors.is_empty() {
        writeln!(out, "  <h2>Errors</h2>")?;
        for error in &record.errors {
            // already HTML-safe
            writeln!(out, "  <div class=\"error-box\">{}</div>", error)?;
        }
    }

    write_attachments(&mut out, record)?;
    write_prompts(&mut out, record)?;
    close_document(&mut out)?;
    Ok(out)
}

fn summary_page(summary: &RunSummary) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    open_document(&mut out, "Test Run Summary")?;

    let status = summary.status.map(|s| s.as_str()).unwrap_or("unknown");
    writeln!(
        out,
        "  <h1>Test Run Summary <span class=\"status-{}\" data-icon=\"{}\">({})</span></h1>",
        status,
        summary.status_icon,
        status.to_uppercase()
    )?;
    writeln!(out, "  <p>Duration: {}</p>", escape_html(&summary.duration))?;

    writeln!(out, "  <div class=\"summary\">")?;
    for (label, value) in [
        ("Total", summary.total),
        ("Passed", summary.total_passed),
        ("Failed", summary.total_failed),
        ("Skipped", summary.total_skipped),
        ("Flaky", summary.total_flaky),
    ] {
        writeln!(
            out,
            "    <div class=\"stat\"><div class=\"stat-value\">{}</div><div>{}</div></div>",
            value, label
        )?;
    }
    writeln!(out, "  </div>")?;

    if let Some(env) = &summary.environment {
        writeln!(out, "  <h2>Environment</h2>")?;
        writeln!(out, "  <table>")?;
        for (label, value) in [
            ("OS", env.os.clone()),
            ("Host", env.hostname.clone()),
            ("Runtime", env.runtime_version.clone()),
            ("Automation library", env.library_version.clone()),
            ("Browsers", env.browsers.join(", ")),
            (
                "Started",
                env.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ),
        ] {
            writeln!(
                out,
                "    <tr><th>{}</th><td>{}</td></tr>",
                label,
                escape_html(&value)
            )?;
        }
        writeln!(out, "  </table>")?;
    }

    for (file_name, records) in &summary.grouped_results {
        writeln!(out, "  <h2>{}</h2>", escape_html(file_name))?;
        writeln!(out, "  <table>")?;
        writeln!(
            out,
            "    <tr><th>#</th><th>Test</th><th>Browser</th><th>Status</th><th>Duration</th></tr>"
        )?;
        for record in records {
            let status_class = match record.status {
                TestStatus::Passed => "status-passed",
                TestStatus::Skipped => "status-skipped",
                _ => "status-failed",
            };
            writeln!(
                out,
                "    <tr><td>{num}</td><td><a href=\"{num}/index.html\">{}</a></td><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>",
                escape_html(&record.title),
                escape_html(&record.browser),
                status_class,
                record.status,
                escape_html(&record.duration),
                num = record.num,
            )?;
        }
        writeln!(out, "  </table>")?;
    }

    close_document(&mut out)?;
    Ok(out)
}

impl Renderer for HtmlRenderer {
    fn render_test(&self, record: &TestResultRecord) -> ReportResult<String> {
        test_page(record).map_err(|e| ReportError::Render(format!("test #{}: {}", record.num, e)))
    }

    fn render_summary(&self, summary: &RunSummary) -> ReportResult<String> {
        summary_page(summary).map_err(|e| ReportError::Render(format!("summary: {}", e)))
    }
}

/// Write a rendered document, creating its directory first
pub fn write_document(path: &Path, contents: &str) -> ReportResult<()> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    };
    write().map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
