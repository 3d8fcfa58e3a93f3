//! Formatting utilities (usage report → Telegram HTML).

use crate::usage::types::UsageReport;

/// Heading used for the subscription account section.
pub const ACCOUNT_SECTION_TITLE: &str = "Dler Cloud";

/// Generic reply for any failed query; the detailed cause only goes to the log.
pub const QUERY_FAILED_MESSAGE: &str = "Oops, the query failed";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a report for Telegram HTML parse mode.
///
/// Without hosting integration the reply is just the two account lines; with it, every
/// source gets its own bold section.
pub fn render_report_html(report: &UsageReport) -> String {
    if !report.hosting_enabled {
        return usage_lines(&report.account.used, &report.account.unused);
    }

    let mut sections = Vec::with_capacity(report.instances.len() + 1);
    sections.push(section(
        ACCOUNT_SECTION_TITLE,
        &report.account.used,
        &report.account.unused,
    ));
    for inst in &report.instances {
        sections.push(section(&inst.name, &inst.used, &inst.unused));
    }
    sections.join("\n\n")
}

fn section(title: &str, used: &str, unused: &str) -> String {
    format!("<b>{}</b>\n{}", escape_html(title), usage_lines(used, unused))
}

fn usage_lines(used: &str, unused: &str) -> String {
    format!(
        "Used: {}\nUnused: {}",
        escape_html(used),
        escape_html(unused)
    )
}

pub fn help_html() -> String {
    [
        "<b>Traffic bot</b>",
        "",
        "/info - show traffic usage",
        "/help - show this message",
    ]
    .join("\n")
}
