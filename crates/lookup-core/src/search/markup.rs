//! Presentation formatting of result rows.
//!
//! Rows carry plain text only; hosts choose a formatter to render them.

use super::{ResultRow, RowKind};

/// Renders a row for a presentation host.
pub trait RowFormatter {
    fn format(&self, row: &ResultRow) -> String;
}

/// The row text as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl RowFormatter for PlainFormatter {
    fn format(&self, row: &ResultRow) -> String {
        row.display_text.clone()
    }
}

/// Simple HTML spans for hosts that render markup.
///
/// - header → `<b class="lookup-header">…</b>`
/// - detail → `<span class="lookup-detail">…</span>`
/// - status → `<i>…</i>`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSpanFormatter;

impl RowFormatter for HtmlSpanFormatter {
    fn format(&self, row: &ResultRow) -> String {
        let text = escape_html(&row.display_text);
        match row.kind {
            RowKind::Header => format!("<b class=\"lookup-header\">{}</b>", text),
            RowKind::Detail => format!("<span class=\"lookup-detail\">{}</span>", text),
            RowKind::Status => format!("<i>{}</i>", text),
        }
    }
}

fn escape_html(text: &str) -> String {
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
