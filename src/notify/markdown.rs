//! Minimal markdown to HTML conversion for report emails.
//!
//! Handles the subset the report assembler emits: `#`/`##`/`###` headings,
//! `-` bullet lists, `**bold**` spans and plain paragraphs. All text is
//! HTML-escaped before markup is applied.

use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").ok());

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    match BOLD.as_ref() {
        Some(re) => re.replace_all(&escaped, "<strong>$1</strong>").into_owned(),
        None => escaped,
    }
}

/// Convert report markdown into an HTML fragment.
#[must_use]
pub fn to_html(markdown: &str) -> String {
    let mut html = String::new();
    let mut in_list = false;

    for raw in markdown.lines() {
        let line = raw.trim_end();

        if let Some(item) = line.strip_prefix("- ") {
            if !in_list {
                html.push_str("<ul>\n");
                in_list = true;
            }
            html.push_str(&format!("<li>{}</li>\n", inline(item)));
            continue;
        }

        if in_list {
            html.push_str("</ul>\n");
            in_list = false;
        }

        if line.is_empty() {
            continue;
        }

        let heading = [("### ", "h3"), ("## ", "h2"), ("# ", "h1")]
            .into_iter()
            .find_map(|(prefix, tag)| line.strip_prefix(prefix).map(|rest| (tag, rest)));
        match heading {
            Some((tag, rest)) => html.push_str(&format!("<{tag}>{}</{tag}>\n", inline(rest))),
            None => html.push_str(&format!("<p>{}</p>\n", inline(line))),
        }
    }

    if in_list {
        html.push_str("</ul>\n");
    }
    html
}

/// Wrap an HTML fragment in a minimal styled document.
#[must_use]
pub fn to_html_document(title: &str, markdown: &str) -> String {
    format!(
        "<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body style=\"font-family: Arial, sans-serif; max-width: 720px; margin: 0 auto;\">\n\
         {}</body>\n</html>\n",
        escape_html(title),
        to_html(markdown)
    )
}
