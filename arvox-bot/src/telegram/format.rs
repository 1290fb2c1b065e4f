//! Markdown to Telegram HTML conversion.
//!
//! Completion replies arrive as loose Markdown. HTML parse mode is more
//! reliable than Telegram's Markdown modes (fewer escaping requirements,
//! consistent rendering across clients), so replies are converted here before
//! sending. The sender falls back to plain text when Telegram still rejects
//! the entities.

use regex::Regex;
use std::sync::LazyLock;

static H1_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^# (.+)$").unwrap());
static H2_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^## (.+)$").unwrap());
static H3_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{3,} (.+)$").unwrap());
static DASH_LIST_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)- (.*)$").unwrap());
static ASTERISK_LIST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)\* (.*)$").unwrap());
static QUOTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^> (.+)$").unwrap());
static BOLD_DOUBLE_ASTERISK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_\n]+?)_").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+?)`").unwrap());
static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static CODE_BLOCK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-zA-Z0-9]*\n?([\s\S]*?)```").unwrap());

/// Convert standard Markdown to Telegram-compatible HTML.
///
/// | Input          | Output                   |
/// |----------------|--------------------------|
/// | `# Title`      | `<b>Title</b>`           |
/// | `## Subtitle`  | `<b>Subtitle</b>`        |
/// | `### Section`  | `<i>Section</i>`         |
/// | `- Item`       | `• Item`                 |
/// | `> Quote`      | `┃ Quote`                |
/// | ` ```code``` ` | `<pre>code</pre>`        |
/// | `**bold**`     | `<b>bold</b>`            |
/// | `_italic_`     | `<i>italic</i>`          |
/// | `` `code` ``   | `<code>code</code>`      |
/// | `[text](url)`  | `<a href="url">text</a>` |
pub fn convert_to_telegram_html(input: &str) -> String {
    let with_code_blocks = convert_code_blocks(input);

    let lines: Vec<String> = with_code_blocks.lines().map(convert_line).collect();

    convert_inline_formatting(&lines.join("\n"))
}

/// Convert fenced code blocks to `<pre>` tags, escaping their contents.
fn convert_code_blocks(input: &str) -> String {
    CODE_BLOCK_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let code = caps.get(1).map_or("", |m| m.as_str());
            format!("<pre>{}</pre>", escape_html(code.trim()))
        })
        .to_string()
}

fn convert_line(line: &str) -> String {
    // Lines inside <pre> blocks are already processed
    if line.contains("<pre>") || line.contains("</pre>") {
        return line.to_string();
    }

    if let Some(caps) = H1_PATTERN.captures(line) {
        let title = caps.get(1).map_or("", |m| m.as_str());
        return format!("<b>{}</b>", escape_html(title));
    }

    if let Some(caps) = H2_PATTERN.captures(line) {
        let title = caps.get(1).map_or("", |m| m.as_str());
        return format!("<b>{}</b>", escape_html(title));
    }

    if let Some(caps) = H3_PATTERN.captures(line) {
        let title = caps.get(1).map_or("", |m| m.as_str());
        return format!("<i>{}</i>", escape_html(title));
    }

    if let Some(caps) = QUOTE_PATTERN.captures(line) {
        let text = caps.get(1).map_or("", |m| m.as_str());
        return format!("┃ <i>{}</i>", escape_html(text));
    }

    if let Some(caps) = DASH_LIST_PATTERN.captures(line) {
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let item = caps.get(2).map_or("", |m| m.as_str());
        return format!("{indent}• {item}");
    }

    if let Some(caps) = ASTERISK_LIST_PATTERN.captures(line) {
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let item = caps.get(2).map_or("", |m| m.as_str());
        return format!("{indent}• {item}");
    }

    line.to_string()
}

fn convert_inline_formatting(text: &str) -> String {
    let mut result = LINK_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let label = caps.get(1).map_or("", |m| m.as_str());
            let url = caps.get(2).map_or("", |m| m.as_str());
            format!("<a href=\"{url}\">{label}</a>")
        })
        .to_string();

    result = BOLD_DOUBLE_ASTERISK
        .replace_all(&result, "<b>$1</b>")
        .to_string();

    result = ITALIC_UNDERSCORE
        .replace_all(&result, "<i>$1</i>")
        .to_string();

    INLINE_CODE
        .replace_all(&result, |caps: &regex::Captures| {
            let code = caps.get(1).map_or("", |m| m.as_str());
            format!("<code>{}</code>", escape_html(code))
        })
        .to_string()
}

/// Escape HTML special characters.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
