//! Server line classification
//!
//! Every line the server pushes after the handshake is classified into one of
//! a few display kinds and rendered with colors. Classification is pure: the
//! same line always yields the same result.

use colored::{Color, Colorize};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Tag → color table for `[TAG] message` lines
pub const DISPLAY_RULES: &[(&str, Color)] = &[
    ("OK", Color::Green),
    ("ERR", Color::Red),
    ("ERROR", Color::Red),
    ("WARN", Color::Yellow),
    ("INFO", Color::Cyan),
    ("SERVER", Color::Magenta),
    ("FILE", Color::Blue),
    ("CMD", Color::BrightWhite),
    ("DEBUG", Color::BrightBlack),
];

/// Horizontal rule glyph used by the server for section dividers
pub const DIVIDER_GLYPH: char = '─';

/// Substrings of server self-diagnostics that are never shown
pub const DIAGNOSTIC_MARKERS: &[&str] = &["[internal]", "Client authenticated"];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([A-Z]+)\]\s(.*)$").expect("valid tag pattern"));

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*(?:Hostname|Address|Protocol|Connected|Last seen|Machine):)(.*)$")
        .expect("valid field pattern")
});

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ID:\s").expect("valid id pattern"));

static SUB_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{2,4}\S").expect("valid sub-item pattern"));

/// Color for a display tag, if the tag is known
pub fn tag_color(tag: &str) -> Option<Color> {
    DISPLAY_RULES
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, color)| *color)
}

/// A server line with its display kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine {
    /// `[TAG] content` with a known tag
    Tagged {
        tag: String,
        color: Color,
        content: String,
    },

    /// Section divider
    Divider(String),

    /// `Label: value` detail field; `label` keeps leading space and colon
    Field { label: String, value: String },

    /// `ID: ...` line
    Identifier(String),

    /// Indented sub-item
    SubItem(String),

    /// Anything else, shown as is
    Plain(String),
}

impl ClassifiedLine {
    /// Render the line with terminal colors
    pub fn render(&self) -> String {
        match self {
            ClassifiedLine::Tagged {
                tag,
                color,
                content,
            } => format!(
                "{} {}",
                format!("[{}]", tag).color(*color).bold(),
                content
            ),
            ClassifiedLine::Divider(line) => line.bright_black().to_string(),
            ClassifiedLine::Field { label, value } => {
                format!("{}{}", label.cyan().bold(), value)
            }
            ClassifiedLine::Identifier(line) => line.yellow().to_string(),
            ClassifiedLine::SubItem(line) => line.dimmed().to_string(),
            ClassifiedLine::Plain(line) => line.clone(),
        }
    }
}

/// Whether a line must be hidden from the interactive view
///
/// Hides lines carrying a JSON object with a `type` field (handshake echoes)
/// and server self-diagnostics. This also hides legitimate output that
/// happens to contain such JSON.
pub fn is_suppressed(line: &str) -> bool {
    if let Some(kind) = rctl_proto::embedded_message_type(line) {
        debug!(kind = %kind, "Suppressing typed JSON line");
        return true;
    }

    DIAGNOSTIC_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Classify one server line; `None` means the line is suppressed
pub fn classify(line: &str) -> Option<ClassifiedLine> {
    if is_suppressed(line) {
        return None;
    }

    if let Some(caps) = TAG_RE.captures(line) {
        if let Some(color) = tag_color(&caps[1]) {
            return Some(ClassifiedLine::Tagged {
                tag: caps[1].to_string(),
                color,
                content: caps[2].to_string(),
            });
        }
    }

    if line.contains(DIVIDER_GLYPH) {
        return Some(ClassifiedLine::Divider(line.to_string()));
    }

    if let Some(caps) = FIELD_RE.captures(line) {
        return Some(ClassifiedLine::Field {
            label: caps[1].to_string(),
            value: caps[2].to_string(),
        });
    }

    if ID_RE.is_match(line) {
        return Some(ClassifiedLine::Identifier(line.to_string()));
    }

    if SUB_ITEM_RE.is_match(line) {
        return Some(ClassifiedLine::SubItem(line.to_string()));
    }

    Some(ClassifiedLine::Plain(line.to_string()))
}

/// Classify and render every line of a text frame
///
/// Returns `None` when nothing is left to show.
pub fn render_frame(text: &str) -> Option<String> {
    let rendered: Vec<String> = text
        .lines()
        .filter_map(classify)
        .map(|line| line.render())
        .collect();

    if rendered.is_empty() {
        None
    } else {
        Some(rendered.join("\n"))
    }
}
