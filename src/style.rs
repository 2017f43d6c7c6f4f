//! Marker-based line styling.
//!
//! Lines are styled by prefix: the first marker in a table's rule list that
//! the line starts with decides the style; lines that match nothing get the
//! table's fallback. Tables are plain values, built once and moved into the
//! thread that formats lines.

use ratatui::style::{Color, Style};

use crate::net::Frame;

/// Line prefixes with a style meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Error,
    Warn,
    Info,
    Debug,
    /// Private message from another user.
    PrivateMessage,
    /// Slash command typed by the local user.
    Command,
}

impl Marker {
    pub fn prefix(&self) -> &'static str {
        match self {
            Marker::Error => "[ERROR",
            Marker::Warn => "[WARN",
            Marker::Info => "[INFO",
            Marker::Debug => "[DEBUG",
            Marker::PrivateMessage => "(PM)",
            Marker::Command => "/",
        }
    }
}

/// A line of text ready for a pane, with the style it is drawn in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub text: String,
    pub style: Style,
}

impl StyledLine {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::default())
    }
}

/// Ordered marker-to-style rules. First match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    rules: Vec<(Marker, Style)>,
    fallback: Style,
    /// Match markers against the payload after any status code.
    skip_code: bool,
}

impl StyleTable {
    pub fn new(rules: Vec<(Marker, Style)>) -> Self {
        Self {
            rules,
            fallback: Style::default(),
            skip_code: false,
        }
    }

    /// Log pane: checked in the order ERROR, WARN, INFO, DEBUG.
    pub fn log() -> Self {
        Self::new(vec![
            (Marker::Error, Style::default().fg(Color::LightRed)),
            (Marker::Warn, Style::default().fg(Color::Yellow)),
            (Marker::Info, Style::default().fg(Color::LightMagenta)),
            (Marker::Debug, Style::default().fg(Color::LightCyan)),
        ])
    }

    /// Chat pane: private messages in gold, with or without a status code.
    pub fn chat() -> Self {
        Self {
            skip_code: true,
            ..Self::new(vec![(Marker::PrivateMessage, Style::default().fg(Color::Yellow))])
        }
    }

    /// Local echo of committed input: slash commands in green.
    pub fn echo() -> Self {
        Self::new(vec![(Marker::Command, Style::default().fg(Color::LightGreen))])
    }

    pub fn style_for(&self, text: &str) -> Style {
        let frame;
        let text = if self.skip_code {
            frame = Frame::parse(text);
            frame.payload.as_str()
        } else {
            text
        };
        self.rules
            .iter()
            .find(|(marker, _)| text.starts_with(marker.prefix()))
            .map(|(_, style)| *style)
            .unwrap_or(self.fallback)
    }

    /// Strip surrounding line terminators and pick the style.
    pub fn format(&self, raw: &str) -> StyledLine {
        let text = raw.trim_matches(['\r', '\n']);
        StyledLine::new(text, self.style_for(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_levels_map_to_colors() {
        let table = StyleTable::log();
        assert_eq!(table.style_for("[INFO hello").fg, Some(Color::LightMagenta));
        assert_eq!(table.style_for("[DEBUG noisy").fg, Some(Color::LightCyan));
        assert_eq!(table.style_for("[ERROR world").fg, Some(Color::LightRed));
        assert_eq!(table.style_for("[WARN careful").fg, Some(Color::Yellow));
    }

    #[test]
    fn test_unmarked_line_uses_fallback() {
        let table = StyleTable::log();
        assert_eq!(table.style_for("plain text"), Style::default());
        // Markers only count as prefixes
        assert_eq!(table.style_for("text [ERROR later"), Style::default());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = StyleTable::new(vec![
            (Marker::Command, Style::default().fg(Color::Green)),
            (Marker::Command, Style::default().fg(Color::Red)),
        ]);
        assert_eq!(table.style_for("/pm bob hi").fg, Some(Color::Green));
    }

    #[test]
    fn test_chat_private_message_is_gold() {
        let table = StyleTable::chat();
        assert_eq!(table.style_for("(PM) hi").fg, Some(Color::Yellow));
        assert_eq!(table.style_for("alice: hi"), Style::default());
    }

    #[test]
    fn test_chat_styles_coded_private_message() {
        let line = StyleTable::chat().format("100 (PM) hi\n");
        assert_eq!(
            line,
            StyledLine::new("100 (PM) hi", Style::default().fg(Color::Yellow))
        );
        // The code is only skipped when it is followed by a space
        assert_eq!(StyleTable::chat().style_for("100(PM) hi"), Style::default());
    }

    #[test]
    fn test_log_does_not_skip_codes() {
        assert_eq!(StyleTable::log().style_for("1 [ERROR boom"), Style::default());
    }

    #[test]
    fn test_echo_highlights_commands() {
        let table = StyleTable::echo();
        assert_eq!(table.style_for("/connect 10.0.0.1 9000").fg, Some(Color::LightGreen));
        assert_eq!(table.style_for("hello"), Style::default());
    }

    #[test]
    fn test_format_trims_terminators() {
        let line = StyleTable::log().format("[ERROR boom\r\n");
        assert_eq!(
            line,
            StyledLine::new("[ERROR boom", Style::default().fg(Color::LightRed))
        );
    }

    #[test]
    fn test_format_keeps_inner_carriage_return() {
        let line = StyleTable::chat().format("a\rb\n");
        assert_eq!(line.text, "a\rb");
    }
}
