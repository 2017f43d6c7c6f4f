//! Read-only line panes (conversation, log, users, help).

use std::collections::VecDeque;
use std::ops::Range;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use linechat::style::StyledLine;
use linechat::views::ViewDescriptor;

/// Calculate the maximum scroll offset to prevent overscroll.
/// Returns the maximum valid scroll position given total lines and visible height.
pub fn max_scroll(total_lines: usize, visible_height: usize) -> usize {
    total_lines.saturating_sub(visible_height)
}

/// Rows a line takes when ratatui wraps it at `width` columns.
fn wrapped_rows(line: &StyledLine, width: u16) -> usize {
    if width == 0 {
        return 1;
    }
    Paragraph::new(Line::raw(line.text.as_str()))
        .wrap(Wrap { trim: false })
        .line_count(width)
        .max(1)
}

/// The slice of a pane to draw so the newest line sits on the bottom row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailWindow {
    pub lines: Range<usize>,
    /// Wrapped rows of the first line that fall above the viewport.
    pub skip_rows: usize,
}

/// Walk back from the newest line (after skipping `scroll_back`) until the
/// `width` x `height` viewport is full.
pub fn tail_window(
    lines: &VecDeque<StyledLine>,
    scroll_back: usize,
    width: u16,
    height: usize,
    wrap: bool,
) -> TailWindow {
    let end = lines.len() - scroll_back.min(max_scroll(lines.len(), 1));
    let mut start = end;
    let mut rows = 0;
    while start > 0 && rows < height {
        rows += if wrap {
            wrapped_rows(&lines[start - 1], width)
        } else {
            1
        };
        start -= 1;
    }
    TailWindow {
        lines: start..end,
        skip_rows: rows.saturating_sub(height),
    }
}

pub fn render(
    frame: &mut Frame,
    view: &ViewDescriptor,
    lines: &VecDeque<StyledLine>,
    scroll_back: usize,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", view.title))
        .title_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);

    let window = if view.autoscroll {
        tail_window(lines, scroll_back, inner.width, inner.height as usize, view.wrap)
    } else {
        TailWindow {
            lines: 0..lines.len().min(inner.height as usize),
            skip_rows: 0,
        }
    };

    let text: Vec<Line> = lines
        .range(window.lines)
        .map(|line| Line::styled(line.text.as_str(), line.style))
        .collect();

    let skip_rows = u16::try_from(window.skip_rows).unwrap_or(u16::MAX);
    let mut paragraph = Paragraph::new(Text::from(text))
        .block(block)
        .scroll((skip_rows, 0));
    if view.wrap {
        paragraph = paragraph.wrap(Wrap { trim: false });
    }

    frame.render_widget(paragraph, area);
}
