//! Input pane.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};

use linechat::views::ViewDescriptor;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, view: &ViewDescriptor, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", view.title))
        .title_style(Style::default().fg(Color::Green))
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(&app.input, inner);
}
