//! UI rendering module.
//!
//! Panels are drawn in descriptor order, each at the rectangle its geometry
//! gives for the current frame size.

mod input;
mod pane;

use ratatui::prelude::*;

use linechat::views::{PanelKind, VIEWS};

use crate::app::App;

/// Main render function - called every frame.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    for view in &VIEWS {
        let rect = view.geometry.rect(area);
        if rect.width == 0 || rect.height == 0 {
            continue;
        }

        match view.kind {
            PanelKind::Input => input::render(frame, app, view, rect),
            kind => {
                let Some(buffer) = app.pane(kind) else {
                    continue;
                };
                pane::render(frame, view, &buffer.lines, buffer.scroll_back, rect);
            }
        }
    }
}
