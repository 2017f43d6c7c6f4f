//! Application state management.
//!
//! `App` holds everything the renderer draws: one line buffer per pane, the
//! input editor, and the dirty flag. It is owned by the renderer thread and
//! fed by draining the bridge's event queue once per frame.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{Receiver, Sender};

use tracing::{debug, warn};
use tui_textarea::TextArea;

use linechat::bridge::{RendererPort, UiEvent};
use linechat::style::{StyleTable, StyledLine};
use linechat::views::{PanelKind, VIEWS};

/// Lines moved per PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// Command that ends the renderer loop instead of being sent.
const EXIT_COMMAND: &str = "/exit";

/// Lines kept per pane; the oldest are dropped past this.
pub const MAX_PANE_LINES: usize = 5000;

/// Lines of one read-only pane.
#[derive(Debug, Default)]
pub struct Pane {
    pub lines: VecDeque<StyledLine>,
    /// Lines scrolled back from the newest one. Zero follows the tail.
    pub scroll_back: usize,
}

/// Main application state.
pub struct App<'a> {
    /// Flag to exit the application.
    pub should_quit: bool,

    /// Dirty flag - set when UI needs to be redrawn.
    /// Resets to false after each draw.
    needs_redraw: bool,

    /// Single-line input editor (the focused pane).
    pub input: TextArea<'a>,

    panes: HashMap<PanelKind, Pane>,

    /// Style for the local echo of committed lines.
    echo: StyleTable,

    events: Receiver<UiEvent>,
    outbound: Sender<String>,
}

impl<'a> App<'a> {
    /// Build the panes from their descriptors and list `local_name` as the
    /// first user.
    pub fn new(port: RendererPort, local_name: &str) -> Self {
        let mut panes: HashMap<PanelKind, Pane> = VIEWS
            .iter()
            .filter(|view| !view.editable)
            .map(|view| {
                let pane = Pane {
                    lines: view.seed.iter().map(|line| StyledLine::plain(*line)).collect(),
                    scroll_back: 0,
                };
                (view.kind, pane)
            })
            .collect();
        if let Some(users) = panes.get_mut(&PanelKind::Users) {
            users.lines.push_back(StyledLine::plain(local_name));
        }

        Self {
            should_quit: false,
            needs_redraw: true, // Initial draw required
            input: TextArea::default(),
            panes,
            echo: StyleTable::echo(),
            events: port.events,
            outbound: port.outbound,
        }
    }

    // ===== Dirty Flag (Rendering Optimization) =====

    /// Mark UI as needing redraw.
    pub fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    /// Check if redraw is needed and reset the flag.
    pub fn take_needs_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    // ===== Bridge Events =====

    /// Apply every queued UI event without blocking.
    pub fn poll_ui_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Append { panel, line } => self.append(panel, line),
        }
    }

    fn append(&mut self, panel: PanelKind, line: StyledLine) {
        let Some(pane) = self.panes.get_mut(&panel) else {
            debug!("Dropping line for {:?}: pane is not a line buffer", panel);
            return;
        };
        pane.lines.push_back(line);
        // Keep a scrolled-back view anchored on the same lines
        if pane.scroll_back > 0 {
            pane.scroll_back += 1;
        }
        while pane.lines.len() > MAX_PANE_LINES {
            pane.lines.pop_front();
        }
        pane.scroll_back = pane.scroll_back.min(pane.lines.len().saturating_sub(1));
        self.mark_dirty();
    }

    pub fn pane(&self, kind: PanelKind) -> Option<&Pane> {
        self.panes.get(&kind)
    }

    /// Texts of a pane, oldest first.
    #[allow(dead_code)] // Useful for debugging/testing
    pub fn pane_lines(&self, kind: PanelKind) -> Vec<&str> {
        self.pane(kind)
            .map(|pane| pane.lines.iter().map(|line| line.text.as_str()).collect())
            .unwrap_or_default()
    }

    // ===== Input =====

    /// Enter on the input pane.
    ///
    /// The first input line, trimmed of line terminators, is ignored when
    /// empty, quits on `/exit`, and is otherwise sent on the outbound
    /// channel and echoed into the chat pane.
    pub fn commit_input(&mut self) {
        let line = self
            .input
            .lines()
            .first()
            .map(|first| first.trim_matches(['\r', '\n']).to_string())
            .unwrap_or_default();
        self.clear_input();

        if line.is_empty() {
            return;
        }
        if line == EXIT_COMMAND {
            self.should_quit = true;
            return;
        }

        if self.outbound.send(line.clone()).is_err() {
            warn!("Session has gone away; line not sent");
        }
        let style = self.echo.style_for(&line);
        self.append(PanelKind::Chat, StyledLine::new(format!("ME: {}", line), style));
    }

    pub fn clear_input(&mut self) {
        self.input = TextArea::default();
        self.mark_dirty();
    }

    /// Forward a key to the input editor.
    pub fn edit_input(&mut self, key: crossterm::event::KeyEvent) {
        if self.input.input(key) {
            self.mark_dirty();
        }
    }

    // ===== Chat Scrolling =====

    fn chat_max_scroll(&self) -> usize {
        self.pane(PanelKind::Chat)
            .map(|pane| pane.lines.len().saturating_sub(1))
            .unwrap_or(0)
    }

    pub fn scroll_chat_page_up(&mut self) {
        let max = self.chat_max_scroll();
        if let Some(pane) = self.panes.get_mut(&PanelKind::Chat) {
            let old = pane.scroll_back;
            pane.scroll_back = (pane.scroll_back + PAGE_LINES).min(max);
            if old != pane.scroll_back {
                self.mark_dirty();
            }
        }
    }

    pub fn scroll_chat_page_down(&mut self) {
        if let Some(pane) = self.panes.get_mut(&PanelKind::Chat) {
            let old = pane.scroll_back;
            pane.scroll_back = pane.scroll_back.saturating_sub(PAGE_LINES);
            if old != pane.scroll_back {
                self.mark_dirty();
            }
        }
    }
}
