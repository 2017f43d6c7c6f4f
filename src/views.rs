//! Static panel layout.
//!
//! The screen is a fixed set of panels. Each descriptor places its panel with
//! four functions of the terminal size giving inclusive corner coordinates:
//!
//! ```text
//! ┌ Conversation ────────────┐┌ Users ──┐
//! │                          ││         │
//! │                          │└─────────┘
//! │                          │┌ Help ───┐
//! └──────────────────────────┘└─────────┘
//! ┌ What's On Your Mind? ────────────────┐
//! └──────────────────────────────────────┘
//! ┌ Log ─────────────────────────────────┐
//! └──────────────────────────────────────┘
//! ```

use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Input,
    Log,
    Chat,
    Users,
    Help,
}

/// Inclusive corner coordinates as functions of terminal width (x) and
/// height (y).
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub x0: fn(u16) -> u16,
    pub y0: fn(u16) -> u16,
    pub x1: fn(u16) -> u16,
    pub y1: fn(u16) -> u16,
}

impl Geometry {
    /// Resolve the panel rectangle for `area`, clamped to stay inside it.
    pub fn rect(&self, area: Rect) -> Rect {
        let (width, height) = (area.width, area.height);
        if width == 0 || height == 0 {
            return Rect::new(area.x, area.y, 0, 0);
        }

        let x0 = (self.x0)(width).min(width - 1);
        let y0 = (self.y0)(height).min(height - 1);
        let x1 = (self.x1)(width).clamp(x0, width - 1);
        let y1 = (self.y1)(height).clamp(y0, height - 1);

        Rect::new(area.x + x0, area.y + y0, x1 - x0 + 1, y1 - y0 + 1)
    }
}

/// Layout metadata for one panel. Immutable.
#[derive(Debug, Clone, Copy)]
pub struct ViewDescriptor {
    pub kind: PanelKind,
    pub title: &'static str,
    pub editable: bool,
    pub autoscroll: bool,
    pub wrap: bool,
    pub geometry: Geometry,
    /// Lines the panel starts with.
    pub seed: &'static [&'static str],
}

fn zero(_: u16) -> u16 {
    0
}

fn last(n: u16) -> u16 {
    n.saturating_sub(1)
}

fn three_quarters(n: u16) -> u16 {
    (u32::from(n) * 3 / 4) as u16
}

fn input_top(height: u16) -> u16 {
    three_quarters(height).saturating_sub(3)
}

fn input_bottom(height: u16) -> u16 {
    three_quarters(height).saturating_sub(1)
}

fn upper_bottom(height: u16) -> u16 {
    three_quarters(height).saturating_sub(4)
}

fn split_left(width: u16) -> u16 {
    width / 3 * 2
}

fn split_right(width: u16) -> u16 {
    (width / 3 * 2).saturating_add(1)
}

fn half(height: u16) -> u16 {
    height / 2
}

fn below_half(height: u16) -> u16 {
    (height / 2).saturating_add(1)
}

/// All panels, in creation order. The input panel is the focused one.
pub static VIEWS: [ViewDescriptor; 5] = [
    ViewDescriptor {
        kind: PanelKind::Input,
        title: "What's On Your Mind?",
        editable: true,
        autoscroll: true,
        wrap: true,
        geometry: Geometry {
            x0: zero,
            y0: input_top,
            x1: last,
            y1: input_bottom,
        },
        seed: &[],
    },
    ViewDescriptor {
        kind: PanelKind::Log,
        title: "Log",
        editable: false,
        autoscroll: true,
        wrap: true,
        geometry: Geometry {
            x0: zero,
            y0: three_quarters,
            x1: last,
            y1: last,
        },
        seed: &[],
    },
    ViewDescriptor {
        kind: PanelKind::Chat,
        title: "Conversation",
        editable: false,
        autoscroll: true,
        wrap: true,
        geometry: Geometry {
            x0: zero,
            y0: zero,
            x1: split_left,
            y1: upper_bottom,
        },
        seed: &[],
    },
    ViewDescriptor {
        kind: PanelKind::Users,
        title: "Users",
        editable: false,
        autoscroll: true,
        wrap: true,
        geometry: Geometry {
            x0: split_right,
            y0: zero,
            x1: last,
            y1: half,
        },
        seed: &[],
    },
    ViewDescriptor {
        kind: PanelKind::Help,
        title: "Help",
        editable: false,
        autoscroll: true,
        wrap: true,
        geometry: Geometry {
            x0: split_right,
            y0: below_half,
            x1: last,
            y1: upper_bottom,
        },
        seed: &[
            "/connect  <ip> <port>",
            "/pm       <name> <message...>",
            "/shell    <name> <command...>",
            "/exit",
        ],
    },
];
