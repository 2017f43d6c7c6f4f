//! UI bridge: channels between network/application logic and the renderer.
//!
//! Three unidirectional channels cross the renderer boundary:
//!
//! ```text
//!  session / router ──log──►  forwarder ──┐
//!                                         ├──UiEvent──► renderer loop
//!  session / router ──chat─►  forwarder ──┘                 │
//!                                                           │ Enter
//!  session ◄──────────────────outbound──────────────────────┘
//! ```
//!
//! Each inbound channel has a forwarding thread that formats the line with
//! its style table and hands the result to the renderer's event queue. The
//! forwarders never touch screen state; only the renderer thread does.
//!
//! Channels are unbounded, so producers never block and no line is dropped
//! while the renderer is alive. When either end of a forwarder goes away the
//! forwarder exits quietly.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::style::{StyleTable, StyledLine};
use crate::views::PanelKind;

/// Events marshaled onto the renderer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Append a formatted line to a panel.
    Append { panel: PanelKind, line: StyledLine },
}

/// Producer ends of the log and chat channels.
///
/// Cheap to clone; any number of threads may produce into the same pane.
#[derive(Debug, Clone)]
pub struct UiSender {
    log: Sender<String>,
    chat: Sender<String>,
}

impl UiSender {
    pub fn new(log: Sender<String>, chat: Sender<String>) -> Self {
        Self { log, chat }
    }

    /// Queue a log line. Returns false once the UI has shut down.
    pub fn log(&self, message: impl Into<String>) -> bool {
        self.log.send(message.into()).is_ok()
    }

    /// Queue a chat line. Returns false once the UI has shut down.
    pub fn chat(&self, message: impl Into<String>) -> bool {
        self.chat.send(message.into()).is_ok()
    }
}

/// Application side of the bridge.
pub struct UiBridge {
    pub ui: UiSender,
    /// Lines committed in the input pane, in commit order.
    pub outbound: Receiver<String>,
    pub forwarders: Vec<JoinHandle<()>>,
}

/// Renderer side of the bridge.
pub struct RendererPort {
    pub events: Receiver<UiEvent>,
    pub outbound: Sender<String>,
}

impl UiBridge {
    /// Create the three channels and start the log and chat forwarders.
    pub fn spawn() -> io::Result<(Self, RendererPort)> {
        let (log_tx, log_rx) = mpsc::channel::<String>();
        let (chat_tx, chat_rx) = mpsc::channel::<String>();
        let (outbound_tx, outbound_rx) = mpsc::channel::<String>();
        let (event_tx, event_rx) = mpsc::channel::<UiEvent>();

        let forwarders = vec![
            spawn_forwarder(log_rx, PanelKind::Log, StyleTable::log(), event_tx.clone())?,
            spawn_forwarder(chat_rx, PanelKind::Chat, StyleTable::chat(), event_tx)?,
        ];

        let bridge = Self {
            ui: UiSender::new(log_tx, chat_tx),
            outbound: outbound_rx,
            forwarders,
        };
        let port = RendererPort {
            events: event_rx,
            outbound: outbound_tx,
        };
        Ok((bridge, port))
    }
}

/// Start a thread that formats every line from `source` with `table` and
/// forwards it to `events` as an append to `panel`.
///
/// The thread ends when `source` is closed or `events` has no receiver.
pub fn spawn_forwarder(
    source: Receiver<String>,
    panel: PanelKind,
    table: StyleTable,
    events: Sender<UiEvent>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("forward-{:?}", panel).to_lowercase())
        .spawn(move || {
            while let Ok(raw) = source.recv() {
                let line = table.format(&raw);
                if events.send(UiEvent::Append { panel, line }).is_err() {
                    debug!("Renderer gone; {:?} forwarder exiting", panel);
                    return;
                }
            }
            debug!("{:?} channel closed; forwarder exiting", panel);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::style::{Color, Style};
    use std::time::Duration;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_log_lines_arrive_in_push_order_with_colors() {
        let (bridge, port) = UiBridge::spawn().expect("spawn");

        assert!(bridge.ui.log("[INFO hello"));
        assert!(bridge.ui.log("[ERROR world"));

        let first = port.events.recv_timeout(TEST_TIMEOUT).expect("first event");
        let second = port.events.recv_timeout(TEST_TIMEOUT).expect("second event");
        assert_eq!(
            first,
            UiEvent::Append {
                panel: PanelKind::Log,
                line: StyledLine::new("[INFO hello", Style::default().fg(Color::LightMagenta)),
            }
        );
        assert_eq!(
            second,
            UiEvent::Append {
                panel: PanelKind::Log,
                line: StyledLine::new("[ERROR world", Style::default().fg(Color::LightRed)),
            }
        );
    }

    #[test]
    fn test_chat_lines_use_chat_table() {
        let (bridge, port) = UiBridge::spawn().expect("spawn");

        bridge.ui.chat("(PM) hi\r\n");

        let event = port.events.recv_timeout(TEST_TIMEOUT).expect("event");
        assert_eq!(
            event,
            UiEvent::Append {
                panel: PanelKind::Chat,
                line: StyledLine::new("(PM) hi", Style::default().fg(Color::Yellow)),
            }
        );
    }

    #[test]
    fn test_coded_private_message_is_gold() {
        let (bridge, port) = UiBridge::spawn().expect("spawn");

        bridge.ui.chat("100 (PM) hi\n");

        let event = port.events.recv_timeout(TEST_TIMEOUT).expect("event");
        assert_eq!(
            event,
            UiEvent::Append {
                panel: PanelKind::Chat,
                line: StyledLine::new("100 (PM) hi", Style::default().fg(Color::Yellow)),
            }
        );
    }

    #[test]
    fn test_many_lines_keep_order_per_channel() {
        let (bridge, port) = UiBridge::spawn().expect("spawn");

        for i in 0..200 {
            bridge.ui.chat(format!("line {}", i));
        }

        for i in 0..200 {
            match port.events.recv_timeout(TEST_TIMEOUT).expect("event") {
                UiEvent::Append { panel, line } => {
                    assert_eq!(panel, PanelKind::Chat);
                    assert_eq!(line.text, format!("line {}", i));
                }
            }
        }
    }

    #[test]
    fn test_forwarders_exit_when_producers_dropped() {
        let (bridge, port) = UiBridge::spawn().expect("spawn");
        let UiBridge { ui, forwarders, .. } = bridge;

        drop(ui);
        for handle in forwarders {
            handle.join().expect("Forwarder panicked");
        }
        assert!(port.events.recv().is_err());
    }

    #[test]
    fn test_forwarders_exit_when_renderer_dropped() {
        let (bridge, port) = UiBridge::spawn().expect("spawn");
        drop(port);

        // The next line finds no renderer; the forwarder returns instead of panicking
        bridge.ui.log("[INFO late");
        bridge.ui.chat("late");
        for handle in bridge.forwarders {
            handle.join().expect("Forwarder panicked");
        }
        assert!(!bridge.ui.log("[INFO after shutdown"));
    }

    #[test]
    fn test_outbound_carries_committed_lines() {
        let (bridge, port) = UiBridge::spawn().expect("spawn");

        port.outbound.send("/connect 127.0.0.1 9000".to_string()).expect("send");
        assert_eq!(
            bridge.outbound.recv_timeout(TEST_TIMEOUT).expect("outbound"),
            "/connect 127.0.0.1 9000"
        );
    }
}
