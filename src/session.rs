//! Command dispatch over the outbound channel.
//!
//! The session thread owns the live connection. It reads committed input
//! lines, dials on `/connect`, forwards everything else to the peer as coded
//! frames, and reports failures on the log channel. A router thread turns
//! pump events into chat and log lines.

mod command;

pub use command::{Command, CommandError};

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::bridge::UiSender;
use crate::config::Config;
use crate::net::{Connection, Pump, PumpEvent, StopReason};
use crate::write_coded;

struct Live {
    conn: Connection,
    pump: Pump,
}

pub struct Session {
    config: Config,
    ui: UiSender,
    inbound: Sender<PumpEvent>,
    current: Option<Live>,
}

impl Session {
    /// Create a session and start its pump-event router.
    pub fn new(config: Config, ui: UiSender) -> io::Result<Self> {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        spawn_router(inbound_rx, ui.clone())?;
        Ok(Self {
            config,
            ui,
            inbound: inbound_tx,
            current: None,
        })
    }

    /// Run a session on its own thread until `outbound` closes.
    pub fn spawn(config: Config, ui: UiSender, outbound: Receiver<String>) -> io::Result<JoinHandle<()>> {
        let mut session = Self::new(config, ui)?;
        thread::Builder::new()
            .name("session".to_string())
            .spawn(move || session.run(outbound))
    }

    pub fn run(&mut self, outbound: Receiver<String>) {
        while let Ok(line) = outbound.recv() {
            self.handle_line(&line);
        }
        debug!("Outbound channel closed; ending session");
        self.disconnect();
    }

    /// Name of the live connection, if any.
    pub fn connected_to(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|live| !live.conn.is_closed())
            .map(|live| live.conn.name())
    }

    pub fn handle_line(&mut self, line: &str) {
        match Command::parse(line) {
            Ok(Command::Connect { host, port }) => {
                if let Err(e) = self.connect(&host, port) {
                    warn!("Connect to {}:{} failed: {:#}", host, port, e);
                    self.ui.log(format!("[ERROR connect to {}:{} failed: {:#}", host, port, e));
                }
            }
            Ok(command) => {
                if let Some(text) = command.wire_text() {
                    self.send(&text);
                }
            }
            Err(e) => {
                self.ui.log(format!("[ERROR {}", e));
            }
        }
    }

    /// Dial `host:port`, replacing any current connection.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let addr = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve {}", host))?
            .next()
            .ok_or_else(|| anyhow!("No address found for {}", host))?;

        let stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout())
            .with_context(|| format!("Failed to connect to {}", addr))?;

        self.disconnect();

        let label = format!("{}:{}", host, port);
        let mut conn = Connection::open(label.clone(), Some(stream));
        let reader = conn.take_reader().context("Connection has no reader")?;
        let pump = Pump::spawn(reader, self.inbound.clone()).context("Failed to start pump")?;
        self.watch_close(&mut conn)?;

        info!("Connected to {}", label);
        self.ui.log(format!("[INFO connected to {}", label));
        self.current = Some(Live { conn, pump });
        Ok(())
    }

    /// Close the current connection, if any, and wait for its pump.
    pub fn disconnect(&mut self) {
        let Some(mut live) = self.current.take() else {
            return;
        };
        if let Err(e) = live.conn.close() {
            warn!("Failed to close {}: {}", live.conn.name(), e);
        }
        let reason = live.pump.join();
        debug!("Pump for {} stopped: {:?}", live.conn.name(), reason);
    }

    fn watch_close(&self, conn: &mut Connection) -> io::Result<()> {
        let closed = conn.subscribe();
        let ui = self.ui.clone();
        thread::Builder::new()
            .name(format!("watch-{}", conn.name()))
            .spawn(move || {
                if let Ok(notice) = closed.recv() {
                    ui.log(format!("[INFO disconnected from {}", notice.name));
                }
            })?;
        Ok(())
    }

    /// Drops a connection the peer has already ended.
    fn has_live_connection(&mut self) -> bool {
        if self.current.as_ref().is_some_and(|live| live.conn.is_closed()) {
            self.disconnect();
        }
        self.current.is_some()
    }

    fn send(&mut self, text: &str) {
        if !self.has_live_connection() {
            self.ui.log("[ERROR not connected; use /connect <ip> <port>");
            return;
        }
        let code = self.config.message_code;
        let Some(live) = self.current.as_mut() else {
            return;
        };

        match write_coded!(live.conn, code, "{}", text) {
            Ok(bytes) => debug!("Sent {} bytes to {}", bytes, live.conn.name()),
            Err(e) => {
                warn!("Send to {} failed: {}", live.conn.name(), e);
                self.ui.log(format!("[ERROR send failed: {}", e));
            }
        }
    }
}

/// Turn pump events into chat lines and log entries.
fn spawn_router(inbound: Receiver<PumpEvent>, ui: UiSender) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("router".to_string())
        .spawn(move || {
            while let Ok(event) = inbound.recv() {
                route(event, &ui);
            }
            debug!("All pumps gone; router exiting");
        })
}

fn route(event: PumpEvent, ui: &UiSender) {
    match event {
        PumpEvent::Line { line, .. } => {
            ui.chat(line);
        }
        PumpEvent::Stopped { source, reason } => match reason {
            StopReason::EndOfStream => {
                ui.log(format!("[INFO {} closed the connection", source));
            }
            StopReason::Fault(message) => {
                ui.log(format!("[ERROR connection to {} failed: {}", source, message));
            }
            StopReason::Closed | StopReason::InboundClosed => {
                debug!("Pump for {} stopped: {:?}", source, reason);
            }
        },
    }
}
