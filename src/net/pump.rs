//! I/O pump: a dedicated thread that blocks on line reads and forwards each
//! line into the shared inbound channel.
//!
//! The pump makes a single attempt. The first read failure stops it for
//! good; reconnecting means opening a new connection and spawning a new pump.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::connection::{ConnError, LineReader};
use super::transport::Transport;

/// Why a pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The peer closed the stream.
    EndOfStream,
    /// The connection was closed locally.
    Closed,
    /// Nobody is listening on the inbound channel any more.
    InboundClosed,
    /// Any other read failure.
    Fault(String),
}

/// Events sent from pumps into the inbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpEvent {
    /// One line read from `source`, terminator stripped.
    Line { source: String, line: String },
    /// Sent exactly once, after the last line.
    Stopped { source: String, reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Running,
    Stopped,
}

/// Handle to a running pump thread.
pub struct Pump {
    name: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<StopReason>>,
}

impl Pump {
    /// Spawn a pump thread named `pump-<connection name>` that owns `reader`.
    pub fn spawn<S: Transport>(reader: LineReader<S>, inbound: Sender<PumpEvent>) -> io::Result<Self> {
        let name = reader.name().to_string();
        let running = Arc::new(AtomicBool::new(true));
        let running_flag = Arc::clone(&running);
        let source = name.clone();

        let handle = thread::Builder::new()
            .name(format!("pump-{}", name))
            .spawn(move || {
                let reason = Self::run(reader, &inbound);
                running_flag.store(false, Ordering::Release);
                let _ = inbound.send(PumpEvent::Stopped {
                    source,
                    reason: reason.clone(),
                });
                reason
            })?;

        debug!("Started pump for {}", name);
        Ok(Self {
            name,
            running,
            handle: Some(handle),
        })
    }

    fn run<S: Transport>(mut reader: LineReader<S>, inbound: &Sender<PumpEvent>) -> StopReason {
        loop {
            match reader.read_line() {
                Ok(line) => {
                    let event = PumpEvent::Line {
                        source: reader.name().to_string(),
                        line,
                    };
                    if inbound.send(event).is_err() {
                        debug!("Inbound channel closed; stopping pump for {}", reader.name());
                        return StopReason::InboundClosed;
                    }
                }
                Err(ConnError::EndOfStream) => {
                    info!("Peer {} closed the connection", reader.name());
                    return StopReason::EndOfStream;
                }
                Err(ConnError::Closed) => {
                    debug!("Connection {} closed locally; stopping pump", reader.name());
                    return StopReason::Closed;
                }
                Err(e) => {
                    warn!("Read from {} failed: {}", reader.name(), e);
                    return StopReason::Fault(e.to_string());
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PumpState {
        if self.running.load(Ordering::Acquire) {
            PumpState::Running
        } else {
            PumpState::Stopped
        }
    }

    /// Wait for the pump thread to finish and return why it stopped.
    pub fn join(mut self) -> StopReason {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(reason)) => reason,
            Some(Err(_)) => StopReason::Fault("pump thread panicked".to_string()),
            None => StopReason::Closed,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::net::Connection;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::mpsc;
    use std::time::Duration;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    fn line(text: &str) -> PumpEvent {
        PumpEvent::Line {
            source: "peer".to_string(),
            line: text.to_string(),
        }
    }

    #[test]
    fn test_pump_forwards_lines_in_order_then_stops() {
        let (local, mut peer) = UnixStream::pair().expect("Failed to create socket pair");
        let mut conn = Connection::open("peer", Some(local));
        let (tx, rx) = mpsc::channel();
        let pump = Pump::spawn(conn.take_reader().expect("reader"), tx).expect("spawn");

        peer.write_all(b"220 ready\r\n(PM) hi\n").expect("Write failed");
        drop(peer);

        let events: Vec<PumpEvent> = (0..3)
            .map(|_| rx.recv_timeout(TEST_TIMEOUT).expect("Missing pump event"))
            .collect();
        assert_eq!(
            events,
            vec![
                line("220 ready"),
                line("(PM) hi"),
                PumpEvent::Stopped {
                    source: "peer".to_string(),
                    reason: StopReason::EndOfStream,
                },
            ]
        );

        assert_eq!(pump.state(), PumpState::Stopped);
        assert_eq!(pump.join(), StopReason::EndOfStream);
        assert!(conn.is_closed());
        // Nothing after the stop event
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_pump_stops_when_connection_closed() {
        let (local, _peer) = UnixStream::pair().expect("Failed to create socket pair");
        let mut conn = Connection::open("peer", Some(local));
        let (tx, rx) = mpsc::channel();
        let pump = Pump::spawn(conn.take_reader().expect("reader"), tx).expect("spawn");
        assert_eq!(pump.name(), "peer");

        conn.close().expect("Close failed");

        match rx.recv_timeout(TEST_TIMEOUT).expect("Missing stop event") {
            PumpEvent::Stopped { reason, .. } => assert!(
                matches!(
                    reason,
                    StopReason::EndOfStream | StopReason::Closed | StopReason::Fault(_)
                ),
                "Unexpected reason: {:?}",
                reason
            ),
            other => panic!("Expected Stopped, got {:?}", other),
        }
        let _ = pump.join();
    }

    #[test]
    fn test_pump_stops_when_inbound_dropped() {
        let (local, mut peer) = UnixStream::pair().expect("Failed to create socket pair");
        let mut conn = Connection::open("peer", Some(local));
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let pump = Pump::spawn(conn.take_reader().expect("reader"), tx).expect("spawn");

        peer.write_all(b"nobody listens\n").expect("Write failed");

        assert_eq!(pump.join(), StopReason::InboundClosed);
    }
}
