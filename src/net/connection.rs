//! Framed line connection with open/closed lifecycle tracking.
//!
//! A `Connection` owns the stream handle and the write direction. Its read
//! direction is a `LineReader`, which can be handed to a pump thread with
//! `take_reader()`. Both halves share the closed flag, so an end-of-stream
//! seen by the reader is visible to the writer without a lock.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::transport::{SharedStream, Transport};

/// Maximum line length (64KB) accepted from a peer, excluding the terminator.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Connection error types.
#[derive(Debug, Error)]
pub enum ConnError {
    /// The connection was opened without a stream and is inert.
    #[error("No stream attached to connection")]
    InvalidHandle,

    /// The peer closed the stream cleanly.
    #[error("Connection closed by peer")]
    EndOfStream,

    /// Any other transport failure on read or write.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// The connection has already been closed.
    #[error("Connection already closed")]
    Closed,

    /// The read half now belongs to a pump.
    #[error("Reader has been handed to a pump")]
    ReaderDetached,

    /// A peer line exceeded `MAX_LINE_LENGTH`.
    #[error("Line exceeds maximum {0} bytes")]
    LineTooLong(usize),

    /// An outgoing payload contained a line terminator.
    #[error("Payload contains an embedded line terminator")]
    InvalidPayload,
}

impl From<io::Error> for ConnError {
    fn from(err: io::Error) -> Self {
        ConnError::Io(err)
    }
}

/// Sent once to every subscriber when a connection is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    pub name: String,
}

enum Handle<S> {
    /// Opened without a stream.
    Inert,
    Open(Arc<S>),
    /// `close()` has run.
    Released,
}

/// Read direction of a connection.
pub struct LineReader<S: Transport = TcpStream> {
    name: String,
    inner: BufReader<SharedStream<S>>,
    closed: Arc<AtomicBool>,
}

impl<S: Transport> LineReader<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Block until one full line is available and return it without its
    /// terminator.
    ///
    /// Exactly one trailing `\n` or `\r\n` is stripped; a `\r` elsewhere in
    /// the line is kept. Bytes that are not valid UTF-8 are replaced.
    ///
    /// # Errors
    ///
    /// - `EndOfStream` when the peer has closed the stream; the connection
    ///   is marked closed.
    /// - `Closed` if the connection was already closed, without reading, or
    ///   was closed locally while the read was blocked.
    /// - `LineTooLong` if no terminator appears within `MAX_LINE_LENGTH`.
    /// - `Io` for any other transport failure; the state is left open.
    pub fn read_line(&mut self) -> Result<String, ConnError> {
        if self.is_closed() {
            return Err(ConnError::Closed);
        }

        let mut buf = Vec::new();
        // Room for a full-length line plus its `\r\n`
        let limit = MAX_LINE_LENGTH as u64 + 2;
        let bytes_read = self.inner.by_ref().take(limit).read_until(b'\n', &mut buf)?;

        if bytes_read == 0 {
            // A local close shuts the stream down under a blocked read
            if self.closed.swap(true, Ordering::AcqRel) {
                return Err(ConnError::Closed);
            }
            debug!("Connection {} reached end of stream", self.name);
            return Err(ConnError::EndOfStream);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > MAX_LINE_LENGTH {
            return Err(ConnError::LineTooLong(MAX_LINE_LENGTH));
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// A line-framed connection to a remote peer.
///
/// # Lifecycle
///
/// - `open()` - wrap a dialed or accepted stream
/// - `take_reader()` - move the read half into a pump
/// - `write_coded()` - send one `<code> <payload>` frame
/// - `close()` - shut the stream down and notify subscribers
///
/// `close()` is not idempotent: a second call returns `ConnError::Closed`.
pub struct Connection<S: Transport = TcpStream> {
    name: String,
    handle: Handle<S>,
    reader: Option<LineReader<S>>,
    closed: Arc<AtomicBool>,
    watchers: Vec<Sender<Closed>>,
}

impl<S: Transport> Connection<S> {
    /// Wrap a live stream.
    ///
    /// With `None` the connection is left inert and every later operation
    /// fails with `ConnError::InvalidHandle`.
    pub fn open(name: impl Into<String>, stream: Option<S>) -> Self {
        let name = name.into();
        let closed = Arc::new(AtomicBool::new(false));

        let Some(stream) = stream else {
            warn!("Connection {} opened without a stream; leaving it inert", name);
            return Self {
                name,
                handle: Handle::Inert,
                reader: None,
                closed,
                watchers: Vec::new(),
            };
        };

        let stream = Arc::new(stream);
        let reader = LineReader {
            name: name.clone(),
            inner: BufReader::new(SharedStream::new(Arc::clone(&stream))),
            closed: Arc::clone(&closed),
        };

        debug!("Opened connection {}", name);
        Self {
            name,
            handle: Handle::Open(stream),
            reader: Some(reader),
            closed,
            watchers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the peer has ended the stream or `close()` has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Read one line directly, while the reader has not been taken.
    pub fn read_line(&mut self) -> Result<String, ConnError> {
        match self.handle {
            Handle::Inert => Err(ConnError::InvalidHandle),
            Handle::Released => Err(ConnError::Closed),
            Handle::Open(_) => self
                .reader
                .as_mut()
                .ok_or(ConnError::ReaderDetached)?
                .read_line(),
        }
    }

    /// Hand the read half to another thread.
    pub fn take_reader(&mut self) -> Result<LineReader<S>, ConnError> {
        match self.handle {
            Handle::Inert => Err(ConnError::InvalidHandle),
            Handle::Released => Err(ConnError::Closed),
            Handle::Open(_) => self.reader.take().ok_or(ConnError::ReaderDetached),
        }
    }

    /// Format `"<code> <payload>"`, terminate it with `\n` if needed and
    /// write the whole frame at once.
    ///
    /// Returns the number of bytes written. Failed writes are not retried.
    /// Prefer the `write_coded!` macro for interpolation.
    pub fn write_coded(&mut self, code: u32, payload: fmt::Arguments<'_>) -> Result<usize, ConnError> {
        let stream = match &self.handle {
            Handle::Inert => return Err(ConnError::InvalidHandle),
            Handle::Released => return Err(ConnError::Closed),
            Handle::Open(stream) => stream,
        };
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnError::Closed);
        }

        let mut frame = format!("{} {}", code, payload);
        if !frame.ends_with('\n') {
            frame.push('\n');
        }
        if frame[..frame.len() - 1].contains(['\r', '\n']) {
            return Err(ConnError::InvalidPayload);
        }

        stream.write_all_shared(frame.as_bytes())?;
        Ok(frame.len())
    }

    /// Register for the close notification.
    ///
    /// The receiver gets one `Closed` and then disconnects. Subscribing to a
    /// connection that is already closed yields a disconnected receiver.
    pub fn subscribe(&mut self) -> Receiver<Closed> {
        let (tx, rx) = mpsc::channel();
        if !matches!(self.handle, Handle::Released) {
            self.watchers.push(tx);
        }
        rx
    }

    /// Shut the stream down, drop the handle and notify subscribers.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` for an inert connection.
    /// - `Closed` if the connection was already closed. Closing twice is a
    ///   caller error and is reported rather than ignored.
    pub fn close(&mut self) -> Result<(), ConnError> {
        match std::mem::replace(&mut self.handle, Handle::Released) {
            Handle::Inert => {
                self.handle = Handle::Inert;
                Err(ConnError::InvalidHandle)
            }
            Handle::Released => {
                warn!("Connection {} closed twice", self.name);
                Err(ConnError::Closed)
            }
            Handle::Open(stream) => {
                self.release(&stream);
                info!("Closed connection {}", self.name);
                Ok(())
            }
        }
    }

    fn release(&mut self, stream: &S) {
        self.closed.store(true, Ordering::Release);
        self.reader = None;

        for watcher in self.watchers.drain(..) {
            let _ = watcher.send(Closed {
                name: self.name.clone(),
            });
        }

        if let Err(e) = stream.shutdown() {
            // Already torn down by the peer
            if e.kind() != io::ErrorKind::NotConnected {
                warn!("Failed to shut down connection {}: {}", self.name, e);
            }
        }
    }
}

impl<S: Transport> Drop for Connection<S> {
    fn drop(&mut self) {
        if let Handle::Open(stream) = std::mem::replace(&mut self.handle, Handle::Released) {
            debug!("Connection {} dropped while open; releasing", self.name);
            self.release(&stream);
        }
    }
}

/// Write one coded frame with `format!`-style interpolation.
///
/// ```ignore
/// linechat::write_coded!(conn, 250, "{} users online", count)?;
/// ```
#[macro_export]
macro_rules! write_coded {
    ($conn:expr, $code:expr, $($arg:tt)*) => {
        $conn.write_coded($code, format_args!($($arg)*))
    };
}
