//! Byte-stream transports usable from two threads at once.
//!
//! `TcpStream` and `UnixStream` can both be read and written through a shared
//! reference, so one `Arc` is enough for the reading pump and the writing
//! application thread. `shutdown` wakes a reader blocked on another thread.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// A byte stream that can be read, written and shut down through `&self`.
pub trait Transport: Send + Sync + 'static {
    /// Read available bytes into `buf`; `Ok(0)` means end of stream.
    fn read_shared(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer and flush it.
    fn write_all_shared(&self, buf: &[u8]) -> io::Result<()>;

    /// Shut down both directions, unblocking any pending read.
    fn shutdown(&self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn read_shared(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream = self;
        stream.read(buf)
    }

    fn write_all_shared(&self, buf: &[u8]) -> io::Result<()> {
        let mut stream = self;
        stream.write_all(buf)?;
        stream.flush()
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

#[cfg(unix)]
impl Transport for UnixStream {
    fn read_shared(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream = self;
        stream.read(buf)
    }

    fn write_all_shared(&self, buf: &[u8]) -> io::Result<()> {
        let mut stream = self;
        stream.write_all(buf)?;
        stream.flush()
    }

    fn shutdown(&self) -> io::Result<()> {
        UnixStream::shutdown(self, Shutdown::Both)
    }
}

/// `Read` adapter over a shared transport, for use inside a `BufReader`.
pub struct SharedStream<S: Transport>(Arc<S>);

impl<S: Transport> SharedStream<S> {
    pub fn new(stream: Arc<S>) -> Self {
        Self(stream)
    }
}

impl<S: Transport> Read for SharedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read_shared(buf)
    }
}
