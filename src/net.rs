//! Line-framed connections to a remote chat peer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   Arc<S>   ┌────────────┐  PumpEvent  ┌──────────┐
//! │  Connection  │ ◄────────► │ LineReader │ ──────────► │  router  │
//! │ (write half) │            │ (pump thr) │             │          │
//! └──────────────┘            └────────────┘             └──────────┘
//! ```
//!
//! The write half stays with the application thread; the read half is moved
//! into a dedicated pump thread. Both refer to the same stream, and neither
//! direction takes a lock.
//!
//! # Protocol
//!
//! Each frame is one line, optionally prefixed with a numeric code:
//!
//! ```text
//! 220 ready\n
//! (PM) bob: hi\n
//! ```
//!
//! A `\r` before the `\n` is tolerated on read and never written.
//!
//! # Usage
//!
//! ```ignore
//! use linechat::net::{Connection, Pump};
//!
//! let mut conn = Connection::open("peer", Some(TcpStream::connect(addr)?));
//! let pump = Pump::spawn(conn.take_reader()?, inbound_tx)?;
//! linechat::write_coded!(conn, 220, "ready")?;
//! ```

mod connection;
mod frame;
mod pump;
mod transport;

pub use connection::{Closed, ConnError, Connection, LineReader, MAX_LINE_LENGTH};
pub use frame::Frame;
pub use pump::{Pump, PumpEvent, PumpState, StopReason};
pub use transport::{SharedStream, Transport};
