//! linechat library
//!
//! This library provides the core components of the linechat terminal client:
//!
//! - `net` - framed line connection, transports and the I/O pump
//! - `bridge` - channels between network/application logic and the renderer
//! - `style` - marker-based line styling for the log and chat panes
//! - `views` - static panel descriptors and their geometry
//! - `session` - command dispatch over the outbound channel
//! - `config` - file and environment configuration
//!
//! # Wiring
//!
//! ```ignore
//! use linechat::bridge::UiBridge;
//! use linechat::session::Session;
//!
//! let (bridge, port) = UiBridge::spawn()?;
//! let session = Session::spawn(config, bridge.ui.clone(), bridge.outbound)?;
//! // the renderer drains `port.events` and sends committed input on `port.outbound`
//! ```

pub mod bridge;
pub mod config;
pub mod net;
pub mod session;
pub mod style;
pub mod views;
