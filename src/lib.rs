//! Asterisk Gateway Interface (AGI) session engine for Rust
//!
//! This crate implements the client side of AGI, the line-oriented protocol
//! Asterisk uses to hand control of an active call to an external script:
//! the switch sends a `name: value` handshake block describing the call,
//! then the script drives it through strictly alternating command/reply
//! cycles until it returns or the caller hangs up.
//!
//! # Architecture
//!
//! - [`AgiSession`] — one call: the parsed [`AgiRequest`] context, exclusive
//!   ownership of the byte stream, and the typed command API. Commands are
//!   strictly serialized; [`AgiSession::send_command`] is the only suspension
//!   point.
//! - [`Router`] — picks the handler for each call by requested script name,
//!   runs it on its own task, and reports [`CallLifecycle`] signals.
//!
//! The TCP listener (FastAGI) and the AMI-based async-AGI feed are the
//! caller's: anything implementing `AsyncRead + AsyncWrite` can be served,
//! a freshly accepted `tokio::net::TcpStream` included.
//!
//! # Serving FastAGI calls
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use asterisk_agi_tokio::{handler, AgiError, Router, DEFAULT_AGI_PORT};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AgiError> {
//!     let router = Arc::new(Router::single(handler(|mut session| async move {
//!         let answered = session.answer().await?;
//!         tracing::info!(answered, caller = ?session.request().caller_id());
//!
//!         session.stream_file("welcome", Some("#")).await?;
//!
//!         if let Some(digits) = session.get_data("enter-ext", Some(5000), Some(4)).await? {
//!             session.set_variable("DIALED", &digits).await?;
//!         }
//!
//!         session.continue_at("internal", None, None).await?;
//!         Ok(())
//!     })));
//!
//!     let listener = TcpListener::bind(("0.0.0.0", DEFAULT_AGI_PORT))
//!         .await
//!         .map_err(AgiError::from)?;
//!
//!     loop {
//!         let (stream, _addr) = listener.accept().await.map_err(AgiError::from)?;
//!         router.dispatch(stream);
//!     }
//! }
//! ```
//!
//! ## Routing by script name
//!
//! With `agi://host:4573/sales` in the dialplan, Asterisk requests the script
//! `sales`. A named handler set routes on that, with `default` as fallback;
//! a call matching neither is rejected before any command is sent:
//!
//! ```rust
//! use std::collections::HashMap;
//! use asterisk_agi_tokio::{handler, Router, ScriptHandler};
//!
//! let mut scripts: HashMap<String, ScriptHandler> = HashMap::new();
//! scripts.insert("sales".into(), handler(|mut s| async move {
//!     s.answer().await?;
//!     s.stream_file("queue-sales", None).await?;
//!     Ok(())
//! }));
//! scripts.insert("default".into(), handler(|mut s| async move {
//!     s.hangup().await?;
//!     Ok(())
//! }));
//!
//! let router = Router::named(scripts);
//! ```
//!
//! ## Error model
//!
//! Any command can fail with [`AgiError::Hangup`] when the caller hangs up;
//! treat command failures as fatal to the call and stop issuing commands —
//! the protocol has no retries. Issuing a command while another is awaiting
//! its reply is a programming error and fails fast with
//! [`AgiError::CommandPending`] without touching the wire.

#[macro_use]
mod macros;

pub mod channel;
pub mod command;
pub mod connection;
pub mod constants;
pub mod error;
pub mod headers;
pub mod reply;
pub mod request;
pub mod router;
pub mod session;

pub use channel::{ChannelStatus, ParseChannelStatusError};
pub use command::{AgiCommand, GetOptionStyle};
pub use connection::{AgiConnection, AgiStream};
pub use constants::DEFAULT_AGI_PORT;
pub use error::{AgiError, AgiResult};
pub use headers::{ParseRequestKeyError, RequestKey};
pub use reply::{AgiReply, ReplyLine};
pub use request::AgiRequest;
pub use router::{handler, CallLifecycle, HandlerFuture, HandlerSet, Router, ScriptHandler};
pub use session::{AgiSession, DecodeMode, SessionOptions, SessionState};
