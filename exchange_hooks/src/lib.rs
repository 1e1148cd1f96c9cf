#![forbid(unsafe_code)]
//! Extension points for plugging session cookies and websocket event
//! callbacks into an HTTP server, independent of the server framework.
//!
//! Two adapters live here:
//!
//! * [`session::SessionCookieConfig`] attaches the session id cookie, with an
//!   optional `SameSite` attribute.
//! * [`listener::WebSocketChannelListener`] turns channel events into calls to
//!   user callbacks configured through [`listener::ListenerConfig`].

pub mod channel;
pub mod context;
pub mod cookie;
pub mod error;
pub mod listener;
pub mod pool;
pub mod session;

pub use channel::{BufferedBinaryMessage, BufferedTextMessage, CloseMessage, WebSocketChannel};
pub use context::{HttpExchange, RequestContext};
pub use cookie::{Cookie, SameSiteMode};
pub use error::{CallbackError, CallbackResult, ChannelError, ConfigError};
pub use listener::{
    CallbackKind, ChannelEvent, ConnectionCallback, EventCallback, ListenerConfig,
    ReceiveListener, WebSocketChannelListener,
};
pub use pool::{ByteBufferPool, Pooled, PooledBuffer};
pub use session::{SessionConfig, SessionCookieConfig, SessionCookieSource};
