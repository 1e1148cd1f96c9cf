use crate::channel::{BufferedBinaryMessage, BufferedTextMessage, CloseMessage, WebSocketChannel};
use crate::context::RequestContext;
use crate::error::{CallbackResult, ChannelError, ConfigError};
use bytes::Bytes;
use log::{debug, trace};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Called once per accepted websocket, right after the upgrade.
pub trait ConnectionCallback<C: WebSocketChannel>: 'static + Send + Sync {
    fn on_connect(&self, exchange: Arc<RequestContext>, channel: C) -> CallbackResult;
}

/// Receives full (reassembled) messages from a channel.
///
/// Every method has a default. An implementation that overrides one and wants
/// the stock behavior back in some cases can call the matching `default_*`
/// function.
pub trait ReceiveListener<C: WebSocketChannel>: 'static + Send + Sync {
    fn on_full_text_message(&self, channel: &C, message: BufferedTextMessage) -> CallbackResult {
        default_on_full_text_message(channel, message)
    }

    fn on_full_binary_message(
        &self,
        channel: &C,
        message: BufferedBinaryMessage,
    ) -> CallbackResult {
        default_on_full_binary_message(channel, message)
    }

    fn on_close_message(&self, message: CloseMessage, channel: &C) -> CallbackResult {
        default_on_close_message(message, channel)
    }

    fn on_error(&self, channel: &C, error: ChannelError) -> CallbackResult {
        default_on_error(channel, error)
    }
}

pub fn default_on_full_text_message<C: WebSocketChannel>(
    _channel: &C,
    _message: BufferedTextMessage,
) -> CallbackResult {
    Ok(())
}

pub fn default_on_full_binary_message<C: WebSocketChannel>(
    _channel: &C,
    message: BufferedBinaryMessage,
) -> CallbackResult {
    message.into_data().free();
    Ok(())
}

/// Answers the peer's close frame. Codes that must not appear on the wire are
/// answered with `PROTOCOL_ERROR`.
pub fn default_on_close_message<C: WebSocketChannel>(
    message: CloseMessage,
    channel: &C,
) -> CallbackResult {
    let reply = if CloseMessage::is_valid(message.code()) {
        message
    } else {
        CloseMessage::new(CloseMessage::PROTOCOL_ERROR, "")
    };
    if let Err(err) = channel.send_close(&reply) {
        debug!("Could not answer close on channel {}: {}", channel.id(), err);
    }
    Ok(())
}

pub fn default_on_error<C: WebSocketChannel>(channel: &C, error: ChannelError) -> CallbackResult {
    debug!("Closing channel {} after error: {}", channel.id(), error);
    channel.close();
    Ok(())
}

/// The callback slots a listener can be configured with.
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
pub enum CallbackKind {
    #[strum(serialize = "on-connect")]
    OnConnect,
    #[strum(serialize = "on-message")]
    OnMessage,
    #[strum(serialize = "on-close")]
    OnClose,
    #[strum(serialize = "on-error")]
    OnError,
}

/// The record handed to a user callback. The variant decides which fields exist.
#[derive(Debug)]
pub enum ChannelEvent<C> {
    Connect {
        exchange: Arc<RequestContext>,
        channel: C,
    },
    Text {
        channel: C,
        text: String,
    },
    Binary {
        channel: C,
        data: Bytes,
    },
    Close {
        channel: C,
        code: u16,
        reason: String,
    },
    Error {
        channel: C,
        error: ChannelError,
    },
}

impl<C> ChannelEvent<C> {
    pub fn callback(&self) -> CallbackKind {
        match self {
            ChannelEvent::Connect { .. } => CallbackKind::OnConnect,
            ChannelEvent::Text { .. } | ChannelEvent::Binary { .. } => CallbackKind::OnMessage,
            ChannelEvent::Close { .. } => CallbackKind::OnClose,
            ChannelEvent::Error { .. } => CallbackKind::OnError,
        }
    }

    pub fn channel(&self) -> &C {
        match self {
            ChannelEvent::Connect { channel, .. }
            | ChannelEvent::Text { channel, .. }
            | ChannelEvent::Binary { channel, .. }
            | ChannelEvent::Close { channel, .. }
            | ChannelEvent::Error { channel, .. } => channel,
        }
    }
}

pub type EventCallback<C> = Arc<dyn Fn(ChannelEvent<C>) -> CallbackResult + Send + Sync>;

pub struct ListenerConfig<C> {
    pub on_connect: Option<EventCallback<C>>,
    pub on_message: Option<EventCallback<C>>,
    pub on_close: Option<EventCallback<C>>,
    pub on_error: Option<EventCallback<C>>,
}

impl<C> Default for ListenerConfig<C> {
    fn default() -> Self {
        ListenerConfig {
            on_connect: None,
            on_message: None,
            on_close: None,
            on_error: None,
        }
    }
}

impl<C: WebSocketChannel> ListenerConfig<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from callbacks keyed by slot name (`on-connect`,
    /// `on-message`, `on-close`, `on-error`). Unknown keys are rejected.
    pub fn from_map<I, K>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, EventCallback<C>)>,
        K: AsRef<str>,
    {
        entries
            .into_iter()
            .try_fold(Self::default(), |config, (key, callback)| {
                let key = key.as_ref();
                let kind = CallbackKind::from_str(key)
                    .map_err(|_| ConfigError::UnknownCallbackKey(key.to_owned()))?;
                Ok(config.with_callback(kind, callback))
            })
    }

    pub fn with_callback(mut self, kind: CallbackKind, callback: EventCallback<C>) -> Self {
        let slot = match kind {
            CallbackKind::OnConnect => &mut self.on_connect,
            CallbackKind::OnMessage => &mut self.on_message,
            CallbackKind::OnClose => &mut self.on_close,
            CallbackKind::OnError => &mut self.on_error,
        };
        *slot = Some(callback);
        self
    }

    pub fn on_connect<F>(self, callback: F) -> Self
    where
        F: Fn(ChannelEvent<C>) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callback(CallbackKind::OnConnect, Arc::new(callback))
    }

    pub fn on_message<F>(self, callback: F) -> Self
    where
        F: Fn(ChannelEvent<C>) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callback(CallbackKind::OnMessage, Arc::new(callback))
    }

    pub fn on_close<F>(self, callback: F) -> Self
    where
        F: Fn(ChannelEvent<C>) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callback(CallbackKind::OnClose, Arc::new(callback))
    }

    pub fn on_error<F>(self, callback: F) -> Self
    where
        F: Fn(ChannelEvent<C>) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callback(CallbackKind::OnError, Arc::new(callback))
    }
}

/// Connection callback and receive listener that forwards every event to the
/// callbacks it was configured with, falling back to the default behavior for
/// empty slots.
pub struct WebSocketChannelListener<C> {
    on_connect: Option<EventCallback<C>>,
    on_message: Option<EventCallback<C>>,
    on_close: Option<EventCallback<C>>,
    on_error: Option<EventCallback<C>>,
}

impl<C: WebSocketChannel> WebSocketChannelListener<C> {
    pub fn new(config: ListenerConfig<C>) -> Self {
        WebSocketChannelListener {
            on_connect: config.on_connect,
            on_message: config.on_message,
            on_close: config.on_close,
            on_error: config.on_error,
        }
    }

    pub fn registered(&self) -> Vec<CallbackKind> {
        [
            (CallbackKind::OnConnect, self.on_connect.is_some()),
            (CallbackKind::OnMessage, self.on_message.is_some()),
            (CallbackKind::OnClose, self.on_close.is_some()),
            (CallbackKind::OnError, self.on_error.is_some()),
        ]
        .iter()
        .filter(|(_, present)| *present)
        .map(|(kind, _)| *kind)
        .collect()
    }
}

impl<C: WebSocketChannel> From<ListenerConfig<C>> for WebSocketChannelListener<C> {
    fn from(config: ListenerConfig<C>) -> Self {
        Self::new(config)
    }
}

impl<C> fmt::Debug for WebSocketChannelListener<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketChannelListener")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<C: WebSocketChannel> ConnectionCallback<C> for WebSocketChannelListener<C> {
    fn on_connect(&self, exchange: Arc<RequestContext>, channel: C) -> CallbackResult {
        match &self.on_connect {
            Some(callback) => {
                trace!("Dispatching on-connect for channel {}", channel.id());
                callback(ChannelEvent::Connect { exchange, channel })
            }
            None => Ok(()),
        }
    }
}

impl<C: WebSocketChannel> ReceiveListener<C> for WebSocketChannelListener<C> {
    fn on_full_text_message(&self, channel: &C, message: BufferedTextMessage) -> CallbackResult {
        match &self.on_message {
            Some(callback) => callback(ChannelEvent::Text {
                channel: channel.clone(),
                text: message.into_data(),
            }),
            None => default_on_full_text_message(channel, message),
        }
    }

    fn on_full_binary_message(
        &self,
        channel: &C,
        message: BufferedBinaryMessage,
    ) -> CallbackResult {
        match &self.on_message {
            Some(callback) => {
                // The pooled buffers are recycled as soon as they are freed, so
                // the callback only ever sees the copy.
                let data = message.into_bytes();
                callback(ChannelEvent::Binary {
                    channel: channel.clone(),
                    data,
                })
            }
            None => default_on_full_binary_message(channel, message),
        }
    }

    /// Close events are routed to the close slot only while an error callback
    /// is registered. Without one the default close handling runs.
    fn on_close_message(&self, message: CloseMessage, channel: &C) -> CallbackResult {
        match self.on_error.as_ref().and(self.on_close.as_ref()) {
            Some(callback) => {
                trace!("Dispatching on-close {} for channel {}", message, channel.id());
                callback(ChannelEvent::Close {
                    channel: channel.clone(),
                    code: message.code(),
                    reason: message.reason().to_owned(),
                })
            }
            None => default_on_close_message(message, channel),
        }
    }

    fn on_error(&self, channel: &C, error: ChannelError) -> CallbackResult {
        match &self.on_error {
            Some(callback) => callback(ChannelEvent::Error {
                channel: channel.clone(),
                error,
            }),
            None => default_on_error(channel, error),
        }
    }
}
